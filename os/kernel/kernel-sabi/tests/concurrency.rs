use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use kernel_sabi::{Request, Sabi};
use kernel_sabi_sim::{EventKind, Reply, SimulatedBios, transactions};

#[test]
fn concurrent_transactions_never_interleave() {
    let threads = 4;
    let per_thread = 5;

    // Echo the payload back so each caller can recognise its own answer.
    let bios = SimulatedBios::new()
        .with_responder(|_, payload| Reply::ok(payload))
        .settling_for(Duration::from_millis(2));
    let sabi = Arc::new(unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }.unwrap());
    bios.clear_events();
    let committed = Arc::new(Mutex::new(Vec::new()));

    let start = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let sabi = Arc::clone(&sabi);
            let start = Arc::clone(&start);
            let committed = Arc::clone(&committed);
            thread::spawn(move || {
                start.wait();
                for i in 0..per_thread {
                    let tag = u8::try_from(t * 16 + i).unwrap();
                    // Another caller staging between our trigger and our
                    // result read would show up as a foreign echo.
                    let echo = sabi
                        .execute_with(Request::set(0x11, tag), |result| {
                            committed.lock().unwrap().push(result[0]);
                            result[0]
                        })
                        .unwrap();
                    assert_eq!(echo, tag);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let header = bios.header();
    let events = bios.events();
    let runs = transactions(&events, &header).expect("a transaction mixed threads");
    assert_eq!(runs.len(), threads * per_thread);

    for run in &runs {
        let kinds: Vec<EventKind> = run.iter().map(|e| e.kind).collect();
        let restore = EventKind::PortWrite {
            port: header.port,
            value: header.restore_code,
        };
        let trigger = EventKind::PortWrite {
            port: header.port,
            value: header.trigger_code,
        };
        assert_eq!(kinds.iter().filter(|k| **k == trigger).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == restore).count(), 1);
        // Result reads come after write access was restored.
        let restored_at = kinds.iter().position(|k| *k == restore).unwrap();
        assert!(matches!(kinds.last(), Some(EventKind::BufferRead { .. })));
        assert!(restored_at < kinds.len() - 1);
    }

    let callers: HashSet<_> = runs.iter().map(|r| r[0].thread).collect();
    assert_eq!(callers.len(), threads);

    // Commits happen under the channel lock, so they follow transaction order.
    let staged: Vec<u8> = runs
        .iter()
        .filter_map(|run| {
            run.iter().find_map(|e| match e.kind {
                EventKind::BufferWrite { offset: 5, value } => Some(value),
                _ => None,
            })
        })
        .collect();
    assert_eq!(*committed.lock().unwrap(), staged);
}
