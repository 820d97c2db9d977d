use kernel_sabi::{
    FailureCause, MAIN_FUNCTION, Request, SMI_SETTLE_MS, Sabi, SabiError, TransactionFailure,
};
use kernel_sabi_sim::{
    DEFAULT_HEADER, EventKind, Reply, SimDelay, SimPorts, SimWindow, SimulatedBios,
};

type SimSabi = Sabi<SimWindow, SimPorts, SimDelay>;

fn connect(bios: &SimulatedBios) -> SimSabi {
    let sabi = unsafe { Sabi::probe(&bios.mapper(), bios.ports(), bios.delay()) }.unwrap();
    bios.clear_events();
    sabi
}

fn port(value: u8) -> EventKind {
    EventKind::PortWrite {
        port: DEFAULT_HEADER.port,
        value,
    }
}

#[test]
fn get_brightness_returns_four_bytes() {
    let bios = SimulatedBios::new().with_responder(|command, _| {
        assert_eq!(command, 0x10);
        Reply {
            completion: 0xAA,
            data: [0x05, 0x01, 0x02, 0x03],
        }
    });
    let sabi = connect(&bios);

    let result = sabi.get(0x10).unwrap();
    assert_eq!(result, [0x05, 0x01, 0x02, 0x03]);
    assert_eq!(result[0] - 1, 4);
}

#[test]
fn get_walks_the_six_steps_in_order() {
    let bios = SimulatedBios::new();
    let sabi = connect(&bios);
    sabi.get(0x10).unwrap();

    let kinds: Vec<EventKind> = bios.events().into_iter().map(|e| e.kind).collect();
    let [main_lo, main_hi] = MAIN_FUNCTION.to_le_bytes();
    assert_eq!(
        kinds,
        vec![
            port(DEFAULT_HEADER.enable_code),
            EventKind::BufferWrite { offset: 0, value: main_lo },
            EventKind::BufferWrite { offset: 1, value: main_hi },
            EventKind::BufferWrite { offset: 2, value: 0x10 },
            EventKind::BufferWrite { offset: 3, value: 0x00 },
            EventKind::BufferWrite { offset: 4, value: 0x00 },
            port(DEFAULT_HEADER.trigger_code),
            EventKind::Serviced { command: 0x10 },
            EventKind::Delay { ms: SMI_SETTLE_MS },
            port(DEFAULT_HEADER.restore_code),
            EventKind::BufferRead { offset: 4 },
            EventKind::BufferRead { offset: 5 },
            EventKind::BufferRead { offset: 5 },
            EventKind::BufferRead { offset: 6 },
            EventKind::BufferRead { offset: 7 },
            EventKind::BufferRead { offset: 8 },
        ]
    );
    assert_eq!(bios.protected_writes(), 0);
    assert!(!bios.is_unlocked());
}

#[test]
fn set_stages_the_payload_before_triggering() {
    let bios = SimulatedBios::new();
    let sabi = connect(&bios);
    sabi.set(0x11, 0x03).unwrap();

    let kinds: Vec<EventKind> = bios.events().into_iter().map(|e| e.kind).collect();
    let payload = kinds
        .iter()
        .position(|k| *k == EventKind::BufferWrite { offset: 5, value: 0x03 })
        .unwrap();
    let trigger = kinds
        .iter()
        .position(|k| *k == port(DEFAULT_HEADER.trigger_code))
        .unwrap();
    assert!(payload < trigger);
    assert_eq!(bios.panel().brightness, 3);
}

#[test]
fn rejected_command_reports_raw_bytes() {
    let bios = SimulatedBios::new();
    let sabi = connect(&bios);

    let err = sabi.get(0x55).unwrap_err();
    assert_eq!(
        err,
        SabiError::Transaction(TransactionFailure {
            command: 0x55,
            completion: 0xAA,
            data: 0xFF
        })
    );
    // Write access is restored even on failure.
    assert!(!bios.is_unlocked());
}

#[test]
fn silent_bios_is_incomplete() {
    let bios = SimulatedBios::new().with_responder(|_, payload| Reply {
        completion: 0x00,
        data: [payload, 0, 0, 0],
    });
    let sabi = connect(&bios);

    let Err(SabiError::Transaction(failure)) = sabi.set(0x11, 0x04) else {
        panic!("expected failure");
    };
    assert_eq!(failure.completion, 0x00);
    assert_eq!(failure.data, 0x04);
    assert_eq!(failure.cause(), FailureCause::Incomplete);
}

#[test]
fn wrong_sentinel_fails_even_with_good_data() {
    let bios = SimulatedBios::new().with_responder(|_, _| Reply {
        completion: 0xAB,
        data: [0x05, 0, 0, 0],
    });
    let sabi = connect(&bios);
    assert!(matches!(
        sabi.get(0x10),
        Err(SabiError::Transaction(TransactionFailure {
            completion: 0xAB,
            data: 0x05,
            ..
        }))
    ));
}

#[test]
fn failure_does_not_poison_the_channel() {
    let bios = SimulatedBios::new();
    let sabi = connect(&bios);

    assert!(sabi.get(0x55).is_err());
    assert_eq!(sabi.get(0x10).unwrap()[0], 5);
}

#[test]
fn every_transaction_waits_once() {
    let bios = SimulatedBios::new();
    let sabi = connect(&bios);
    sabi.get(0x10).unwrap();
    sabi.set(0x11, 2).unwrap();
    let _ = sabi.get(0x99);

    let delays = bios
        .events()
        .into_iter()
        .filter(|e| matches!(e.kind, EventKind::Delay { .. }))
        .count();
    assert_eq!(delays, 3);
}

#[test]
fn commit_sees_the_finished_transaction_only_on_success() {
    let bios = SimulatedBios::new();
    let sabi = connect(&bios);

    let level = sabi
        .execute_with(Request::get(0x10), |result| {
            // Write access is already restored when the result is handed over.
            assert_eq!(
                bios.events().last().map(|e| e.kind),
                Some(EventKind::BufferRead { offset: 8 })
            );
            assert!(!bios.is_unlocked());
            result[0]
        })
        .unwrap();
    assert_eq!(level, 5);

    let mut called = false;
    let err = sabi.execute_with(Request::get(0x99), |_| called = true);
    assert!(err.is_err());
    assert!(!called);
}
