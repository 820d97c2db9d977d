//! FIFO ticket lock guarding the SMI channel.

use core::cell::UnsafeCell;
use core::hint::spin_loop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

/// Blocking, fair, non-reentrant mutual exclusion.
///
/// Callers are served in the order they arrived. There is no timeout: a
/// caller spins until every earlier ticket has been released. Re-locking
/// from the holder deadlocks.
pub struct TicketLock<T> {
    next: AtomicUsize,
    owner: AtomicUsize,
    cell: UnsafeCell<T>,
}

// Safety: mutual exclusion; only T: Send may cross threads.
unsafe impl<T: Send> Sync for TicketLock<T> {}
unsafe impl<T: Send> Send for TicketLock<T> {}

impl<T> TicketLock<T> {
    pub const fn new(value: T) -> Self {
        Self {
            next: AtomicUsize::new(0),
            owner: AtomicUsize::new(0),
            cell: UnsafeCell::new(value),
        }
    }

    /// Draws a ticket and spins until it is served.
    #[inline]
    pub fn lock(&self) -> TicketGuard<'_, T> {
        let ticket = self.next.fetch_add(1, Ordering::Relaxed);
        while self.owner.load(Ordering::Acquire) != ticket {
            spin_loop();
        }
        TicketGuard { lock: self }
    }

    /// Takes the lock only if nobody holds or waits for it.
    #[inline]
    pub fn try_lock(&self) -> Option<TicketGuard<'_, T>> {
        let owner = self.owner.load(Ordering::Relaxed);
        self.next
            .compare_exchange(
                owner,
                owner.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .ok()
            .map(|_| TicketGuard { lock: self })
    }
}

/// Holds the lock until dropped, on every exit path.
pub struct TicketGuard<'a, T> {
    lock: &'a TicketLock<T>,
}

impl<T> Deref for TicketGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.cell.get() }
    }
}

impl<T> DerefMut for TicketGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.cell.get() }
    }
}

impl<T> Drop for TicketGuard<'_, T> {
    fn drop(&mut self) {
        // Serve the next ticket; Release publishes the critical section.
        self.lock.owner.fetch_add(1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Barrier};
    use std::{panic, thread};

    #[test]
    fn guard_releases_on_drop() {
        let l = TicketLock::new(0_u32);
        {
            let mut g = l.lock();
            *g = 41;
        }
        let mut g = l.lock();
        *g += 1;
        assert_eq!(*g, 42);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let l = TicketLock::new(1u8);
        let g1 = l.try_lock();
        assert!(g1.is_some());
        assert!(l.try_lock().is_none());
        drop(g1);
        assert!(l.try_lock().is_some());
    }

    #[test]
    fn released_on_panic() {
        let l = TicketLock::new(0u32);
        let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            let mut g = l.lock();
            *g = 7;
            panic!("boom");
        }));
        assert!(res.is_err());
        assert_eq!(*l.lock(), 7);
    }

    #[test]
    fn contended_sections_never_overlap() {
        let threads = 4;
        let iters = 500;

        let lock = Arc::new(TicketLock::new(0usize));
        let inside = Arc::new(AtomicBool::new(false));
        let start = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let inside = Arc::clone(&inside);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    for _ in 0..iters {
                        let mut g = lock.lock();
                        assert!(!inside.swap(true, Ordering::SeqCst), "overlap");
                        *g += 1;
                        inside.store(false, Ordering::SeqCst);
                        drop(g);
                        thread::yield_now();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.lock(), threads * iters);
    }
}
