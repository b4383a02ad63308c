//! Non-blocking mutual exclusion: acquire now or not at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A slot with at most one holder. Acquiring never waits.
#[derive(Debug, Default)]
pub struct SingleFlightLock {
    held: AtomicBool,
}

impl SingleFlightLock {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the slot if it is free. The slot is released when the returned
    /// guard is dropped, including during unwinding.
    #[must_use]
    pub fn try_acquire(self: &Arc<Self>) -> Option<SingleFlightGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SingleFlightGuard {
                lock: Arc::clone(self),
            })
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of holding a [`SingleFlightLock`]
#[derive(Debug)]
pub struct SingleFlightGuard {
    lock: Arc<SingleFlightLock>,
}

impl Drop for SingleFlightGuard {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}
