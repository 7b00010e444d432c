// src/run/cancel.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle for cancelling a run from outside the coordinator
/// (a Ctrl-C handler, a UI button).
///
/// Backed by a single `AtomicBool`: one writer side, many readers. The poll
/// loop reads it once per tick, so cancellation latency is at most one
/// `poll_interval`. `cancel()` is idempotent and a no-op once the run is
/// terminal.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent_and_visible_to_clones() {
        let handle = CancelHandle::new();
        let observer = handle.clone();
        assert!(!observer.is_cancelled());

        handle.cancel();
        handle.cancel();
        assert!(observer.is_cancelled());
    }
}
