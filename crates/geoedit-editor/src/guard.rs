//! Single-flight flag guard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a busy flag raised until dropped.
///
/// Dropping the guard clears the flag on every exit path, including early
/// returns and errors propagated with `?`.
pub(crate) struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    /// Raises `flag`, or returns `None` if it is already raised.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
