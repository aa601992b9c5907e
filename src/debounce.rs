//! Trailing-edge debounce on top of `gloo_timers` timeouts.

use gloo_timers::callback::Timeout;
use std::cell::RefCell;

/// Runs only the most recently scheduled action, once `delay_ms` has passed
/// without another call.
pub struct Debouncer {
    delay_ms: u32,
    pending: RefCell<Option<Timeout>>,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            pending: RefCell::new(None),
        }
    }

    pub fn call(&self, action: impl FnOnce() + 'static) {
        let handle = Timeout::new(self.delay_ms, action);
        // dropping the previous Timeout cancels it
        self.pending.replace(Some(handle));
    }

    /// Forget the pending action, if any.
    pub fn cancel(&self) {
        self.pending.take();
    }
}
