use std::sync::atomic::{AtomicUsize, Ordering};

/// Marks one operation as in flight for as long as the guard lives.
/// Released on every exit path, including early returns and `?`.
pub(crate) struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { counter }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) fn any_in_flight(counter: &AtomicUsize) -> bool {
    counter.load(Ordering::SeqCst) > 0
}
