#![forbid(unsafe_code)]

//! Redraw request coalescing.
//!
//! Every state change in a session asks for a redraw, but the surface only
//! needs to paint once per event-loop tick. [`RedrawDispatcher`] is a dirty
//! flag with counters: any number of [`request`](RedrawDispatcher::request)
//! calls between two [`take`](RedrawDispatcher::take) calls produce one
//! redraw.
//!
//! ```
//! use tscope_runtime::dispatcher::RedrawDispatcher;
//!
//! let mut redraw = RedrawDispatcher::new();
//! redraw.request();
//! redraw.request();
//! assert!(redraw.take());
//! assert!(!redraw.take());
//! assert_eq!(redraw.coalesced(), 1);
//! ```

/// Dirty flag with request/dispatch accounting.
#[derive(Debug, Clone, Default)]
pub struct RedrawDispatcher {
    dirty: bool,
    requests: u64,
    dispatches: u64,
}

impl RedrawDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the view as needing a redraw.
    pub fn request(&mut self) {
        self.dirty = true;
        self.requests += 1;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.dirty
    }

    /// Consume the pending request; `true` means "paint now".
    pub fn take(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.dispatches += 1;
        true
    }

    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests
    }

    #[must_use]
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Requests absorbed into an earlier dispatch or still pending.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.requests - self.dispatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_dispatcher_never_fires() {
        let mut d = RedrawDispatcher::new();
        assert!(!d.is_pending());
        assert!(!d.take());
        assert_eq!(d.dispatches(), 0);
    }

    #[test]
    fn one_dispatch_per_tick() {
        let mut d = RedrawDispatcher::new();
        for _ in 0..10 {
            d.request();
        }
        assert!(d.take());
        d.request();
        assert!(d.is_pending());
        assert!(d.take());
        assert_eq!(d.requests(), 11);
        assert_eq!(d.dispatches(), 2);
        assert_eq!(d.coalesced(), 9);
    }
}
