#![forbid(unsafe_code)]

//! Cooperative cancellation for long-running comparisons.
//!
//! A batch comparison over a large catalog can take a while. The control
//! side holds a [`CancellationSource`]; the worker polls the
//! [`CancellationToken`] between tensor pairs and stops early when asked.
//! Nothing is interrupted mid-pair, so a cancelled run never leaves a
//! half-computed result behind.
//!
//! # Example
//!
//! ```
//! use tscope_core::cancellation::CancellationSource;
//! use std::time::Duration;
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//!
//! let worker = std::thread::spawn(move || {
//!     let mut pairs = 0u32;
//!     while !token.is_cancelled() {
//!         pairs += 1;
//!         std::thread::sleep(Duration::from_millis(1));
//!     }
//!     pairs
//! });
//!
//! source.cancel();
//! let _ = worker.join().unwrap();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable observer of a cancellation request.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Signal>,
}

/// Control handle that requests cancellation.
///
/// Dropping the source does **not** cancel its tokens.
pub struct CancellationSource {
    inner: Arc<Signal>,
}

struct Signal {
    cancelled: AtomicBool,
}

impl Signal {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            cancelled: AtomicBool::new(false),
        })
    }
}

impl CancellationSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    /// Token observing this source.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    /// A token whose source is already gone; it is never cancelled.
    #[must_use]
    pub fn never() -> Self {
        Self {
            inner: Signal::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_uncancelled() {
        let source = CancellationSource::new();
        assert!(!source.token().is_cancelled());
        assert!(!source.is_cancelled());
    }

    #[test]
    fn cancel_reaches_every_clone() {
        let source = CancellationSource::new();
        let a = source.token();
        let b = a.clone();
        source.cancel();
        source.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn dropping_source_does_not_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        drop(source);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn never_token_stays_live() {
        let token = CancellationToken::never();
        assert!(!token.is_cancelled());
        assert!(!token.clone().is_cancelled());
    }

    #[test]
    fn cancel_is_seen_across_threads() {
        let source = CancellationSource::new();
        let token = source.token();
        source.cancel();
        let seen = thread::spawn(move || token.is_cancelled());
        assert!(seen.join().unwrap());
    }
}
