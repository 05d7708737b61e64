#![forbid(unsafe_code)]

//! Coalescing of high-frequency view interactions.
//!
//! A scroll wheel or a drag can deliver dozens of events per frame. Applying
//! each one separately means re-pooling the projected grid for every tick.
//! [`ViewEventCoalescer`] folds runs of compatible events into one:
//!
//! - consecutive scrolls at the same anchor multiply their zoom factors
//! - consecutive pans add their offsets
//! - consecutive resizes keep the latest size
//!
//! Zoom and pan do not commute, so events of different kinds are never
//! merged across each other; order is preserved. An event the view would
//! reject (a non-positive or non-finite zoom factor, a non-finite offset)
//! is queued on its own so it cannot spoil the run it follows.
//!
//! # Usage
//!
//! ```
//! use tscope_core::view_event::{ViewEvent, ViewEventCoalescer};
//!
//! let mut events = ViewEventCoalescer::new();
//! events.push(ViewEvent::scroll(1.2, 4.0, 4.0));
//! events.push(ViewEvent::scroll(1.2, 4.0, 4.0));
//! events.push(ViewEvent::Pan { dx: 1.0, dy: 0.0 });
//! events.push(ViewEvent::Pan { dx: 2.0, dy: -1.0 });
//!
//! let batch = events.flush();
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch[1], ViewEvent::Pan { dx: 3.0, dy: -1.0 });
//! ```

/// One user interaction with the heatmap view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// Zoom by `factor` (> 1 shrinks the visible range) around a data-space
    /// anchor.
    Scroll {
        factor: f64,
        anchor_x: f64,
        anchor_y: f64,
    },
    /// Translate the visible range by data-space offsets.
    Pan { dx: f64, dy: f64 },
    /// The drawing surface changed size (in device pixels or cells).
    Resize { width: u32, height: u32 },
}

impl ViewEvent {
    #[must_use]
    pub const fn scroll(factor: f64, anchor_x: f64, anchor_y: f64) -> Self {
        Self::Scroll {
            factor,
            anchor_x,
            anchor_y,
        }
    }

    /// Whether the view can apply this event.
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        match *self {
            Self::Scroll {
                factor,
                anchor_x,
                anchor_y,
            } => factor.is_finite() && factor > 0.0 && anchor_x.is_finite() && anchor_y.is_finite(),
            Self::Pan { dx, dy } => dx.is_finite() && dy.is_finite(),
            Self::Resize { .. } => true,
        }
    }

    /// Fold `next` into `self` if the two may be applied as one.
    fn merge(&mut self, next: &Self) -> bool {
        if !self.is_applicable() || !next.is_applicable() {
            return false;
        }
        match (self, next) {
            (
                Self::Scroll {
                    factor,
                    anchor_x,
                    anchor_y,
                },
                Self::Scroll {
                    factor: f,
                    anchor_x: x,
                    anchor_y: y,
                },
            ) if *anchor_x == *x && *anchor_y == *y => {
                let merged = *factor * *f;
                if !merged.is_finite() || merged <= 0.0 {
                    return false;
                }
                *factor = merged;
                true
            }
            (Self::Pan { dx, dy }, Self::Pan { dx: ndx, dy: ndy }) => {
                let (sx, sy) = (*dx + *ndx, *dy + *ndy);
                if !sx.is_finite() || !sy.is_finite() {
                    return false;
                }
                *dx = sx;
                *dy = sy;
                true
            }
            (
                Self::Resize { width, height },
                Self::Resize {
                    width: w,
                    height: h,
                },
            ) => {
                *width = *w;
                *height = *h;
                true
            }
            _ => false,
        }
    }
}

/// Folds runs of compatible [`ViewEvent`]s.
///
/// Single-threaded; owned by whatever drives the view.
#[derive(Debug, Clone, Default)]
pub struct ViewEventCoalescer {
    pending: Vec<ViewEvent>,
    received: u64,
}

impl ViewEventCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event, merging it into the newest pending one when possible.
    pub fn push(&mut self, event: ViewEvent) {
        self.received += 1;
        if let Some(last) = self.pending.last_mut()
            && last.merge(&event)
        {
            return;
        }
        self.pending.push(event);
    }

    /// Whether anything is waiting to be applied.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of raw events pushed since construction.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Take the coalesced events in arrival order.
    #[must_use]
    pub fn flush(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolls_multiply_at_same_anchor() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::scroll(2.0, 1.0, 1.0));
        c.push(ViewEvent::scroll(0.5, 1.0, 1.0));
        c.push(ViewEvent::scroll(3.0, 1.0, 1.0));
        assert_eq!(c.flush(), vec![ViewEvent::scroll(3.0, 1.0, 1.0)]);
        assert_eq!(c.received(), 3);
    }

    #[test]
    fn scrolls_at_different_anchors_stay_separate() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::scroll(2.0, 1.0, 1.0));
        c.push(ViewEvent::scroll(2.0, 5.0, 1.0));
        assert_eq!(c.flush().len(), 2);
    }

    #[test]
    fn pan_breaks_a_scroll_run() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::scroll(2.0, 0.0, 0.0));
        c.push(ViewEvent::Pan { dx: 1.0, dy: 1.0 });
        c.push(ViewEvent::scroll(2.0, 0.0, 0.0));
        let out = c.flush();
        assert_eq!(out.len(), 3);
        assert!(matches!(out[1], ViewEvent::Pan { .. }));
    }

    #[test]
    fn rejected_scroll_is_not_folded_in() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::scroll(2.0, 4.5, 4.5));
        c.push(ViewEvent::scroll(0.0, 4.5, 4.5));
        c.push(ViewEvent::scroll(f64::NAN, 4.5, 4.5));
        assert_eq!(c.flush().len(), 3);

        c.push(ViewEvent::scroll(f64::NAN, 4.5, 4.5));
        c.push(ViewEvent::scroll(2.0, 4.5, 4.5));
        let out = c.flush();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], ViewEvent::scroll(2.0, 4.5, 4.5));
    }

    #[test]
    fn scroll_product_must_stay_finite() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::scroll(1e200, 0.0, 0.0));
        c.push(ViewEvent::scroll(1e200, 0.0, 0.0));
        assert_eq!(c.flush().len(), 2);
    }

    #[test]
    fn rejected_pan_is_not_folded_in() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::Pan { dx: 3.0, dy: 0.0 });
        c.push(ViewEvent::Pan {
            dx: f64::NAN,
            dy: 0.0,
        });
        let out = c.flush();
        assert_eq!(out[0], ViewEvent::Pan { dx: 3.0, dy: 0.0 });
        assert!(!out[1].is_applicable());
    }

    #[test]
    fn resize_latest_wins() {
        let mut c = ViewEventCoalescer::new();
        c.push(ViewEvent::Resize {
            width: 10,
            height: 10,
        });
        c.push(ViewEvent::Resize {
            width: 80,
            height: 24,
        });
        assert_eq!(
            c.flush(),
            vec![ViewEvent::Resize {
                width: 80,
                height: 24
            }]
        );
    }

    #[test]
    fn flush_empties() {
        let mut c = ViewEventCoalescer::new();
        assert!(!c.has_pending());
        c.push(ViewEvent::Pan { dx: 1.0, dy: 0.0 });
        assert!(c.has_pending());
        let _ = c.flush();
        assert!(!c.has_pending());
        assert!(c.flush().is_empty());
    }
}
