#![forbid(unsafe_code)]

//! Visible data-space rectangle with anchored zoom and pan.
//!
//! Coordinates are in data units: cell `(row, col)` of a slice covers
//! `[col - 0.5, col + 0.5] × [row - 0.5, row + 0.5]`. `y_min` is the data
//! coordinate at the bottom edge of the surface and `y_max` the one at the
//! top edge, so image-style views (row 0 at the top) have `y_min > y_max`.
//!
//! Every mutation validates its input and its result; a rejected operation
//! leaves the viewport untouched and reports [`ViewportError::Degenerate`].
//!
//! # Usage
//!
//! ```
//! use tscope_render::viewport::Viewport;
//!
//! let mut vp = Viewport::fit(32, 32, None).unwrap();
//! assert_eq!(vp.x_range(), (-0.5, 31.5));
//! assert_eq!(vp.y_range(), (31.5, -0.5));
//!
//! vp.zoom(2.0, 15.5, 15.5).unwrap();
//! assert!((vp.width() - 16.0).abs() < 1e-12);
//! ```

use std::fmt;

/// Drawing surface size in device units (pixels or terminal cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `width / height`, or `None` for an empty surface.
    #[must_use]
    pub fn aspect(self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| f64::from(self.width) / f64::from(self.height))
    }
}

/// Viewport failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportError {
    /// The operation would produce (or was given) a non-finite or
    /// zero-area rectangle.
    Degenerate { op: &'static str },
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degenerate { op } => write!(f, "{op} would produce a degenerate viewport"),
        }
    }
}

impl std::error::Error for ViewportError {}

/// Visible rectangle in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Viewport {
    /// Build a viewport from explicit bounds.
    ///
    /// Requires finite bounds, `x_max > x_min`, and `y_max != y_min`.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, ViewportError> {
        let vp = Self {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        if vp.is_valid() {
            Ok(vp)
        } else {
            Err(ViewportError::Degenerate { op: "new" })
        }
    }

    /// Whole-slice view for an `h × w` slice.
    ///
    /// With a surface aspect ratio the shorter axis is padded symmetrically
    /// so cells stay square.
    pub fn fit(h: usize, w: usize, surface_aspect: Option<f64>) -> Result<Self, ViewportError> {
        const OP: &str = "reset_to_fit";
        if h == 0 || w == 0 {
            return Err(ViewportError::Degenerate { op: OP });
        }
        let (hf, wf) = (h as f64, w as f64);
        let (mut x0, mut x1, mut y0, mut y1) = (-0.5, wf - 0.5, hf - 0.5, -0.5);

        if let Some(aspect) = surface_aspect {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(ViewportError::Degenerate { op: OP });
            }
            if wf / hf > aspect {
                let margin = (wf / aspect - hf) / 2.0;
                y0 += margin;
                y1 -= margin;
            } else {
                let margin = (hf * aspect - wf) / 2.0;
                x0 -= margin;
                x1 += margin;
            }
        }

        let vp = Self {
            x_min: x0,
            x_max: x1,
            y_min: y0,
            y_max: y1,
        };
        if vp.is_valid() {
            Ok(vp)
        } else {
            Err(ViewportError::Degenerate { op: OP })
        }
    }

    /// Replace `self` with [`Viewport::fit`].
    pub fn reset_to_fit(
        &mut self,
        h: usize,
        w: usize,
        surface_aspect: Option<f64>,
    ) -> Result<(), ViewportError> {
        *self = Self::fit(h, w, surface_aspect)?;
        Ok(())
    }

    /// Scale around `(anchor_x, anchor_y)`; `factor > 1` zooms in.
    ///
    /// The anchor keeps its relative position on screen.
    pub fn zoom(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) -> Result<(), ViewportError> {
        const OP: &str = "zoom";
        if !(factor.is_finite() && factor > 0.0 && anchor_x.is_finite() && anchor_y.is_finite()) {
            return Err(ViewportError::Degenerate { op: OP });
        }
        let scale = 1.0 / factor;
        let (x_min, x_max) = zoom_range(self.x_min, self.x_max, anchor_x, scale);
        let (y_min, y_max) = zoom_range(self.y_min, self.y_max, anchor_y, scale);
        self.commit(
            Self {
                x_min,
                x_max,
                y_min,
                y_max,
            },
            OP,
        )
    }

    /// Translate by data-space offsets.
    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), ViewportError> {
        const OP: &str = "pan";
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(ViewportError::Degenerate { op: OP });
        }
        self.commit(
            Self {
                x_min: self.x_min + dx,
                x_max: self.x_max + dx,
                y_min: self.y_min + dy,
                y_max: self.y_max + dy,
            },
            OP,
        )
    }

    /// Map a surface position (origin top-left) to data coordinates.
    #[must_use]
    pub fn screen_to_data(&self, px: f64, py: f64, surface: SurfaceSize) -> Option<(f64, f64)> {
        if surface.width == 0 || surface.height == 0 || !px.is_finite() || !py.is_finite() {
            return None;
        }
        let fx = px / f64::from(surface.width);
        let fy = py / f64::from(surface.height);
        Some((
            self.x_min + fx * (self.x_max - self.x_min),
            self.y_max + fy * (self.y_min - self.y_max),
        ))
    }

    /// `(x_min, x_max)`.
    #[must_use]
    pub fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    /// `(y_min, y_max)`: bottom edge, top edge.
    #[must_use]
    pub fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Absolute visible height.
    #[must_use]
    pub fn height(&self) -> f64 {
        (self.y_max - self.y_min).abs()
    }

    /// Whether the y axis grows downward on screen.
    #[must_use]
    pub fn is_y_inverted(&self) -> bool {
        self.y_min > self.y_max
    }

    fn is_valid(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_max > self.x_min
            && self.y_max != self.y_min
    }

    fn commit(&mut self, next: Self, op: &'static str) -> Result<(), ViewportError> {
        if next.is_valid() {
            *self = next;
            Ok(())
        } else {
            Err(ViewportError::Degenerate { op })
        }
    }
}

/// Scale `[lo, hi]` by `scale` keeping `anchor` at the same relative spot.
fn zoom_range(lo: f64, hi: f64, anchor: f64, scale: f64) -> (f64, f64) {
    let span = hi - lo;
    let rel = (hi - anchor) / span;
    let new_span = span * scale;
    (anchor - new_span * (1.0 - rel), anchor + new_span * rel)
}
