#![deny(unsafe_code)]

//! Level-of-detail rendering: viewport-adaptive max pooling.
//!
//! When the visible data range is much wider than the drawing surface, many
//! data columns land on each device column. [`render`] then reduces the
//! slice with non-overlapping `k×k` max pooling so the grid handed to the
//! surface stays close to screen resolution, and small hot spots survive
//! the reduction.
//!
//! The pooled grid always covers the full slice extent
//! (`-0.5 .. W-0.5` by `H-0.5 .. -0.5`), so pooled cells stretch over their
//! `k×k` source block and data coordinates stay consistent across pool
//! sizes.
//!
//! # Usage
//!
//! ```
//! use ndarray::array;
//! use tscope_render::lod::{pool_max, pool_size};
//!
//! assert_eq!(pool_size(1000.0, 100), 10);
//! assert_eq!(pool_size(140.0, 100), 1);
//!
//! let slice = array![[1, 2, 3], [4, 5, 6], [7, 8, 9]];
//! let pooled = pool_max(slice.view(), 2);
//! assert_eq!(pooled, array![[5, 6], [8, 9]]);
//! ```

use ndarray::{Array2, ArrayView2, CowArray, Ix2, s};

use crate::projection::{AxisProjector, SliceView};
use crate::viewport::Viewport;

/// Pooling starts once more than this many data columns share one device
/// column.
pub const POOL_ACTIVATION_RATIO: f64 = 1.5;

/// Title of rank 0/1 views.
pub const RESHAPED_TITLE: &str = "Tensor Value";

/// Pool size for a viewport of `viewport_width` data units on a surface of
/// `surface_width` device units.
#[must_use]
pub fn pool_size(viewport_width: f64, surface_width: u32) -> usize {
    if surface_width == 0 {
        return 1;
    }
    let ratio = viewport_width / f64::from(surface_width);
    if ratio.is_finite() && ratio > POOL_ACTIVATION_RATIO {
        ratio.ceil() as usize
    } else {
        1
    }
}

/// Element types that can be max-pooled.
pub trait PoolElement: Copy {
    /// Larger of two values; NaN wins for floating point.
    fn pool_max(self, other: Self) -> Self;
}

impl PoolElement for f32 {
    #[inline]
    fn pool_max(self, other: Self) -> Self {
        if self.is_nan() || other.is_nan() {
            f32::NAN
        } else {
            self.max(other)
        }
    }
}

impl PoolElement for i32 {
    #[inline]
    fn pool_max(self, other: Self) -> Self {
        self.max(other)
    }
}

/// Non-overlapping `k×k` max pooling.
///
/// The output has shape `(ceil(H/k), ceil(W/k))`; trailing partial blocks
/// are reduced over the elements they have. `k <= 1` copies the slice.
#[must_use]
pub fn pool_max<A: PoolElement>(slice: ArrayView2<'_, A>, k: usize) -> Array2<A> {
    if k <= 1 {
        return slice.to_owned();
    }
    let (h, w) = slice.dim();
    Array2::from_shape_fn((h.div_ceil(k), w.div_ceil(k)), |(r, c)| {
        let block = slice.slice(s![r * k..((r + 1) * k).min(h), c * k..((c + 1) * k).min(w)]);
        let first = block[[0, 0]];
        block.fold(first, |acc, &v| acc.pool_max(v))
    })
}

/// Image placement in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Extent {
    /// Extent of an `h × w` slice with row 0 at the top.
    #[must_use]
    pub fn of_slice(h: usize, w: usize) -> Self {
        Self {
            left: -0.5,
            right: w as f64 - 0.5,
            bottom: h as f64 - 0.5,
            top: -0.5,
        }
    }
}

/// Color bar bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub vmin: f64,
    pub vmax: f64,
}

impl ValueRange {
    /// `0 .. max(values)`, with `1.0` standing in for a zero or
    /// non-finite maximum. NaN elements are ignored.
    #[must_use]
    pub fn of_slice(slice: &SliceView<'_>) -> Self {
        let max = match slice {
            SliceView::Float32(v) => v
                .iter()
                .filter(|x| !x.is_nan())
                .map(|&x| f64::from(x))
                .fold(f64::NEG_INFINITY, f64::max),
            SliceView::Int32(v) => v
                .iter()
                .map(|&x| f64::from(x))
                .fold(f64::NEG_INFINITY, f64::max),
        };
        let vmax = if max.is_finite() && max != 0.0 { max } else { 1.0 };
        Self { vmin: 0.0, vmax }
    }
}

/// Display grid, borrowed at full resolution or owned after pooling.
#[derive(Debug, Clone)]
pub enum Grid<'a> {
    Float32(CowArray<'a, f32, Ix2>),
    Int32(CowArray<'a, i32, Ix2>),
}

impl Grid<'_> {
    /// `(rows, cols)`.
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Float32(g) => g.dim(),
            Self::Int32(g) => g.dim(),
        }
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            Self::Float32(g) => g.get((row, col)).map(|&v| f64::from(v)),
            Self::Int32(g) => g.get((row, col)).map(|&v| f64::from(v)),
        }
    }

    /// Whether the grid still borrows the tensor buffer.
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        match self {
            Self::Float32(g) => g.is_view(),
            Self::Int32(g) => g.is_view(),
        }
    }

    /// Detach from the tensor buffer.
    #[must_use]
    pub fn into_owned(self) -> Grid<'static> {
        match self {
            Self::Float32(g) => Grid::Float32(CowArray::from(g.into_owned())),
            Self::Int32(g) => Grid::Int32(CowArray::from(g.into_owned())),
        }
    }
}

/// Everything a surface needs to paint one frame.
#[derive(Debug, Clone)]
pub struct LodFrame<'a> {
    pub grid: Grid<'a>,
    pub extent: Extent,
    pub pool_size: usize,
    pub value_range: ValueRange,
}

/// Reduce `slice` for display through `viewport` on a surface
/// `surface_width` units wide.
///
/// Pure: the same inputs always produce the same frame.
#[must_use]
pub fn render<'a>(slice: &SliceView<'a>, viewport: &Viewport, surface_width: u32) -> LodFrame<'a> {
    let (h, w) = slice.dim();
    let k = pool_size(viewport.width(), surface_width);

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        target: "tscope.render",
        "tscope.render",
        rows = h,
        cols = w,
        pool_size = k,
        surface_width
    );
    #[cfg(feature = "tracing")]
    let _guard = _span.enter();

    let grid = match slice {
        SliceView::Float32(v) if k > 1 => Grid::Float32(CowArray::from(pool_max(v.view(), k))),
        SliceView::Int32(v) if k > 1 => Grid::Int32(CowArray::from(pool_max(v.view(), k))),
        SliceView::Float32(v) => Grid::Float32(CowArray::from(v.clone())),
        SliceView::Int32(v) => Grid::Int32(CowArray::from(v.clone())),
    };

    #[cfg(feature = "tracing")]
    tracing::trace!(target: "tscope.render", grid = ?grid.dim(), "lod grid ready");

    LodFrame {
        grid,
        extent: Extent::of_slice(h, w),
        pool_size: k,
        value_range: ValueRange::of_slice(slice),
    }
}

/// Plot title for the current projection and pool size.
#[must_use]
pub fn title(projector: &AxisProjector, pool_size: usize) -> String {
    let base = if projector.is_reshaped() {
        RESHAPED_TITLE.to_string()
    } else {
        let (y, x) = projector.state().axes();
        format!(
            "Slice Y:{}, X:{}",
            projector.axis_choice(y).unwrap_or_default(),
            projector.axis_choice(x).unwrap_or_default()
        )
    };
    if pool_size > 1 {
        format!("{base} (Pooled {pool_size}x{pool_size})")
    } else {
        format!("{base} (Original Resolution)")
    }
}

/// Describe the cell under data point `(x, y)`.
#[must_use]
pub fn probe(slice: &SliceView<'_>, x: f64, y: f64) -> String {
    if !(x.is_finite() && y.is_finite()) {
        return format!("x={x}, y={y}");
    }
    let col = x.round() as i64;
    let row = y.round() as i64;
    let (h, w) = slice.dim();
    let inside = (0..w as i64).contains(&col) && (0..h as i64).contains(&row);
    match inside.then(|| slice.get(row as usize, col as usize)).flatten() {
        Some(value) => format!("x={col}, y={row}  value={value:.4}"),
        None => format!("x={col}, y={row}"),
    }
}
