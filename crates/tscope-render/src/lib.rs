#![deny(unsafe_code)]

//! Render: tensor → 2D slice → screen-resolution grid.
//!
//! # Role in tensorscope
//! `tscope-render` turns an immutable [`Tensor`](tscope_core::Tensor) into
//! something a drawing surface can paint. It never owns pixels and never
//! talks to a UI toolkit; everything here is a pure function of the tensor,
//! the projection state, the viewport, and the surface size.
//!
//! # Primary responsibilities
//! - **AxisProjector**: two display axes plus pinned indices, producing a
//!   strided view into the tensor buffer.
//! - **Viewport**: the visible data rectangle with anchored zoom and pan.
//! - **LOD**: block-max pooling that tracks screen resolution, plus extent,
//!   value range, titles, and point probes.
//!
//! # How it fits in the system
//! `tscope-runtime` owns a projector and a viewport per session and calls
//! [`lod::render`] whenever a redraw is requested.

pub mod lod;
pub mod projection;
pub mod viewport;

pub use lod::{Extent, Grid, LodFrame, POOL_ACTIVATION_RATIO, PoolElement, ValueRange};
pub use projection::{AxisProjector, FixedAxis, ProjectionError, ProjectionState, SliceView};
pub use viewport::{SurfaceSize, Viewport, ViewportError};
