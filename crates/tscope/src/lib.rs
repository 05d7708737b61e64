#![forbid(unsafe_code)]

//! tensorscope public facade crate.
//!
//! Re-exports the types an application needs from the layer crates, a
//! unified [`Error`], and a prelude for day-to-day use.
//!
//! ```
//! use tscope::prelude::*;
//!
//! let id = Identifier::new("dt0.rec1.conv").unwrap();
//! let store = MemoryStore::new()
//!     .with_tensor(id.clone(), &Tensor::from_f32(&[4, 4], vec![0.5; 16]).unwrap());
//! let mut inspector = Inspector::new(store, ViewerConfig::default());
//! inspector.load_catalog()?;
//! inspector.show_tensor(&id)?;
//! assert_eq!(inspector.render().title(), "Slice Y:H (Dim 0), X:W (Dim 1) (Original Resolution)");
//! # Ok::<(), tscope::Error>(())
//! ```

pub mod error;

// --- Core re-exports -------------------------------------------------------

pub use tscope_core::{
    CacheStats, CancellationSource, CancellationToken, Catalog, ElementType, Identifier,
    IdentifierError, MemoryStore, PayloadCache, StorageError, Tensor, TensorData, TensorError,
    TensorMetadata, TensorStore, ViewEvent,
};

// --- Render re-exports -----------------------------------------------------

pub use tscope_render::{
    AxisProjector, Extent, Grid, POOL_ACTIVATION_RATIO, ProjectionError, SurfaceSize,
    ValueRange, Viewport, ViewportError,
};

// --- Style re-exports ------------------------------------------------------

pub use tscope_style::{Rgb, SeverityScale};

// --- Diff re-exports -------------------------------------------------------

pub use tscope_diff::{
    BatchError, BatchOutcome, BatchSpec, DiffError, DiffResult, NamespaceTree, NodeId, Outline,
    OutlineGuides, batch_compare, mean_squared_error, pointwise_diff,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "config-files")]
pub use tscope_runtime::ManifestStore;
pub use tscope_runtime::{
    BatchJob, BatchSummary, ConfigError, Inspector, SessionError, Source, View, ViewerConfig,
};

pub use error::{Error, RecoveryAction, Result};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, Identifier, Inspector, MemoryStore, RecoveryAction, Result, Rgb, Tensor,
        TensorStore, View, ViewerConfig,
    };

    pub use crate::{core, diff, render, runtime, style};
}

pub use tscope_core as core;
pub use tscope_diff as diff;
pub use tscope_render as render;
pub use tscope_runtime as runtime;
pub use tscope_style as style;
