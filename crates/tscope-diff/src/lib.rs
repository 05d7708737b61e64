#![forbid(unsafe_code)]

//! Tensor comparison and hierarchical triage.
//!
//! # Role in tensorscope
//! `tscope-diff` answers "where do two records disagree?". It compares
//! tensors elementwise, sweeps a whole catalog for cross-record pairs, and
//! folds the resulting error magnitudes into a [`NamespaceTree`] whose
//! nodes can be colored by severity.
//!
//! # Primary responsibilities
//! - **diff**: [`pointwise_diff`] and [`mean_squared_error`].
//! - **batch**: [`batch_compare`] with progress, cancellation, and per-pair
//!   failure accounting.
//! - **namespace**: arena tree with post-order severity propagation.
//! - **outline**: text rendering of the tree for terminal listings.

pub mod batch;
pub mod diff;
pub mod namespace;
pub mod outline;

pub use batch::{
    BatchError, BatchObserver, BatchOutcome, BatchProgress, BatchSpec, DEFAULT_EPSILON,
    DiffResult, FailureKind, NoProgress, PairFailure, batch_compare,
};
pub use diff::{DiffError, mean_squared_error, pointwise_diff};
pub use namespace::{NamespaceTree, NodeId};
pub use outline::{Outline, OutlineGuides};
