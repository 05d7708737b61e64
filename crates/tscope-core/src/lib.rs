#![forbid(unsafe_code)]

//! Core: tensor model, identifiers, the storage boundary, and event plumbing.
//!
//! # Role in tensorscope
//! `tscope-core` is the data layer. It owns the immutable [`Tensor`] buffers
//! that every other crate borrows, the dot-delimited [`Identifier`] naming
//! scheme, and the [`TensorStore`] trait through which payloads are fetched.
//!
//! # Primary responsibilities
//! - **Tensor**: typed N-dimensional buffers decoded from raw bytes at exactly
//!   one point ([`Tensor::from_le_bytes`]).
//! - **Identifier**: validated path names with segment substitution for
//!   cross-record matching.
//! - **Storage**: the collaborator trait, an in-memory store, the catalog of
//!   metadata, and a session-owned [`PayloadCache`].
//! - **Plumbing**: cooperative cancellation and view-event coalescing.
//!
//! # How it fits in the system
//! `tscope-render` projects and pools tensor views, `tscope-diff` compares
//! them, and `tscope-runtime` wires storage, cache, and views into a session.

pub mod cancellation;
pub mod catalog;
pub mod identifier;
pub mod payload_cache;
pub mod storage;
pub mod tensor;
pub mod view_event;

pub use cancellation::{CancellationSource, CancellationToken};
pub use catalog::{Catalog, TensorMetadata};
pub use identifier::{Identifier, IdentifierError};
pub use payload_cache::{CacheStats, FetchError, PayloadCache, fetch_tensor};
pub use storage::{MemoryStore, StorageError, TensorStore};
pub use tensor::{ElementType, Tensor, TensorData, TensorError};
pub use view_event::{ViewEvent, ViewEventCoalescer};
