#![forbid(unsafe_code)]

//! Runtime: the interactive session and everything around it.
//!
//! # Role in tensorscope
//! `tscope-runtime` wires the data, render, and diff layers into one
//! [`Inspector`] a UI can drive: load a catalog, show a tensor or a
//! difference, move through it, and triage two records against each other.
//!
//! # Primary responsibilities
//! - **session**: the [`Inspector`] with all-or-nothing mutations.
//! - **dispatcher**: coalesced redraw requests.
//! - **batch_job**: batch comparison on a worker thread with progress and
//!   cancellation.
//! - **config**: [`ViewerConfig`], loadable from TOML or JSON with the
//!   `config-files` feature.
//! - **manifest_store**: a directory-backed store (`config-files`).

pub mod batch_job;
pub mod config;
pub mod dispatcher;
pub mod error;
#[cfg(feature = "config-files")]
pub mod manifest_store;
pub mod session;

pub use batch_job::BatchJob;
pub use config::{ConfigError, ViewerConfig};
pub use dispatcher::RedrawDispatcher;
pub use error::SessionError;
#[cfg(feature = "config-files")]
pub use manifest_store::ManifestStore;
pub use session::{BatchSummary, Inspector, NO_DATA_TITLE, Source, View};
