#![forbid(unsafe_code)]

//! `tscope` command-line interface over manifest stores.

pub mod catalog;
pub mod cli;
pub mod compare;
pub mod error;
pub mod heatmap;
pub mod logging;
pub mod seed;
pub mod store;
pub mod view;

pub use cli::run_from_env;
pub use error::{CliError, Result};
