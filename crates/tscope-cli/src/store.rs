use std::path::PathBuf;

use clap::Args;
use tscope::{Identifier, Inspector, ManifestStore, ViewerConfig};

use crate::error::{CliError, Result};

/// Where the tensors live and how to view them.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Store directory containing `manifest.json`.
    #[arg(long, env = "TSCOPE_STORE")]
    pub store: PathBuf,

    /// Viewer configuration (`.toml` or `.json`).
    #[arg(long, env = "TSCOPE_CONFIG")]
    pub config: Option<PathBuf>,
}

impl StoreArgs {
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        match &self.config {
            Some(path) => Ok(ViewerConfig::load(path)?),
            None => Ok(ViewerConfig::default()),
        }
    }

    /// Open the store with the configured viewer settings and load its
    /// catalog.
    pub fn open(&self) -> Result<Inspector<ManifestStore>> {
        self.open_with(self.viewer_config()?)
    }

    pub fn open_with(&self, config: ViewerConfig) -> Result<Inspector<ManifestStore>> {
        let store = ManifestStore::open(&self.store)?;
        let mut inspector = Inspector::new(store, config);
        let tensors = inspector.load_catalog()?;
        tracing::debug!(
            target: "tscope.cli",
            store = %self.store.display(),
            tensors,
            "store opened"
        );
        Ok(inspector)
    }
}

pub fn parse_identifier(raw: &str) -> Result<Identifier> {
    Ok(Identifier::new(raw)?)
}

/// Parse `A,B` into two values.
pub fn parse_pair<T: std::str::FromStr>(raw: &str, what: &str) -> Result<(T, T)> {
    let err = || CliError::invalid(format!("{what} must look like A,B (got '{raw}')"));
    let (a, b) = raw.split_once(',').ok_or_else(err)?;
    let a = a.trim().parse().map_err(|_| err())?;
    let b = b.trim().parse().map_err(|_| err())?;
    Ok((a, b))
}

/// Parse `AXIS=INDEX`.
pub fn parse_fixed(raw: &str) -> Result<(usize, usize)> {
    let err = || CliError::invalid(format!("--fix must look like AXIS=INDEX (got '{raw}')"));
    let (axis, index) = raw.split_once('=').ok_or_else(err)?;
    let axis = axis.trim().parse().map_err(|_| err())?;
    let index = index.trim().parse().map_err(|_| err())?;
    Ok((axis, index))
}
