#![forbid(unsafe_code)]

//! Directory-backed tensor store.
//!
//! A store directory holds raw little-endian payload files and a
//! `manifest.json` describing them:
//!
//! ```json
//! {
//!   "tensors": [
//!     { "id": "dt0.rec1.convA", "dtype": "float32", "shape": [1, 3, 32, 32],
//!       "file": "dt0.rec1.convA.bin" }
//!   ]
//! }
//! ```
//!
//! `file` is relative to the directory and may not leave it. The manifest is
//! re-read on every [`load_metadata`](TensorStore::load_metadata), so a
//! catalog reload picks up new captures.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tscope_core::catalog::TensorMetadata;
use tscope_core::identifier::Identifier;
use tscope_core::storage::{StorageError, TensorStore};
use tscope_core::tensor::{ElementType, Tensor};

/// Name of the index file inside a store directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ManifestEntry {
    id: Identifier,
    dtype: ElementType,
    shape: Vec<usize>,
    file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Manifest {
    tensors: Vec<ManifestEntry>,
}

fn io_error(path: &Path, e: &io::Error) -> StorageError {
    StorageError::unavailable(format_args!("{}: {e}", path.display()))
}

fn check_relative(file: &str) -> Result<(), StorageError> {
    let path = Path::new(file);
    let inside = !file.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if inside {
        Ok(())
    } else {
        Err(StorageError::InvalidMetadata {
            detail: format!("payload path '{file}' must stay inside the store directory"),
        })
    }
}

/// [`TensorStore`] over a manifest directory.
#[derive(Debug)]
pub struct ManifestStore {
    root: PathBuf,
    files: Mutex<AHashMap<Identifier, PathBuf>>,
}

impl ManifestStore {
    /// Open an existing directory. The manifest is read lazily.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StorageError::unavailable(format_args!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            files: Mutex::new(AHashMap::new()),
        })
    }

    /// Write `tensors` and a manifest into `root` (created if missing),
    /// replacing any previous manifest.
    pub fn create<'a, I>(root: impl Into<PathBuf>, tensors: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = (Identifier, &'a Tensor)>,
    {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, &e))?;
        let mut manifest = Manifest::default();
        for (id, tensor) in tensors {
            let file = format!("{id}.bin");
            let path = root.join(&file);
            fs::write(&path, tensor.to_le_bytes()).map_err(|e| io_error(&path, &e))?;
            manifest.tensors.push(ManifestEntry {
                id,
                dtype: tensor.element_type(),
                shape: tensor.shape().to_vec(),
                file,
            });
        }
        let path = root.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(&manifest).map_err(StorageError::unavailable)?;
        fs::write(&path, json).map_err(|e| io_error(&path, &e))?;
        tracing::debug!(
            target: "tscope.storage",
            root = %root.display(),
            tensors = manifest.tensors.len(),
            "manifest written"
        );
        Self::open(root)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_manifest(&self) -> Result<Manifest, StorageError> {
        let path = self.root.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| io_error(&path, &e))?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| StorageError::InvalidMetadata {
                detail: format!("{}: {e}", path.display()),
            })?;
        let mut files = AHashMap::with_capacity(manifest.tensors.len());
        for entry in &manifest.tensors {
            check_relative(&entry.file)?;
            files.insert(entry.id.clone(), self.root.join(&entry.file));
        }
        *self.files.lock().unwrap_or_else(|e| e.into_inner()) = files;
        Ok(manifest)
    }

    fn payload_path(&self, id: &Identifier) -> Result<PathBuf, StorageError> {
        let cached = self
            .files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned();
        if let Some(path) = cached {
            return Ok(path);
        }
        self.read_manifest()?;
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                identifier: id.clone(),
            })
    }
}

impl TensorStore for ManifestStore {
    fn load_metadata(&self) -> Result<Vec<TensorMetadata>, StorageError> {
        let manifest = self.read_manifest()?;
        Ok(manifest
            .tensors
            .into_iter()
            .map(|e| TensorMetadata::new(e.id, e.dtype, e.shape))
            .collect())
    }

    fn load_payload(&self, id: &Identifier) -> Result<Vec<u8>, StorageError> {
        let path = self.payload_path(id)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound {
                identifier: id.clone(),
            },
            _ => io_error(&path, &e),
        })
    }
}
