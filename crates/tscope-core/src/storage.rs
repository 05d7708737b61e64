#![forbid(unsafe_code)]

//! Storage collaborator boundary.
//!
//! tensorscope never owns an on-disk format. It reads through the
//! [`TensorStore`] trait: one call for the metadata listing, one call per
//! payload. Failures are surfaced to the caller unchanged; nothing here
//! retries.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;

use crate::catalog::TensorMetadata;
use crate::identifier::Identifier;
use crate::tensor::Tensor;

/// Storage collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store could not be reached or read.
    Unavailable { detail: String },
    /// A payload was requested for an identifier the store does not hold.
    NotFound { identifier: Identifier },
    /// The metadata listing violates the storage contract.
    InvalidMetadata { detail: String },
}

impl StorageError {
    /// Convenience constructor for I/O-style failures.
    pub fn unavailable(detail: impl fmt::Display) -> Self {
        Self::Unavailable {
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { detail } => write!(f, "storage unavailable: {detail}"),
            Self::NotFound { identifier } => write!(f, "no payload stored for '{identifier}'"),
            Self::InvalidMetadata { detail } => write!(f, "invalid tensor metadata: {detail}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Read access to stored tensors.
pub trait TensorStore {
    /// List every stored tensor without payloads.
    fn load_metadata(&self) -> Result<Vec<TensorMetadata>, StorageError>;

    /// Fetch the raw little-endian payload of one tensor.
    fn load_payload(&self, id: &Identifier) -> Result<Vec<u8>, StorageError>;
}

impl<S: TensorStore + ?Sized> TensorStore for &S {
    fn load_metadata(&self) -> Result<Vec<TensorMetadata>, StorageError> {
        (**self).load_metadata()
    }

    fn load_payload(&self, id: &Identifier) -> Result<Vec<u8>, StorageError> {
        (**self).load_payload(id)
    }
}

impl<S: TensorStore + ?Sized> TensorStore for Arc<S> {
    fn load_metadata(&self) -> Result<Vec<TensorMetadata>, StorageError> {
        (**self).load_metadata()
    }

    fn load_payload(&self, id: &Identifier) -> Result<Vec<u8>, StorageError> {
        (**self).load_payload(id)
    }
}

impl<S: TensorStore + ?Sized> TensorStore for Box<S> {
    fn load_metadata(&self) -> Result<Vec<TensorMetadata>, StorageError> {
        (**self).load_metadata()
    }

    fn load_payload(&self, id: &Identifier) -> Result<Vec<u8>, StorageError> {
        (**self).load_payload(id)
    }
}

/// In-process store, mainly for tests and demos.
///
/// Can be switched offline to exercise `Unavailable` paths, and counts
/// payload loads so cache behavior is observable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<TensorMetadata>,
    payloads: AHashMap<Identifier, Vec<u8>>,
    offline: bool,
    payload_loads: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under the given metadata, replacing any previous entry.
    pub fn insert(&mut self, meta: TensorMetadata, payload: Vec<u8>) {
        self.entries.retain(|e| e.identifier != meta.identifier);
        self.payloads.insert(meta.identifier.clone(), payload);
        self.entries.push(meta);
    }

    /// Store an already decoded tensor.
    pub fn insert_tensor(&mut self, id: Identifier, tensor: &Tensor) {
        let meta = TensorMetadata::new(id, tensor.element_type(), tensor.shape().to_vec());
        self.insert(meta, tensor.to_le_bytes());
    }

    /// Builder-style [`insert_tensor`](Self::insert_tensor).
    #[must_use]
    pub fn with_tensor(mut self, id: Identifier, tensor: &Tensor) -> Self {
        self.insert_tensor(id, tensor);
        self
    }

    /// Simulate the backing store going away (or coming back).
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Number of successful payload loads served so far.
    #[must_use]
    pub fn payload_loads(&self) -> usize {
        self.payload_loads.load(Ordering::Relaxed)
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.offline {
            Err(StorageError::unavailable("memory store is offline"))
        } else {
            Ok(())
        }
    }
}

impl TensorStore for MemoryStore {
    fn load_metadata(&self) -> Result<Vec<TensorMetadata>, StorageError> {
        self.check_online()?;
        Ok(self.entries.clone())
    }

    fn load_payload(&self, id: &Identifier) -> Result<Vec<u8>, StorageError> {
        self.check_online()?;
        let payload = self
            .payloads
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                identifier: id.clone(),
            })?;
        self.payload_loads.fetch_add(1, Ordering::Relaxed);
        Ok(payload)
    }
}
