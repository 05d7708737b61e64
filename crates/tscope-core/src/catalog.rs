#![forbid(unsafe_code)]

//! Tensor metadata catalog.
//!
//! The [`Catalog`] is the session's view of what the storage collaborator
//! holds: identifier, element type, and shape for every tensor, without the
//! payloads. Shapes are known up front, so cross-record comparisons can
//! reject incompatible pairs before fetching any bytes.

use ahash::AHashMap;

use crate::identifier::Identifier;
use crate::storage::StorageError;
use crate::tensor::ElementType;

/// Metadata for one stored tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TensorMetadata {
    pub identifier: Identifier,
    pub element_type: ElementType,
    pub shape: Vec<usize>,
}

impl TensorMetadata {
    #[must_use]
    pub fn new(identifier: Identifier, element_type: ElementType, shape: Vec<usize>) -> Self {
        Self {
            identifier,
            element_type,
            shape,
        }
    }

    /// Element count implied by the shape (saturating).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
    }
}

/// Identifier-indexed set of [`TensorMetadata`], sorted by identifier.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<TensorMetadata>,
    index: AHashMap<Identifier, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate identifiers.
    pub fn from_entries(mut entries: Vec<TensorMetadata>) -> Result<Self, StorageError> {
        entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        let mut index = AHashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.identifier.clone(), i).is_some() {
                return Err(StorageError::InvalidMetadata {
                    detail: format!("duplicate identifier '{}'", entry.identifier),
                });
            }
        }
        Ok(Self { entries, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &Identifier) -> Option<&TensorMetadata> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TensorMetadata> + '_ {
        self.entries.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> + '_ {
        self.entries.iter().map(|e| &e.identifier)
    }

    /// Entries that differ from `id` only at segments equal to `token`.
    ///
    /// With `token` being a record token this lists the same tensor as
    /// captured by every other record.
    #[must_use]
    pub fn counterparts(&self, id: &Identifier, token: &str) -> Vec<&TensorMetadata> {
        let reference: Vec<&str> = id.segments().collect();
        if !reference.contains(&token) {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.identifier != *id)
            .filter(|entry| {
                let mut segments = entry.identifier.segments();
                for &want in &reference {
                    match segments.next() {
                        Some(got) if got == want || want == token => {}
                        _ => return false,
                    }
                }
                segments.next().is_none()
            })
            .collect()
    }
}
