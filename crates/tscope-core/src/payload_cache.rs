#![forbid(unsafe_code)]

//! Session-owned cache of decoded tensor payloads.
//!
//! Payload fetches go through the storage collaborator and can be slow, so a
//! session keeps recently used tensors decoded in memory. Eviction follows
//! S3-FIFO: new tensors land in a small probation queue, tensors touched
//! again are promoted to the main queue, and keys evicted from probation are
//! remembered in a ghost queue so a quick re-fetch is admitted straight to
//! main. A batch comparison that sweeps the whole catalog therefore does not
//! flush the tensors the user is actively viewing.
//!
//! Entries are immutable [`Arc<Tensor>`] handles. A tensor only leaves the
//! cache through eviction, [`PayloadCache::invalidate`], or
//! [`PayloadCache::clear`]; there is no implicit staleness.
//!
//! # Usage
//!
//! ```
//! use tscope_core::catalog::TensorMetadata;
//! use tscope_core::identifier::Identifier;
//! use tscope_core::payload_cache::PayloadCache;
//! use tscope_core::storage::MemoryStore;
//! use tscope_core::tensor::Tensor;
//!
//! let id = Identifier::new("dt0.rec1.w").unwrap();
//! let tensor = Tensor::from_f32(&[2], vec![0.5, 1.5]).unwrap();
//! let store = MemoryStore::new().with_tensor(id.clone(), &tensor);
//! let meta = TensorMetadata::new(id, tensor.element_type(), vec![2]);
//!
//! let mut cache = PayloadCache::new(8);
//! let first = cache.fetch(&store, &meta).unwrap();
//! let again = cache.fetch(&store, &meta).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//! assert_eq!(store.payload_loads(), 1);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::catalog::TensorMetadata;
use crate::identifier::Identifier;
use crate::storage::{StorageError, TensorStore};
use crate::tensor::{Tensor, TensorError};

/// Promotion counter ceiling.
const MAX_FREQ: u8 = 3;

/// Failure to produce a decoded tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The storage collaborator failed.
    Storage(StorageError),
    /// The payload did not decode against its metadata.
    Decode {
        identifier: Identifier,
        source: TensorError,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{e}"),
            Self::Decode { identifier, source } => {
                write!(f, "cannot decode '{identifier}': {source}")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

impl From<StorageError> for FetchError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Load and decode one payload without caching.
pub fn fetch_tensor<S>(store: &S, meta: &TensorMetadata) -> Result<Tensor, FetchError>
where
    S: TensorStore + ?Sized,
{
    let bytes = store.load_payload(&meta.identifier)?;
    Tensor::from_le_bytes(meta.element_type, &meta.shape, &bytes).map_err(|source| {
        FetchError::Decode {
            identifier: meta.identifier.clone(),
            source,
        }
    })
}

struct Slot {
    id: Identifier,
    tensor: Arc<Tensor>,
    freq: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queue {
    Probation,
    Main,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Tensors dropped by the eviction policy (not by invalidation).
    pub evictions: u64,
    pub probation_len: usize,
    pub main_len: usize,
    pub ghost_len: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups served from memory; `0.0` before any lookup.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Identifier-keyed tensor cache with S3-FIFO eviction.
pub struct PayloadCache {
    index: AHashMap<Identifier, Queue>,
    probation: VecDeque<Slot>,
    main: VecDeque<Slot>,
    ghost: VecDeque<Identifier>,
    probation_cap: usize,
    main_cap: usize,
    stats: CacheStats,
}

impl PayloadCache {
    /// Create a cache holding at most `capacity` tensors (minimum 2).
    ///
    /// Roughly a tenth of the capacity is probation; the ghost queue has the
    /// same length as probation.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let probation_cap = (capacity / 10).max(1);
        let main_cap = capacity - probation_cap;
        Self {
            index: AHashMap::with_capacity(capacity),
            probation: VecDeque::with_capacity(probation_cap),
            main: VecDeque::with_capacity(main_cap),
            ghost: VecDeque::with_capacity(probation_cap),
            probation_cap,
            main_cap,
            stats: CacheStats {
                capacity,
                ..CacheStats::default()
            },
        }
    }

    /// Look up a decoded tensor, counting a hit or miss.
    pub fn get(&mut self, id: &Identifier) -> Option<Arc<Tensor>> {
        let Some(&queue) = self.index.get(id) else {
            self.stats.misses += 1;
            return None;
        };
        let slots = match queue {
            Queue::Probation => &mut self.probation,
            Queue::Main => &mut self.main,
        };
        let slot = slots.iter_mut().find(|s| s.id == *id)?;
        slot.freq = (slot.freq + 1).min(MAX_FREQ);
        self.stats.hits += 1;
        Some(Arc::clone(&slot.tensor))
    }

    /// Whether `id` is resident (does not touch counters).
    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.index.contains_key(id)
    }

    /// Insert or replace a decoded tensor.
    pub fn insert(&mut self, id: Identifier, tensor: Arc<Tensor>) {
        if let Some(&queue) = self.index.get(&id) {
            let slots = match queue {
                Queue::Probation => &mut self.probation,
                Queue::Main => &mut self.main,
            };
            if let Some(slot) = slots.iter_mut().find(|s| s.id == id) {
                slot.tensor = tensor;
                return;
            }
        }

        let slot = Slot {
            id: id.clone(),
            tensor,
            freq: 0,
        };
        if let Some(pos) = self.ghost.iter().position(|g| *g == id) {
            self.ghost.remove(pos);
            self.make_room_in_main();
            self.main.push_back(slot);
            self.index.insert(id, Queue::Main);
        } else {
            self.make_room_in_probation();
            self.probation.push_back(slot);
            self.index.insert(id, Queue::Probation);
        }
    }

    /// Return the cached tensor for `meta`, fetching and decoding it on miss.
    ///
    /// Failed fetches leave the cache untouched.
    pub fn fetch<S>(&mut self, store: &S, meta: &TensorMetadata) -> Result<Arc<Tensor>, FetchError>
    where
        S: TensorStore + ?Sized,
    {
        if let Some(tensor) = self.get(&meta.identifier) {
            return Ok(tensor);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "tscope.cache",
            id = %meta.identifier,
            resident = self.len(),
            "payload cache miss"
        );
        let tensor = Arc::new(fetch_tensor(store, meta)?);
        self.insert(meta.identifier.clone(), Arc::clone(&tensor));
        Ok(tensor)
    }

    /// Drop `id` so the next fetch goes back to storage.
    pub fn invalidate(&mut self, id: &Identifier) -> bool {
        let Some(queue) = self.index.remove(id) else {
            self.ghost.retain(|g| g != id);
            return false;
        };
        let slots = match queue {
            Queue::Probation => &mut self.probation,
            Queue::Main => &mut self.main,
        };
        slots.retain(|s| s.id != *id);
        true
    }

    /// Drop every entry and reset counters.
    pub fn clear(&mut self) {
        self.index.clear();
        self.probation.clear();
        self.main.clear();
        self.ghost.clear();
        self.stats = CacheStats {
            capacity: self.stats.capacity,
            ..CacheStats::default()
        };
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probation.len() + self.main.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.stats.capacity
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            probation_len: self.probation.len(),
            main_len: self.main.len(),
            ghost_len: self.ghost.len(),
            ..self.stats
        }
    }

    fn make_room_in_probation(&mut self) {
        while self.probation.len() >= self.probation_cap {
            let Some(slot) = self.probation.pop_front() else {
                break;
            };
            if slot.freq > 0 {
                self.make_room_in_main();
                self.index.insert(slot.id.clone(), Queue::Main);
                self.main.push_back(Slot { freq: 0, ..slot });
            } else {
                self.index.remove(&slot.id);
                self.stats.evictions += 1;
                if self.ghost.len() >= self.probation_cap {
                    self.ghost.pop_front();
                }
                self.ghost.push_back(slot.id);
            }
        }
    }

    fn make_room_in_main(&mut self) {
        while self.main.len() >= self.main_cap {
            let Some(mut slot) = self.main.pop_front() else {
                break;
            };
            if slot.freq > 0 {
                slot.freq -= 1;
                self.main.push_back(slot);
            } else {
                self.index.remove(&slot.id);
                self.stats.evictions += 1;
            }
        }
    }
}

impl fmt::Debug for PayloadCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadCache")
            .field("probation", &self.probation.len())
            .field("main", &self.main.len())
            .field("ghost", &self.ghost.len())
            .field("hits", &self.stats.hits)
            .field("misses", &self.stats.misses)
            .finish()
    }
}
