#![forbid(unsafe_code)]

//! Batch comparison on a background thread.
//!
//! The worker owns a snapshot of the catalog and its own payload cache, so
//! the interactive session keeps rendering while a sweep runs. Progress
//! arrives over a channel; the outcome is only visible after
//! [`BatchJob::join`], which keeps the session's severities all-or-nothing.
//! [`BatchJob::cancel`] stops the worker at the next pair boundary.
//!
//! ```
//! use std::sync::Arc;
//! use tscope_core::catalog::Catalog;
//! use tscope_core::identifier::Identifier;
//! use tscope_core::storage::{MemoryStore, TensorStore};
//! use tscope_core::tensor::Tensor;
//! use tscope_diff::batch::BatchSpec;
//! use tscope_runtime::batch_job::BatchJob;
//!
//! let store = MemoryStore::new()
//!     .with_tensor(Identifier::new("rec1.w").unwrap(), &Tensor::scalar_f32(1.0))
//!     .with_tensor(Identifier::new("rec2.w").unwrap(), &Tensor::scalar_f32(3.0));
//! let catalog = Catalog::from_entries(store.load_metadata().unwrap()).unwrap();
//! let job = BatchJob::spawn(Arc::new(store), catalog, BatchSpec::new("rec1", "rec2"), 8);
//! let outcome = job.join().unwrap();
//! assert_eq!(outcome.results[0].error_magnitude, 4.0);
//! ```

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use tscope_core::cancellation::CancellationSource;
use tscope_core::catalog::Catalog;
use tscope_core::payload_cache::PayloadCache;
use tscope_core::storage::TensorStore;
use tscope_diff::batch::{BatchError, BatchOutcome, BatchProgress, BatchSpec, batch_compare};

use crate::error::SessionError;

/// Handle to a running background comparison.
#[derive(Debug)]
pub struct BatchJob {
    cancel: CancellationSource,
    progress: Receiver<BatchProgress>,
    latest: Option<BatchProgress>,
    handle: JoinHandle<Result<BatchOutcome, BatchError>>,
}

impl BatchJob {
    /// Start comparing `spec.token_a` entries of `catalog` with their
    /// `spec.token_b` counterparts.
    #[must_use]
    pub fn spawn<S>(store: Arc<S>, catalog: Catalog, spec: BatchSpec, cache_capacity: usize) -> Self
    where
        S: TensorStore + Send + Sync + ?Sized + 'static,
    {
        let cancel = CancellationSource::new();
        let token = cancel.token();
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut cache = PayloadCache::new(cache_capacity);
            let mut observer = |progress: &BatchProgress| {
                // The receiver may already be gone; the outcome still counts.
                let _ = tx.send(progress.clone());
            };
            batch_compare(
                &catalog,
                &spec,
                |meta| cache.fetch(&*store, meta),
                &mut observer,
                &token,
            )
        });
        Self {
            cancel,
            progress: rx,
            latest: None,
            handle,
        }
    }

    /// Ask the worker to stop before its next pair.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drain pending progress messages and return the newest one seen.
    pub fn poll_progress(&mut self) -> Option<&BatchProgress> {
        loop {
            match self.progress.try_recv() {
                Ok(progress) => self.latest = Some(progress),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.latest.as_ref()
    }

    /// Whether the worker has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and take its outcome.
    pub fn join(self) -> Result<BatchOutcome, SessionError> {
        let outcome = self.handle.join().map_err(|_| SessionError::WorkerLost)?;
        Ok(outcome?)
    }
}
