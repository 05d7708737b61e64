#![forbid(unsafe_code)]

//! Cross-record batch comparison.
//!
//! Given two record tokens, every catalog entry containing the first token
//! is paired with the entry obtained by substituting the second token. Pairs
//! with matching shapes are fetched and scored by mean squared error; scores
//! at or below `epsilon` are dropped as noise.
//!
//! Per-pair problems (shape mismatch, fetch failure, non-finite score) are
//! collected as [`PairFailure`]s and never abort the batch. Cancellation is
//! checked between pairs; a cancelled batch yields no results at all.

use std::fmt;
use std::sync::Arc;

use tscope_core::cancellation::CancellationToken;
use tscope_core::catalog::{Catalog, TensorMetadata};
use tscope_core::identifier::Identifier;
use tscope_core::payload_cache::FetchError;
use tscope_core::tensor::Tensor;
use web_time::Instant;

use crate::diff::{DiffError, mean_squared_error};

/// Default significance threshold.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// One significant difference between two records.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    pub left: Identifier,
    pub right: Identifier,
    /// Mean squared error; finite and `> epsilon`.
    pub error_magnitude: f64,
}

/// What to compare.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSpec {
    pub token_a: String,
    pub token_b: String,
    pub epsilon: f64,
}

impl BatchSpec {
    #[must_use]
    pub fn new(token_a: impl Into<String>, token_b: impl Into<String>) -> Self {
        Self {
            token_a: token_a.into(),
            token_b: token_b.into(),
            epsilon: DEFAULT_EPSILON,
        }
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// Why a single pair was not scored.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    ShapeMismatch {
        left: Vec<usize>,
        right: Vec<usize>,
    },
    Fetch(FetchError),
    /// One side has NaN where the other does not, or the score overflowed.
    NonFinite { mse: f64 },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { left, right } => {
                write!(f, "shape mismatch {left:?} vs {right:?}")
            }
            Self::Fetch(e) => write!(f, "{e}"),
            Self::NonFinite { mse } => write!(f, "non-finite error magnitude {mse}"),
        }
    }
}

/// A pair that could not be scored.
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub left: Identifier,
    pub right: Identifier,
    pub kind: FailureKind,
}

impl PairFailure {
    /// Short label for logs.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            FailureKind::ShapeMismatch { .. } => "shape_mismatch",
            FailureKind::Fetch(_) => "fetch",
            FailureKind::NonFinite { .. } => "non_finite",
        }
    }
}

/// Result of a completed batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Pairs with `mse > epsilon`, in catalog order.
    pub results: Vec<DiffResult>,
    /// Pairs for which an MSE was computed.
    pub compared: usize,
    /// `results.len()`.
    pub significant: usize,
    /// Entries with token A whose counterpart does not exist.
    pub unmatched: usize,
    pub failures: Vec<PairFailure>,
}

/// Progress after one candidate has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub done: usize,
    pub total: usize,
    pub current: Identifier,
}

/// Receives progress notifications.
pub trait BatchObserver {
    fn on_progress(&mut self, progress: &BatchProgress);
}

impl<F: FnMut(&BatchProgress)> BatchObserver for F {
    fn on_progress(&mut self, progress: &BatchProgress) {
        self(progress);
    }
}

/// Observer that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl BatchObserver for NoProgress {
    fn on_progress(&mut self, _progress: &BatchProgress) {}
}

/// Batch-level failures.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchError {
    /// Stopped by the cancellation token before finishing.
    Cancelled { done: usize, total: usize },
    /// `epsilon` must be a non-negative number.
    InvalidEpsilon { epsilon: f64 },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled { done, total } => {
                write!(f, "batch comparison cancelled after {done} of {total} pairs")
            }
            Self::InvalidEpsilon { epsilon } => {
                write!(f, "epsilon must be a non-negative number, got {epsilon}")
            }
        }
    }
}

impl std::error::Error for BatchError {}

/// Compare every `token_a` tensor with its `token_b` counterpart.
///
/// `fetch` resolves metadata to a decoded tensor (usually through a payload
/// cache).
pub fn batch_compare<F, O>(
    catalog: &Catalog,
    spec: &BatchSpec,
    mut fetch: F,
    observer: &mut O,
    cancel: &CancellationToken,
) -> Result<BatchOutcome, BatchError>
where
    F: FnMut(&TensorMetadata) -> Result<Arc<Tensor>, FetchError>,
    O: BatchObserver + ?Sized,
{
    if spec.epsilon.is_nan() || spec.epsilon < 0.0 {
        return Err(BatchError::InvalidEpsilon {
            epsilon: spec.epsilon,
        });
    }

    let candidates: Vec<&TensorMetadata> = catalog
        .iter()
        .filter(|m| m.identifier.contains_segment(&spec.token_a))
        .collect();
    let total = candidates.len();

    let _span = tracing::debug_span!(
        "tscope.batch",
        token_a = %spec.token_a,
        token_b = %spec.token_b,
        epsilon = spec.epsilon,
        total,
    )
    .entered();
    let start = Instant::now();

    let mut outcome = BatchOutcome::default();
    for (i, left) in candidates.into_iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(target: "tscope.batch", done = i, total, "batch comparison cancelled");
            return Err(BatchError::Cancelled { done: i, total });
        }

        let right = left
            .identifier
            .replace_segment(&spec.token_a, &spec.token_b)
            .and_then(|id| catalog.get(&id));
        match right {
            None => outcome.unmatched += 1,
            Some(right) => match compare_pair(left, right, &mut fetch) {
                Ok(mse) if !mse.is_finite() => {
                    outcome.compared += 1;
                    record_failure(&mut outcome, left, right, FailureKind::NonFinite { mse });
                }
                Ok(mse) => {
                    outcome.compared += 1;
                    if mse > spec.epsilon {
                        outcome.results.push(DiffResult {
                            left: left.identifier.clone(),
                            right: right.identifier.clone(),
                            error_magnitude: mse,
                        });
                    }
                }
                Err(kind) => record_failure(&mut outcome, left, right, kind),
            },
        }

        observer.on_progress(&BatchProgress {
            done: i + 1,
            total,
            current: left.identifier.clone(),
        });
    }
    outcome.significant = outcome.results.len();

    tracing::info!(
        target: "tscope.batch",
        compared = outcome.compared,
        significant = outcome.significant,
        unmatched = outcome.unmatched,
        failures = outcome.failures.len(),
        duration_us = start.elapsed().as_micros() as u64,
        "batch comparison complete"
    );
    Ok(outcome)
}

fn compare_pair<F>(
    left: &TensorMetadata,
    right: &TensorMetadata,
    fetch: &mut F,
) -> Result<f64, FailureKind>
where
    F: FnMut(&TensorMetadata) -> Result<Arc<Tensor>, FetchError>,
{
    let mismatch = |l: &[usize], r: &[usize]| FailureKind::ShapeMismatch {
        left: l.to_vec(),
        right: r.to_vec(),
    };
    if left.shape != right.shape {
        return Err(mismatch(&left.shape, &right.shape));
    }
    let a = fetch(left).map_err(FailureKind::Fetch)?;
    let b = fetch(right).map_err(FailureKind::Fetch)?;
    mean_squared_error(&a, &b).map_err(|e| match e {
        DiffError::ShapeMismatch { left, right } => mismatch(&left, &right),
        DiffError::Invalid(_) => mismatch(a.shape(), b.shape()),
    })
}

fn record_failure(
    outcome: &mut BatchOutcome,
    left: &TensorMetadata,
    right: &TensorMetadata,
    kind: FailureKind,
) {
    let failure = PairFailure {
        left: left.identifier.clone(),
        right: right.identifier.clone(),
        kind,
    };
    tracing::warn!(
        target: "tscope.batch",
        left = %failure.left,
        right = %failure.right,
        error_type = failure.kind_label(),
        detail = %failure.kind,
        "pair skipped"
    );
    outcome.failures.push(failure);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tscope_core::cancellation::CancellationSource;
    use tscope_core::payload_cache::fetch_tensor;
    use tscope_core::storage::{MemoryStore, StorageError, TensorStore};

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    fn constant(shape: &[usize], v: f32) -> Tensor {
        let n = shape.iter().product();
        Tensor::from_f32(shape, vec![v; n]).unwrap()
    }

    fn setup(entries: &[(&str, Tensor)]) -> (MemoryStore, Catalog) {
        let mut store = MemoryStore::new();
        for (raw, t) in entries {
            store.insert_tensor(id(raw), t);
        }
        let catalog = Catalog::from_entries(store.load_metadata().unwrap()).unwrap();
        (store, catalog)
    }

    fn run(
        store: &MemoryStore,
        catalog: &Catalog,
        spec: &BatchSpec,
    ) -> Result<BatchOutcome, BatchError> {
        batch_compare(
            catalog,
            spec,
            |m| fetch_tensor(store, m).map(Arc::new),
            &mut NoProgress,
            &CancellationToken::never(),
        )
    }

    #[test]
    fn constant_offset_scores_one_result() {
        let (store, catalog) = setup(&[
            ("dt0.rec1.convA.dims4", constant(&[1, 3, 32, 32], 0.25)),
            ("dt0.rec2.convA.dims4", constant(&[1, 3, 32, 32], 0.26)),
        ]);
        let out = run(&store, &catalog, &BatchSpec::new("rec1", "rec2")).unwrap();
        assert_eq!(out.compared, 1);
        assert_eq!(out.significant, 1);
        assert_eq!(out.results[0].left, id("dt0.rec1.convA.dims4"));
        assert_eq!(out.results[0].right, id("dt0.rec2.convA.dims4"));
        assert!((out.results[0].error_magnitude - 1e-4).abs() < 1e-8);
    }

    #[test]
    fn identical_pairs_are_below_epsilon() {
        let (store, catalog) = setup(&[
            ("r.rec1.a", constant(&[4], 1.0)),
            ("r.rec2.a", constant(&[4], 1.0)),
        ]);
        let out = run(&store, &catalog, &BatchSpec::new("rec1", "rec2")).unwrap();
        assert_eq!(out.compared, 1);
        assert!(out.results.is_empty());
    }

    #[test]
    fn unmatched_and_mismatched_are_counted() {
        let (store, catalog) = setup(&[
            ("rec1.a", constant(&[4], 1.0)),
            ("rec2.a", constant(&[2, 2], 1.0)),
            ("rec1.lonely", constant(&[1], 0.0)),
        ]);
        let out = run(&store, &catalog, &BatchSpec::new("rec1", "rec2")).unwrap();
        assert_eq!(out.compared, 0);
        assert_eq!(out.unmatched, 1);
        assert_eq!(out.failures.len(), 1);
        assert!(matches!(out.failures[0].kind, FailureKind::ShapeMismatch { .. }));
    }

    #[test]
    fn fetch_failures_do_not_abort() {
        let (store, catalog) = setup(&[
            ("rec1.a", constant(&[2], 1.0)),
            ("rec2.a", constant(&[2], 2.0)),
            ("rec1.b", constant(&[2], 1.0)),
            ("rec2.b", constant(&[2], 3.0)),
        ]);
        let broken = id("rec2.a");
        let out = batch_compare(
            &catalog,
            &BatchSpec::new("rec1", "rec2"),
            |m| {
                if m.identifier == broken {
                    Err(FetchError::Storage(StorageError::unavailable("disk gone")))
                } else {
                    fetch_tensor(&store, m).map(Arc::new)
                }
            },
            &mut NoProgress,
            &CancellationToken::never(),
        )
        .unwrap();
        assert_eq!(out.compared, 1);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].error_magnitude, 4.0);
        assert_eq!(out.failures[0].kind_label(), "fetch");
    }

    #[test]
    fn one_sided_nan_is_a_failure() {
        let (store, catalog) = setup(&[
            ("rec1.a", Tensor::from_f32(&[2], vec![f32::NAN, 1.0]).unwrap()),
            ("rec2.a", constant(&[2], 1.0)),
        ]);
        let out = run(&store, &catalog, &BatchSpec::new("rec1", "rec2")).unwrap();
        assert_eq!(out.compared, 1);
        assert!(out.results.is_empty());
        assert_eq!(out.failures[0].kind_label(), "non_finite");
    }

    #[test]
    fn progress_reports_every_candidate() {
        let (store, catalog) = setup(&[
            ("rec1.a", constant(&[1], 1.0)),
            ("rec1.b", constant(&[1], 1.0)),
            ("rec2.a", constant(&[1], 2.0)),
        ]);
        let mut seen = Vec::new();
        let mut observer = |p: &BatchProgress| seen.push((p.done, p.total));
        batch_compare(
            &catalog,
            &BatchSpec::new("rec1", "rec2"),
            |m| fetch_tensor(&store, m).map(Arc::new),
            &mut observer,
            &CancellationToken::never(),
        )
        .unwrap();
        assert_eq!(seen, [(1, 2), (2, 2)]);
    }

    #[test]
    fn cancellation_between_pairs() {
        let (store, catalog) = setup(&[
            ("rec1.a", constant(&[1], 1.0)),
            ("rec1.b", constant(&[1], 1.0)),
            ("rec2.a", constant(&[1], 2.0)),
            ("rec2.b", constant(&[1], 2.0)),
        ]);
        let source = CancellationSource::new();
        let token = source.token();
        let mut observer = |_: &BatchProgress| source.cancel();
        let err = batch_compare(
            &catalog,
            &BatchSpec::new("rec1", "rec2"),
            |m| fetch_tensor(&store, m).map(Arc::new),
            &mut observer,
            &token,
        )
        .unwrap_err();
        assert_eq!(err, BatchError::Cancelled { done: 1, total: 2 });
    }

    #[test]
    fn invalid_epsilon_rejected() {
        let (store, catalog) = setup(&[]);
        for eps in [-1.0, f64::NAN] {
            let spec = BatchSpec::new("a", "b").with_epsilon(eps);
            assert!(matches!(
                run(&store, &catalog, &spec),
                Err(BatchError::InvalidEpsilon { .. })
            ));
        }
    }
}
