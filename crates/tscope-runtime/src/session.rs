#![forbid(unsafe_code)]

//! Interactive inspection session.
//!
//! An [`Inspector`] is what a UI talks to. It owns the catalog, the payload
//! cache, the displayed tensor with its projection and viewport, and the
//! severity tree from the last batch comparison. Every mutating call either
//! succeeds and requests a redraw, or fails and leaves the session exactly
//! as it was.
//!
//! Drawing is pull-based: the UI polls [`Inspector::take_redraw`] once per
//! tick and, when it returns `true`, paints [`Inspector::render`].
//!
//! # Usage
//!
//! ```
//! use tscope_core::identifier::Identifier;
//! use tscope_core::storage::MemoryStore;
//! use tscope_core::tensor::Tensor;
//! use tscope_runtime::config::ViewerConfig;
//! use tscope_runtime::session::{Inspector, View};
//!
//! let id = Identifier::new("dt0.rec1.conv").unwrap();
//! let store = MemoryStore::new()
//!     .with_tensor(id.clone(), &Tensor::from_f32(&[2, 3], vec![0.0; 6]).unwrap());
//! let mut inspector = Inspector::new(store, ViewerConfig::default());
//! inspector.load_catalog().unwrap();
//! inspector.show_tensor(&id).unwrap();
//! match inspector.render() {
//!     View::Image { grid, .. } => assert_eq!(grid.dim(), (2, 3)),
//!     View::NoData { .. } => unreachable!(),
//! }
//! ```

use std::sync::Arc;

use tscope_core::cancellation::CancellationToken;
use tscope_core::catalog::{Catalog, TensorMetadata};
use tscope_core::identifier::Identifier;
use tscope_core::payload_cache::{CacheStats, PayloadCache};
use tscope_core::storage::TensorStore;
use tscope_core::tensor::Tensor;
use tscope_core::view_event::{ViewEvent, ViewEventCoalescer};
use tscope_diff::batch::{BatchOutcome, BatchSpec, DiffResult, NoProgress, batch_compare};
use tscope_diff::diff::{DiffError, pointwise_diff};
use tscope_diff::namespace::NamespaceTree;
use tscope_render::lod::{self, Extent, Grid, ValueRange};
use tscope_render::projection::{AxisProjector, SliceView};
use tscope_render::viewport::{SurfaceSize, Viewport};
use tscope_style::{Rgb, SeverityScale};

use crate::batch_job::BatchJob;
use crate::config::ViewerConfig;
use crate::dispatcher::RedrawDispatcher;
use crate::error::SessionError;

/// Title shown when nothing is displayed.
pub const NO_DATA_TITLE: &str = "No Tensor Data";

/// Where the displayed tensor came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Handed in directly through [`Inspector::set_tensor`].
    Loose,
    /// A catalog entry.
    Stored(Identifier),
    /// `|left - right|` of two catalog entries.
    Difference { left: Identifier, right: Identifier },
}

/// One paintable frame.
#[derive(Debug, Clone)]
pub enum View<'a> {
    NoData {
        title: String,
    },
    Image {
        grid: Grid<'a>,
        extent: Extent,
        title: String,
        pool_size: usize,
        value_range: ValueRange,
    },
}

impl View<'_> {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::NoData { title } | Self::Image { title, .. } => title,
        }
    }
}

/// Counts reported after a batch comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub compared: usize,
    pub significant: usize,
    pub unmatched: usize,
    pub failures: usize,
}

impl From<&BatchOutcome> for BatchSummary {
    fn from(outcome: &BatchOutcome) -> Self {
        Self {
            compared: outcome.compared,
            significant: outcome.significant,
            unmatched: outcome.unmatched,
            failures: outcome.failures.len(),
        }
    }
}

#[derive(Debug, Clone)]
struct Displayed {
    tensor: Arc<Tensor>,
    source: Source,
    projector: AxisProjector,
    viewport: Viewport,
}

impl Displayed {
    fn slice(&self) -> Option<SliceView<'_>> {
        self.projector.project_tensor(&self.tensor).ok()
    }
}

/// UI-facing session state.
pub struct Inspector<S: ?Sized> {
    config: ViewerConfig,
    scale: SeverityScale,
    catalog: Catalog,
    cache: PayloadCache,
    tree: NamespaceTree,
    results: Vec<DiffResult>,
    displayed: Option<Displayed>,
    surface: SurfaceSize,
    redraw: RedrawDispatcher,
    events: ViewEventCoalescer,
    store: Arc<S>,
}

impl<S: TensorStore> Inspector<S> {
    /// Session over `store`. The catalog stays empty until
    /// [`load_catalog`](Self::load_catalog).
    #[must_use]
    pub fn new(store: S, config: ViewerConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }
}

impl<S: TensorStore + ?Sized> Inspector<S> {
    /// Session over a store shared with other owners (e.g. batch jobs).
    #[must_use]
    pub fn with_shared_store(store: Arc<S>, config: ViewerConfig) -> Self {
        Self {
            scale: config.severity_scale(),
            cache: PayloadCache::new(config.cache.capacity),
            surface: config.surface_size(),
            config,
            catalog: Catalog::default(),
            tree: NamespaceTree::new(),
            results: Vec::new(),
            displayed: None,
            redraw: RedrawDispatcher::new(),
            events: ViewEventCoalescer::new(),
            store,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    #[must_use]
    pub fn scale(&self) -> &SeverityScale {
        &self.scale
    }

    /// Significant differences from the last applied batch.
    #[must_use]
    pub fn results(&self) -> &[DiffResult] {
        &self.results
    }

    #[must_use]
    pub fn tensor(&self) -> Option<&Arc<Tensor>> {
        self.displayed.as_ref().map(|d| &d.tensor)
    }

    #[must_use]
    pub fn source(&self) -> Option<&Source> {
        self.displayed.as_ref().map(|d| &d.source)
    }

    #[must_use]
    pub fn projector(&self) -> Option<&AxisProjector> {
        self.displayed.as_ref().map(|d| &d.projector)
    }

    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.displayed.as_ref().map(|d| d.viewport)
    }

    #[must_use]
    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    #[must_use]
    pub fn redraw(&self) -> &RedrawDispatcher {
        &self.redraw
    }

    /// Consume the pending redraw request, if any.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take()
    }

    // ── Catalog ──────────────────────────────────────────────────────────

    /// (Re)read metadata from the store.
    ///
    /// On success the payload cache is emptied, the severity tree is rebuilt
    /// without severities, and the display is cleared. Returns the number of
    /// tensors.
    pub fn load_catalog(&mut self) -> Result<usize, SessionError> {
        let _span = tracing::debug_span!("tscope.catalog").entered();
        let loaded = self
            .store
            .load_metadata()
            .and_then(Catalog::from_entries)
            .map_err(SessionError::from);
        let catalog = logged("load_catalog", loaded)?;

        self.cache.clear();
        self.tree = NamespaceTree::build(catalog.identifiers());
        self.results.clear();
        self.displayed = None;
        self.catalog = catalog;
        self.redraw.request();
        tracing::info!(
            target: "tscope.catalog",
            tensors = self.catalog.len(),
            "catalog loaded"
        );
        Ok(self.catalog.len())
    }

    /// Entries that differ from `id` only where `id` has `token`.
    #[must_use]
    pub fn counterparts(&self, id: &Identifier, token: &str) -> Vec<&TensorMetadata> {
        self.catalog.counterparts(id, token)
    }

    fn metadata(&self, id: &Identifier) -> Result<&TensorMetadata, SessionError> {
        self.catalog
            .get(id)
            .ok_or_else(|| SessionError::UnknownIdentifier {
                identifier: id.clone(),
            })
    }

    fn fetch(&mut self, id: &Identifier) -> Result<Arc<Tensor>, SessionError> {
        let meta = self.metadata(id)?.clone();
        Ok(self.cache.fetch(&*self.store, &meta)?)
    }

    // ── Display ──────────────────────────────────────────────────────────

    fn fit(&self, projector: &AxisProjector) -> Result<Viewport, SessionError> {
        let (h, w) = projector.slice_dim();
        Ok(Viewport::fit(h, w, self.surface.aspect())?)
    }

    fn install(&mut self, tensor: Arc<Tensor>, source: Source) -> Result<(), SessionError> {
        let projector = AxisProjector::new(tensor.shape());
        let viewport = self.fit(&projector)?;
        tracing::debug!(
            target: "tscope.session",
            shape = ?tensor.shape(),
            source = ?source,
            "tensor displayed"
        );
        self.displayed = Some(Displayed {
            tensor,
            source,
            projector,
            viewport,
        });
        self.redraw.request();
        Ok(())
    }

    /// Display `tensor`, or the explicit "no data" state for `None`.
    ///
    /// Projection and viewport are reset to their defaults.
    pub fn set_tensor(&mut self, tensor: Option<Arc<Tensor>>) -> Result<(), SessionError> {
        match tensor {
            Some(tensor) => logged("set_tensor", self.install(tensor, Source::Loose)),
            None => {
                self.displayed = None;
                self.redraw.request();
                Ok(())
            }
        }
    }

    /// Fetch and display a catalog entry.
    pub fn show_tensor(&mut self, id: &Identifier) -> Result<(), SessionError> {
        let shown = self
            .fetch(id)
            .and_then(|tensor| self.install(tensor, Source::Stored(id.clone())));
        logged("show_tensor", shown)
    }

    /// Display `|left - right|`.
    ///
    /// Shapes are checked against the catalog before any payload is fetched.
    pub fn show_difference(
        &mut self,
        left: &Identifier,
        right: &Identifier,
    ) -> Result<(), SessionError> {
        let shown = self.difference(left, right).and_then(|diff| {
            self.install(
                Arc::new(diff),
                Source::Difference {
                    left: left.clone(),
                    right: right.clone(),
                },
            )
        });
        logged("show_difference", shown)
    }

    fn difference(&mut self, left: &Identifier, right: &Identifier) -> Result<Tensor, SessionError> {
        let (l, r) = (self.metadata(left)?, self.metadata(right)?);
        if l.shape != r.shape {
            return Err(DiffError::ShapeMismatch {
                left: l.shape.clone(),
                right: r.shape.clone(),
            }
            .into());
        }
        let a = self.fetch(left)?;
        let b = self.fetch(right)?;
        Ok(pointwise_diff(&a, &b)?)
    }

    fn displayed_mut(&mut self) -> Result<&mut Displayed, SessionError> {
        self.displayed.as_mut().ok_or(SessionError::NoTensor)
    }

    /// Choose the displayed axes and refit the viewport to the new slice.
    pub fn select_axes(&mut self, y_axis: usize, x_axis: usize) -> Result<(), SessionError> {
        let result = self.try_select_axes(y_axis, x_axis);
        logged("select_axes", result)
    }

    fn try_select_axes(&mut self, y_axis: usize, x_axis: usize) -> Result<(), SessionError> {
        let current = self.displayed.as_ref().ok_or(SessionError::NoTensor)?;
        let mut projector = current.projector.clone();
        projector.select_axes(y_axis, x_axis)?;
        let viewport = self.fit(&projector)?;
        let displayed = self.displayed_mut()?;
        displayed.projector = projector;
        displayed.viewport = viewport;
        self.redraw.request();
        Ok(())
    }

    /// Pin a non-displayed axis to `index`.
    pub fn set_fixed_index(&mut self, axis: usize, index: usize) -> Result<(), SessionError> {
        let result = self
            .displayed_mut()
            .and_then(|d| Ok(d.projector.set_fixed_index(axis, index)?));
        if result.is_ok() {
            self.redraw.request();
        }
        logged("set_fixed_index", result)
    }

    /// Fit the viewport to the whole slice.
    pub fn reset_view(&mut self) -> Result<(), SessionError> {
        let result = self.try_reset_view();
        logged("reset_view", result)
    }

    fn try_reset_view(&mut self) -> Result<(), SessionError> {
        let current = self.displayed.as_ref().ok_or(SessionError::NoTensor)?;
        let viewport = self.fit(&current.projector)?;
        self.displayed_mut()?.viewport = viewport;
        self.redraw.request();
        Ok(())
    }

    // ── View events ──────────────────────────────────────────────────────

    /// Zoom by `factor` (> 1 zooms in) around a data-space anchor.
    pub fn on_scroll(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) -> Result<(), SessionError> {
        let result = self
            .displayed_mut()
            .and_then(|d| Ok(d.viewport.zoom(factor, anchor_x, anchor_y)?));
        if result.is_ok() {
            self.redraw.request();
        }
        logged("on_scroll", result)
    }

    /// Zoom by whole wheel steps of [`ViewerConfig::zoom_step`]; positive
    /// steps zoom in.
    pub fn on_wheel(&mut self, steps: i32, anchor_x: f64, anchor_y: f64) -> Result<(), SessionError> {
        self.on_scroll(self.config.zoom_step.powi(steps), anchor_x, anchor_y)
    }

    /// Translate the viewport by data-space offsets.
    pub fn on_pan(&mut self, dx: f64, dy: f64) -> Result<(), SessionError> {
        let result = self.displayed_mut().and_then(|d| Ok(d.viewport.pan(dx, dy)?));
        if result.is_ok() {
            self.redraw.request();
        }
        logged("on_pan", result)
    }

    /// The drawing surface changed size. The viewport is kept.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.surface = SurfaceSize::new(width, height);
        self.redraw.request();
    }

    /// Queue an event for [`apply_pending_events`](Self::apply_pending_events).
    pub fn push_event(&mut self, event: ViewEvent) {
        self.events.push(event);
    }

    /// Apply queued events after coalescing; returns how many were applied.
    ///
    /// Rejected events are logged and skipped.
    pub fn apply_pending_events(&mut self) -> usize {
        let mut applied = 0;
        for event in self.events.flush() {
            let result = match event {
                ViewEvent::Scroll {
                    factor,
                    anchor_x,
                    anchor_y,
                } => self.on_scroll(factor, anchor_x, anchor_y),
                ViewEvent::Pan { dx, dy } => self.on_pan(dx, dy),
                ViewEvent::Resize { width, height } => {
                    self.on_resize(width, height);
                    Ok(())
                }
            };
            if result.is_ok() {
                applied += 1;
            }
        }
        applied
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// The current frame. Pure: repeated calls give the same view.
    #[must_use]
    pub fn render(&self) -> View<'_> {
        let Some(displayed) = &self.displayed else {
            return no_data();
        };
        let Some(slice) = displayed.slice() else {
            return no_data();
        };
        let frame = lod::render(&slice, &displayed.viewport, self.surface.width);
        View::Image {
            title: lod::title(&displayed.projector, frame.pool_size),
            grid: frame.grid,
            extent: frame.extent,
            pool_size: frame.pool_size,
            value_range: frame.value_range,
        }
    }

    /// Describe the cell under data point `(x, y)`.
    #[must_use]
    pub fn probe(&self, x: f64, y: f64) -> Option<String> {
        let slice = self.displayed.as_ref()?.slice()?;
        Some(lod::probe(&slice, x, y))
    }

    /// [`probe`](Self::probe) at a surface pixel.
    #[must_use]
    pub fn probe_pixel(&self, px: f64, py: f64) -> Option<String> {
        let viewport = self.viewport()?;
        let (x, y) = viewport.screen_to_data(px, py, self.surface)?;
        self.probe(x, y)
    }

    // ── Triage ───────────────────────────────────────────────────────────

    fn batch_spec(&self, token_a: &str, token_b: &str) -> BatchSpec {
        BatchSpec::new(token_a, token_b).with_epsilon(self.config.batch.epsilon)
    }

    /// Compare every `token_a` tensor with its `token_b` counterpart and
    /// replace the severity tree with the outcome.
    pub fn run_batch_diff(&mut self, token_a: &str, token_b: &str) -> Result<BatchSummary, SessionError> {
        let spec = self.batch_spec(token_a, token_b);
        let store = &*self.store;
        let cache = &mut self.cache;
        let outcome = batch_compare(
            &self.catalog,
            &spec,
            |meta| cache.fetch(store, meta),
            &mut NoProgress,
            &CancellationToken::never(),
        )
        .map_err(SessionError::from);
        let outcome = logged("run_batch_diff", outcome)?;
        Ok(self.apply_batch_outcome(outcome))
    }

    /// Replace results and severities with those of a finished batch.
    pub fn apply_batch_outcome(&mut self, outcome: BatchOutcome) -> BatchSummary {
        let summary = BatchSummary::from(&outcome);
        self.tree.apply_diff_results(&outcome.results);
        self.results = outcome.results;
        self.redraw.request();
        summary
    }

    /// Drop every severity.
    pub fn clear_results(&mut self) {
        self.tree.clear_severities();
        self.results.clear();
        self.redraw.request();
    }

    /// Color for a tree node by identifier path; `None` without severity.
    #[must_use]
    pub fn color_for(&self, id: &Identifier) -> Option<Rgb> {
        self.tree.color_for_identifier(id, &self.scale)
    }

    /// Aggregate severity for an identifier path.
    #[must_use]
    pub fn severity_for(&self, id: &Identifier) -> Option<f64> {
        self.tree.find(id.as_str()).and_then(|n| self.tree.severity(n))
    }
}

impl<S: TensorStore + Send + Sync + ?Sized + 'static> Inspector<S> {
    /// Start a batch comparison on a background thread.
    ///
    /// The session is untouched until the caller hands the joined outcome
    /// to [`apply_batch_outcome`](Self::apply_batch_outcome).
    #[must_use]
    pub fn spawn_batch_diff(&self, token_a: &str, token_b: &str) -> BatchJob {
        BatchJob::spawn(
            Arc::clone(&self.store),
            self.catalog.clone(),
            self.batch_spec(token_a, token_b),
            self.config.cache.capacity,
        )
    }
}

impl<S: ?Sized> std::fmt::Debug for Inspector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("tensors", &self.catalog.len())
            .field("source", &self.displayed.as_ref().map(|d| &d.source))
            .field("surface", &self.surface)
            .field("results", &self.results.len())
            .finish()
    }
}

fn no_data<'a>() -> View<'a> {
    View::NoData {
        title: NO_DATA_TITLE.to_string(),
    }
}

fn logged<T>(op: &'static str, result: Result<T, SessionError>) -> Result<T, SessionError> {
    if let Err(e) = &result {
        tracing::warn!(
            target: "tscope.session",
            op,
            error_type = e.error_type(),
            error = %e,
            "operation rejected"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tscope_core::storage::MemoryStore;
    use tscope_render::projection::ProjectionError;

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    fn iota(shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::from_f32(shape, (0..n).map(|v| v as f32).collect()).unwrap()
    }

    fn session(entries: &[(&str, Tensor)]) -> Inspector<MemoryStore> {
        let mut store = MemoryStore::new();
        for (raw, t) in entries {
            store.insert_tensor(id(raw), t);
        }
        let mut inspector = Inspector::new(store, ViewerConfig::default());
        inspector.load_catalog().unwrap();
        inspector.take_redraw();
        inspector
    }

    #[test]
    fn starts_with_no_data() {
        let inspector = Inspector::new(MemoryStore::new(), ViewerConfig::default());
        assert_eq!(inspector.render().title(), NO_DATA_TITLE);
        assert!(inspector.probe(0.0, 0.0).is_none());
    }

    #[test]
    fn operations_without_tensor_fail() {
        let mut inspector = session(&[]);
        assert_eq!(inspector.select_axes(0, 1), Err(SessionError::NoTensor));
        assert_eq!(inspector.on_pan(1.0, 1.0), Err(SessionError::NoTensor));
        assert_eq!(inspector.reset_view(), Err(SessionError::NoTensor));
        assert!(!inspector.take_redraw());
    }

    #[test]
    fn set_tensor_none_clears() {
        let mut inspector = session(&[]);
        inspector.set_tensor(Some(Arc::new(iota(&[2, 2])))).unwrap();
        assert_eq!(inspector.source(), Some(&Source::Loose));
        inspector.set_tensor(None).unwrap();
        assert!(matches!(inspector.render(), View::NoData { .. }));
        assert!(inspector.take_redraw());
    }

    #[test]
    fn show_tensor_uses_cache() {
        let mut inspector = session(&[("a.b", iota(&[3, 3]))]);
        inspector.show_tensor(&id("a.b")).unwrap();
        inspector.show_tensor(&id("a.b")).unwrap();
        assert_eq!(inspector.store().payload_loads(), 1);
        assert_eq!(inspector.source(), Some(&Source::Stored(id("a.b"))));
    }

    #[test]
    fn unknown_identifier_keeps_display() {
        let mut inspector = session(&[("a.b", iota(&[3, 3]))]);
        inspector.show_tensor(&id("a.b")).unwrap();
        let err = inspector.show_tensor(&id("a.zzz")).unwrap_err();
        assert_eq!(err.error_type(), "unknown_identifier");
        assert_eq!(inspector.source(), Some(&Source::Stored(id("a.b"))));
    }

    #[test]
    fn failed_axis_selection_keeps_projection_and_viewport() {
        let mut inspector = session(&[("t", iota(&[2, 3, 4]))]);
        inspector.show_tensor(&id("t")).unwrap();
        inspector.on_pan(0.5, 0.5).unwrap();
        let viewport = inspector.viewport();
        let state = inspector.projector().unwrap().state().clone();
        assert_eq!(
            inspector.select_axes(1, 1),
            Err(SessionError::Projection(ProjectionError::DuplicateAxis { axis: 1 }))
        );
        assert_eq!(inspector.viewport(), viewport);
        assert_eq!(inspector.projector().unwrap().state(), &state);
    }

    #[test]
    fn select_axes_refits_viewport() {
        let mut inspector = session(&[("t", iota(&[2, 3, 4]))]);
        inspector.on_resize(0, 0);
        inspector.show_tensor(&id("t")).unwrap();
        inspector.select_axes(0, 2).unwrap();
        let vp = inspector.viewport().unwrap();
        assert_eq!(vp.x_range(), (-0.5, 3.5));
        assert_eq!(inspector.projector().unwrap().slice_dim(), (2, 4));
    }

    #[test]
    fn difference_checks_shapes_before_fetching() {
        let mut inspector = session(&[("r1.x", iota(&[2, 2])), ("r2.x", iota(&[4]))]);
        let err = inspector.show_difference(&id("r1.x"), &id("r2.x")).unwrap_err();
        assert_eq!(err.error_type(), "diff");
        assert_eq!(inspector.store().payload_loads(), 0);
        assert!(inspector.tensor().is_none());
    }

    #[test]
    fn difference_is_displayed() {
        let b = Tensor::from_f32(&[2, 2], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let mut inspector = session(&[("r1.x", iota(&[2, 2])), ("r2.x", b)]);
        inspector.show_difference(&id("r1.x"), &id("r2.x")).unwrap();
        let t = inspector.tensor().unwrap();
        assert_eq!(t.value_at(&[0, 0]), Some(1.0));
        assert_eq!(t.value_at(&[1, 1]), Some(2.0));
    }

    #[test]
    fn wheel_uses_zoom_step() {
        let mut inspector = session(&[("t", iota(&[10, 10]))]);
        inspector.on_resize(0, 0);
        inspector.show_tensor(&id("t")).unwrap();
        let before = inspector.viewport().unwrap().width();
        inspector.on_wheel(1, 4.5, 4.5).unwrap();
        let after = inspector.viewport().unwrap().width();
        assert!((before / after - 1.2).abs() < 1e-12);
    }

    #[test]
    fn coalesced_events_apply_once() {
        let mut inspector = session(&[("t", iota(&[10, 10]))]);
        inspector.show_tensor(&id("t")).unwrap();
        inspector.take_redraw();
        for _ in 0..5 {
            inspector.push_event(ViewEvent::Pan { dx: 1.0, dy: 0.0 });
        }
        inspector.push_event(ViewEvent::Resize {
            width: 100,
            height: 100,
        });
        let start = inspector.viewport().unwrap().x_range();
        assert_eq!(inspector.apply_pending_events(), 2);
        let end = inspector.viewport().unwrap().x_range();
        assert!((end.0 - start.0 - 5.0).abs() < 1e-12);
        assert_eq!(inspector.surface(), SurfaceSize::new(100, 100));
        assert!(inspector.take_redraw());
        assert!(!inspector.take_redraw());
    }

    #[test]
    fn render_is_idempotent() {
        let mut inspector = session(&[("t", iota(&[4, 6]))]);
        inspector.show_tensor(&id("t")).unwrap();
        let a = inspector.render();
        let b = inspector.render();
        match (a, b) {
            (
                View::Image {
                    grid: ga,
                    title: ta,
                    pool_size: pa,
                    ..
                },
                View::Image {
                    grid: gb,
                    title: tb,
                    pool_size: pb,
                    ..
                },
            ) => {
                assert_eq!(ta, tb);
                assert_eq!(pa, pb);
                assert_eq!(ga.dim(), gb.dim());
                assert_eq!(ta, "Slice Y:H (Dim 0), X:W (Dim 1) (Original Resolution)");
            }
            _ => panic!("expected image views"),
        }
    }

    #[test]
    fn reload_clears_results_and_cache() {
        let mut inspector = session(&[
            ("r.rec1.x", iota(&[2])),
            ("r.rec2.x", Tensor::from_f32(&[2], vec![5.0, 5.0]).unwrap()),
        ]);
        let summary = inspector.run_batch_diff("rec1", "rec2").unwrap();
        assert_eq!(summary.significant, 1);
        assert!(inspector.color_for(&id("r")).is_some());
        inspector.load_catalog().unwrap();
        assert!(inspector.results().is_empty());
        assert!(inspector.color_for(&id("r")).is_none());
        let stats = inspector.cache_stats();
        assert_eq!(stats.probation_len + stats.main_len, 0);
    }
}
