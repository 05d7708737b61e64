//! Structured-logging contract for the inspection session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tscope_core::identifier::Identifier;
use tscope_core::storage::MemoryStore;
use tscope_core::tensor::Tensor;
use tscope_runtime::config::ViewerConfig;
use tscope_runtime::session::Inspector;

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

#[derive(Default)]
struct Captured {
    spans: Vec<String>,
    events: Vec<CapturedEvent>,
}

struct SpanCapture(Arc<Mutex<Captured>>);

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.0
            .lock()
            .unwrap()
            .spans
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.0.lock().unwrap().events.push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_tracing<F: FnOnce()>(f: F) -> Captured {
    let shared = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(SpanCapture(shared.clone()));
    tracing::subscriber::with_default(subscriber, f);
    let mut guard = shared.lock().unwrap();
    std::mem::take(&mut *guard)
}

fn id(raw: &str) -> Identifier {
    Identifier::new(raw).unwrap()
}

fn session() -> Inspector<MemoryStore> {
    let store = MemoryStore::new()
        .with_tensor(id("m.rec1.a"), &Tensor::from_f32(&[2, 2], vec![0.0; 4]).unwrap())
        .with_tensor(id("m.rec2.a"), &Tensor::from_f32(&[3], vec![0.0; 3]).unwrap());
    Inspector::new(store, ViewerConfig::default())
}

fn rejections(captured: &Captured) -> Vec<&CapturedEvent> {
    captured
        .events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN && e.target == "tscope.session")
        .collect()
}

#[test]
fn catalog_load_is_spanned_and_counted() {
    let mut s = session();
    let captured = with_captured_tracing(|| {
        s.load_catalog().unwrap();
    });
    assert!(captured.spans.iter().any(|name| name == "tscope.catalog"));
    let loaded = captured
        .events
        .iter()
        .find(|e| e.level == tracing::Level::INFO && e.target == "tscope.catalog")
        .expect("catalog loaded event");
    assert_eq!(loaded.fields.get("tensors").map(String::as_str), Some("2"));
}

#[test]
fn rejected_operations_carry_error_type() {
    let mut s = session();
    s.load_catalog().unwrap();
    let captured = with_captured_tracing(|| {
        assert!(s.show_tensor(&id("m.rec9.a")).is_err());
        assert!(s.select_axes(0, 1).is_err());
        assert!(s.show_difference(&id("m.rec1.a"), &id("m.rec2.a")).is_err());
    });

    let warned = rejections(&captured);
    let pairs: Vec<(&str, &str)> = warned
        .iter()
        .map(|e| {
            (
                e.fields.get("op").map_or("", String::as_str),
                e.fields.get("error_type").map_or("", String::as_str),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        [
            ("show_tensor", "unknown_identifier"),
            ("select_axes", "no_tensor"),
            ("show_difference", "diff"),
        ]
    );
}

#[test]
fn successful_operations_do_not_warn() {
    let mut s = session();
    s.load_catalog().unwrap();
    let captured = with_captured_tracing(|| {
        s.show_tensor(&id("m.rec1.a")).unwrap();
        s.on_pan(1.0, 1.0).unwrap();
        s.reset_view().unwrap();
    });
    assert!(rejections(&captured).is_empty());
}
