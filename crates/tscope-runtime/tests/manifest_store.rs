//! Directory-backed store round trips.

use std::fs;

use tempfile::TempDir;
use tscope_core::identifier::Identifier;
use tscope_core::storage::{StorageError, TensorStore};
use tscope_core::tensor::{ElementType, Tensor};
use tscope_runtime::config::ViewerConfig;
use tscope_runtime::manifest_store::{MANIFEST_FILE, ManifestStore};
use tscope_runtime::session::{Inspector, View};

fn id(raw: &str) -> Identifier {
    Identifier::new(raw).unwrap()
}

fn seeded() -> (TempDir, ManifestStore) {
    let dir = TempDir::new().unwrap();
    let w = Tensor::from_f32(&[2, 3], vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    let labels = Tensor::from_i32(&[4], vec![1, -2, 3, -4]).unwrap();
    let store = ManifestStore::create(
        dir.path().join("store"),
        [(id("net.rec1.w"), &w), (id("net.rec1.labels"), &labels)],
    )
    .unwrap();
    (dir, store)
}

#[test]
fn create_then_open_lists_metadata() {
    let (dir, _) = seeded();
    let store = ManifestStore::open(dir.path().join("store")).unwrap();
    let mut entries = store.load_metadata().unwrap();
    entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].identifier, id("net.rec1.labels"));
    assert_eq!(entries[0].element_type, ElementType::Int32);
    assert_eq!(entries[1].shape, vec![2, 3]);
}

#[test]
fn payloads_decode_to_the_written_tensor() {
    let (_dir, store) = seeded();
    store.load_metadata().unwrap();
    let bytes = store.load_payload(&id("net.rec1.w")).unwrap();
    let tensor = Tensor::from_le_bytes(ElementType::Float32, &[2, 3], &bytes).unwrap();
    assert_eq!(tensor.value_at(&[1, 2]), Some(5.0));
}

#[test]
fn payload_lookup_reads_manifest_lazily() {
    let (_dir, store) = seeded();
    // No load_metadata first.
    assert_eq!(store.load_payload(&id("net.rec1.labels")).unwrap().len(), 16);
}

#[test]
fn unknown_identifier_is_not_found() {
    let (_dir, store) = seeded();
    let err = store.load_payload(&id("net.rec9.w")).unwrap_err();
    assert_eq!(
        err,
        StorageError::NotFound {
            identifier: id("net.rec9.w")
        }
    );
}

#[test]
fn missing_payload_file_is_not_found() {
    let (_dir, store) = seeded();
    fs::remove_file(store.root().join("net.rec1.w.bin")).unwrap();
    assert!(matches!(
        store.load_payload(&id("net.rec1.w")),
        Err(StorageError::NotFound { .. })
    ));
}

#[test]
fn malformed_manifest_is_invalid_metadata() {
    let (_dir, store) = seeded();
    fs::write(store.root().join(MANIFEST_FILE), "{ \"tensors\": [ {").unwrap();
    assert!(matches!(
        store.load_metadata(),
        Err(StorageError::InvalidMetadata { .. })
    ));
}

#[test]
fn escaping_payload_path_is_rejected() {
    let (_dir, store) = seeded();
    let manifest = r#"{"tensors":[{"id":"a.b","dtype":"float32","shape":[1],"file":"../secret.bin"}]}"#;
    fs::write(store.root().join(MANIFEST_FILE), manifest).unwrap();
    assert!(matches!(
        store.load_metadata(),
        Err(StorageError::InvalidMetadata { .. })
    ));
}

#[test]
fn open_requires_a_directory() {
    let dir = TempDir::new().unwrap();
    let err = ManifestStore::open(dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, StorageError::Unavailable { .. }));
}

#[test]
fn inspector_over_manifest_store() {
    let (_dir, store) = seeded();
    let mut inspector = Inspector::new(store, ViewerConfig::default());
    assert_eq!(inspector.load_catalog().unwrap(), 2);
    inspector.show_tensor(&id("net.rec1.w")).unwrap();
    match inspector.render() {
        View::Image { grid, .. } => assert_eq!(grid.dim(), (2, 3)),
        View::NoData { .. } => panic!("expected an image"),
    }
}
