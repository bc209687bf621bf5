//! # Sync Pipeline Integration Tests
//!
//! Runs full sync cycles against real certificate fixtures on disk and an
//! in-memory credential store.
//!
//! These tests verify:
//! - First cycle creates the record with the matched file bytes
//! - Second cycle updates in place carrying the version token
//! - Failed discovery leaves the store untouched
//! - Store failures surface as cycle errors

mod common;

use cert_secret_syncer::config::SecretRef;
use cert_secret_syncer::observability::metrics;
use prometheus::{Encoder, TextEncoder};
use cert_secret_syncer::provider::{CredentialStore, StoreError, StoreOperation};
use cert_secret_syncer::sync::{PublishOutcome, RustlsVerifier, SyncCycle, SyncError, SyncPipeline};
use common::{generate_pair, write_fixture, InMemoryStore};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const NAMESPACE: &str = "monitoring";
const NAME: &str = "etcd-cert";

fn pipeline(dir: &Path, pattern: &str, store: &Arc<InMemoryStore>) -> SyncPipeline {
    let store: Arc<dyn CredentialStore> = Arc::clone(store) as Arc<dyn CredentialStore>;
    SyncPipeline::new(
        dir,
        Regex::new(pattern).expect("valid pattern"),
        SecretRef::new(NAMESPACE, NAME),
        store,
        Arc::new(RustlsVerifier::new()),
    )
}

/// Writes `kube-etcd-1.pem` and `kube-etcd-1-key.pem`, returning their contents
fn write_etcd_pair(dir: &Path) -> (String, String) {
    let (cert, key) = generate_pair("kube-etcd-1");
    write_fixture(dir, "kube-etcd-1.pem", &cert);
    write_fixture(dir, "kube-etcd-1-key.pem", &key);
    (cert, key)
}

#[tokio::test]
async fn test_etcd_pair_is_created_with_file_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cert, key) = write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());

    // Either file may be listed first; both resolve to the same pair.
    let outcome = pipeline(dir.path(), r"kube-etcd.*\.pem", &store)
        .run_once()
        .await
        .expect("cycle should succeed");

    assert!(matches!(outcome, PublishOutcome::Created { .. }));
    let record = store.record(NAMESPACE, NAME).expect("record created");
    assert_eq!(record.cert, cert.as_bytes());
    assert_eq!(record.key.as_slice(), key.as_bytes());
    assert_eq!(
        store.operations(),
        vec![StoreOperation::Get, StoreOperation::Create]
    );
}

/// Current value of `cert_syncer_secret_writes_total{operation}` as exported
fn secret_writes(operation: &str) -> f64 {
    let _ = metrics::register_metrics();
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&metrics::gather(), &mut buffer)
        .expect("metrics encode");
    let text = String::from_utf8(buffer).expect("metrics are utf-8");

    let series = format!("cert_syncer_secret_writes_total{{operation=\"{operation}\"}} ");
    text.lines()
        .find_map(|line| line.strip_prefix(series.as_str()))
        .map_or(0.0, |value| value.trim().parse().expect("counter value"))
}

#[tokio::test]
async fn test_writes_are_counted_by_store_operation() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(dir.path(), r"kube-etcd.*\.pem", &store);
    let creates_before = secret_writes(StoreOperation::Create.as_str());

    pipeline.run_once().await.expect("first cycle");
    assert!(secret_writes(StoreOperation::Create.as_str()) > creates_before);

    let updates_before = secret_writes(StoreOperation::Update.as_str());
    pipeline.run_once().await.expect("second cycle");
    assert!(secret_writes(StoreOperation::Update.as_str()) > updates_before);
}

#[tokio::test]
async fn test_second_cycle_updates_with_unchanged_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(dir.path(), r"kube-etcd.*\.pem", &store);

    let first = pipeline.run_once().await.expect("first cycle");
    let after_first = store.record(NAMESPACE, NAME).expect("record created");

    let second = pipeline.run_once().await.expect("second cycle");
    let after_second = store.record(NAMESPACE, NAME).expect("record kept");

    let created_version = match first {
        PublishOutcome::Created { resource_version } => resource_version,
        other => panic!("first cycle should create, got {other:?}"),
    };
    assert_eq!(
        second,
        PublishOutcome::Updated {
            previous_version: created_version.clone(),
            resource_version: after_second.resource_version.clone(),
        }
    );
    assert_ne!(after_second.resource_version, created_version);
    assert_eq!(after_first.cert, after_second.cert);
    assert_eq!(after_first.key, after_second.key);
    assert_eq!(
        store.operations(),
        vec![
            StoreOperation::Get,
            StoreOperation::Create,
            StoreOperation::Get,
            StoreOperation::Update
        ]
    );
}

#[tokio::test]
async fn test_existing_record_is_updated_with_version_read_this_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cert, key) = write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    let seeded = store.seed(NAMESPACE, NAME, b"stale cert", b"stale key");

    let outcome = pipeline(dir.path(), r"kube-etcd.*\.pem", &store)
        .run_once()
        .await
        .expect("cycle should succeed");

    let previous_version = match outcome {
        PublishOutcome::Updated {
            previous_version, ..
        } => previous_version,
        other => panic!("existing record should be updated, got {other:?}"),
    };
    assert_eq!(previous_version, Some(seeded));

    let record = store.record(NAMESPACE, NAME).expect("record kept");
    assert_eq!(record.cert, cert.as_bytes());
    assert_eq!(record.key.as_slice(), key.as_bytes());
}

#[tokio::test]
async fn test_no_matching_file_leaves_store_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());

    let err = pipeline(dir.path(), r"kube-apiserver.*\.pem", &store)
        .run_once()
        .await
        .expect_err("no candidate should fail the cycle");

    assert!(matches!(err, SyncError::CandidateNotFound { .. }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(InMemoryStore::new());

    let err = pipeline(&dir.path().join("missing"), r".*\.pem", &store)
        .run_once()
        .await
        .expect_err("missing directory should fail the cycle");

    assert!(matches!(err, SyncError::Io { .. }));
    assert_eq!(err.kind(), "io");
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_certificate_without_key_makes_no_store_call() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cert, _key) = generate_pair("kube-etcd-1");
    let (_other_cert, other_key) = generate_pair("kube-etcd-2");
    write_fixture(dir.path(), "kube-etcd-1.pem", &cert);
    write_fixture(dir.path(), "unrelated-key.key", &other_key);
    let store = Arc::new(InMemoryStore::new());

    let err = pipeline(dir.path(), r"kube-etcd-1\.pem$", &store)
        .run_once()
        .await
        .expect_err("unmatched certificate should fail the cycle");

    assert!(
        matches!(&err, SyncError::PairNotFound { candidate } if candidate.ends_with("kube-etcd-1.pem"))
    );
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_key_candidate_finds_certificate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cert, key) = generate_pair("kube-etcd-1");
    write_fixture(dir.path(), "node.crt", &cert);
    write_fixture(dir.path(), "kube-etcd-1-key.pem", &key);
    let store = Arc::new(InMemoryStore::new());

    pipeline(dir.path(), r"-key\.pem$", &store)
        .run_once()
        .await
        .expect("cycle should succeed");

    let record = store.record(NAMESPACE, NAME).expect("record created");
    assert_eq!(record.cert, cert.as_bytes());
    assert_eq!(record.key.as_slice(), key.as_bytes());
}

#[tokio::test]
async fn test_files_are_reread_every_cycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    let pipeline = pipeline(dir.path(), r"kube-etcd.*\.pem", &store);
    pipeline.run_once().await.expect("first cycle");

    let (rotated_cert, rotated_key) = write_etcd_pair(dir.path());
    pipeline.run_once().await.expect("second cycle");

    let record = store.record(NAMESPACE, NAME).expect("record kept");
    assert_eq!(record.cert, rotated_cert.as_bytes());
    assert_eq!(record.key.as_slice(), rotated_key.as_bytes());
}

#[tokio::test]
async fn test_concurrent_write_is_rejected_as_conflict() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cert, key) = write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    store.seed(NAMESPACE, NAME, b"stale cert", b"stale key");
    let pipeline = pipeline(dir.path(), r"kube-etcd.*\.pem", &store);

    // Someone else writes between our read and our update.
    store.write_after_next_get();
    let err = pipeline
        .run_once()
        .await
        .expect_err("stale version should be rejected");

    assert!(matches!(
        err,
        SyncError::Store(StoreError::Conflict {
            operation: StoreOperation::Update,
            ..
        })
    ));
    let untouched = store.record(NAMESPACE, NAME).expect("record kept");
    assert_eq!(untouched.cert, b"stale cert");

    // The next cycle reads the new version and goes through.
    pipeline.run_once().await.expect("next cycle should succeed");
    let record = store.record(NAMESPACE, NAME).expect("record kept");
    assert_eq!(record.cert, cert.as_bytes());
    assert_eq!(record.key.as_slice(), key.as_bytes());
}

#[tokio::test]
async fn test_lookup_failure_aborts_cycle_before_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    store.fail_next(StoreOperation::Get);

    let err = pipeline(dir.path(), r"kube-etcd.*\.pem", &store)
        .run_once()
        .await
        .expect_err("lookup failure should fail the cycle");

    assert_eq!(err.kind(), "store");
    assert!(matches!(
        err,
        SyncError::Store(StoreError::Backend {
            operation: StoreOperation::Get,
            ..
        })
    ));
    assert_eq!(store.operations(), vec![StoreOperation::Get]);
    assert!(store.record(NAMESPACE, NAME).is_none());
}

#[tokio::test]
async fn test_create_failure_is_reported_and_next_cycle_recovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_etcd_pair(dir.path());
    let store = Arc::new(InMemoryStore::new());
    store.fail_next(StoreOperation::Create);
    let pipeline = pipeline(dir.path(), r"kube-etcd.*\.pem", &store);

    let err = pipeline.run_once().await.expect_err("create should fail");
    assert_eq!(err.kind(), "store");

    let outcome = pipeline.run_once().await.expect("retry should succeed");
    assert!(matches!(outcome, PublishOutcome::Created { .. }));
}

#[test]
fn test_discover_returns_pair_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (cert, key) = generate_pair("kube-etcd-1");
    let cert_path = write_fixture(dir.path(), "kube-etcd-1.pem", &cert);
    let key_path = write_fixture(dir.path(), "kube-etcd-1.key", &key);
    fs::create_dir(dir.path().join("kube-etcd-subdir.pem")).expect("subdir");
    let store = Arc::new(InMemoryStore::new());

    let pipeline = pipeline(dir.path(), r"kube-etcd-1\.pem$", &store);
    assert_eq!(pipeline.target(), &SecretRef::new(NAMESPACE, NAME));

    let pair = pipeline.discover().expect("pair should be found");

    assert_eq!(pair.cert_path(), cert_path);
    assert_eq!(pair.key_path(), key_path);
    assert_eq!(pair.cert(), cert.as_bytes());
    assert_eq!(pair.key(), key.as_bytes());
    assert!(store.calls().is_empty());
}
