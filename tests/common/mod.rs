//! Common test utilities for the integration tests
//!
//! Provides an in-memory credential store and helpers for writing real
//! certificate/key fixtures to a scratch directory.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use cert_secret_syncer::provider::{
    CredentialRecord, CredentialStore, StoreError, StoreOperation,
};
use rcgen::{CertificateParams, KeyPair};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Generate a self-signed certificate and its private key as PEM
pub fn generate_pair(name: &str) -> (String, String) {
    let key_pair = KeyPair::generate().expect("key generation should succeed");
    let cert = CertificateParams::new(vec![name.to_string()])
        .expect("params should build")
        .self_signed(&key_pair)
        .expect("self-signing should succeed");
    (cert.pem(), key_pair.serialize_pem())
}

pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

/// One call made against the [`InMemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub operation: StoreOperation,
    pub namespace: String,
    pub name: String,
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<(String, String), CredentialRecord>,
    calls: Vec<StoreCall>,
    next_version: u64,
    fail_next: Option<StoreOperation>,
    write_after_next_get: bool,
}

/// Credential store kept in memory
///
/// Every write bumps a numeric resource version. Updates carrying a stale
/// version are rejected with [`StoreError::Conflict`], like the API server
/// does.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a record in place without recording a call
    pub fn seed(&self, namespace: &str, name: &str, cert: &[u8], key: &[u8]) -> String {
        let mut inner = self.inner.lock().expect("store lock");
        let version = inner.bump_version();
        let record = CredentialRecord::new(namespace, name, cert.to_vec(), key.to_vec())
            .with_resource_version(Some(version.clone()));
        inner
            .records
            .insert((namespace.to_string(), name.to_string()), record);
        version
    }

    /// Simulate a concurrent writer changing the record right after the next read
    pub fn write_after_next_get(&self) {
        self.inner.lock().expect("store lock").write_after_next_get = true;
    }

    /// Make the next call of `operation` fail with a backend error
    pub fn fail_next(&self, operation: StoreOperation) {
        self.inner.lock().expect("store lock").fail_next = Some(operation);
    }

    pub fn record(&self, namespace: &str, name: &str) -> Option<CredentialRecord> {
        self.inner
            .lock()
            .expect("store lock")
            .records
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner.lock().expect("store lock").calls.clone()
    }

    pub fn operations(&self) -> Vec<StoreOperation> {
        self.calls().into_iter().map(|call| call.operation).collect()
    }

    fn begin(
        &self,
        operation: StoreOperation,
        namespace: &str,
        name: &str,
    ) -> Result<std::sync::MutexGuard<'_, StoreInner>, StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.calls.push(StoreCall {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        if inner.fail_next == Some(operation) {
            inner.fail_next = None;
            return Err(StoreError::Backend {
                operation,
                namespace: namespace.to_string(),
                name: name.to_string(),
                source: "injected failure".into(),
            });
        }
        Ok(inner)
    }
}

impl StoreInner {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let mut inner = self.begin(StoreOperation::Get, namespace, name)?;
        let key = (namespace.to_string(), name.to_string());
        let found = inner.records.get(&key).cloned();

        if std::mem::take(&mut inner.write_after_next_get) {
            let version = inner.bump_version();
            if let Some(record) = inner.records.get_mut(&key) {
                record.resource_version = Some(version);
            }
        }

        Ok(found)
    }

    async fn create(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let mut inner = self.begin(StoreOperation::Create, &record.namespace, &record.name)?;
        let key = (record.namespace.clone(), record.name.clone());
        if inner.records.contains_key(&key) {
            return Err(StoreError::Conflict {
                operation: StoreOperation::Create,
                namespace: record.namespace.clone(),
                name: record.name.clone(),
            });
        }

        let version = inner.bump_version();
        let stored = record.clone().with_resource_version(Some(version));
        inner.records.insert(key, stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let mut inner = self.begin(StoreOperation::Update, &record.namespace, &record.name)?;
        let key = (record.namespace.clone(), record.name.clone());
        let current_version = inner
            .records
            .get(&key)
            .and_then(|current| current.resource_version.clone());
        if current_version.is_none() || current_version != record.resource_version {
            return Err(StoreError::Conflict {
                operation: StoreOperation::Update,
                namespace: record.namespace.clone(),
                name: record.name.clone(),
            });
        }

        let version = inner.bump_version();
        let stored = record.clone().with_resource_version(Some(version));
        inner.records.insert(key, stored.clone());
        Ok(stored)
    }
}
