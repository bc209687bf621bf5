//! # Kubernetes Secret Store
//!
//! Keeps the credential record in a core/v1 `Secret`.
//!
//! The certificate and key are stored under two configurable data keys
//! (`cert.pem` and `key.pem` by default). Updates are sent as a full replace
//! carrying the `resourceVersion` read beforehand, so the API server rejects
//! them with `409 Conflict` if the Secret changed in between.

use crate::provider::{CredentialRecord, CredentialStore, StoreError, StoreOperation};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::{Api, PostParams};
use kube::Client;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Where the certificate and key live inside the Secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLayout {
    pub cert_data_key: String,
    pub key_data_key: String,
}

impl SecretLayout {
    pub fn new(cert_data_key: impl Into<String>, key_data_key: impl Into<String>) -> Self {
        Self {
            cert_data_key: cert_data_key.into(),
            key_data_key: key_data_key.into(),
        }
    }

    /// Render a record as a Secret, carrying its resource version if any
    pub fn to_secret(&self, record: &CredentialRecord) -> Secret {
        let mut data = BTreeMap::new();
        data.insert(self.cert_data_key.clone(), ByteString(record.cert.clone()));
        data.insert(
            self.key_data_key.clone(),
            ByteString(record.key.as_slice().to_vec()),
        );

        Secret {
            metadata: ObjectMeta {
                name: Some(record.name.clone()),
                namespace: Some(record.namespace.clone()),
                resource_version: record.resource_version.clone(),
                ..ObjectMeta::default()
            },
            data: Some(data),
            ..Secret::default()
        }
    }

    /// Read a record back out of a Secret
    ///
    /// Missing data keys come back as empty blobs; the next publish fills them.
    pub fn from_secret(&self, secret: Secret, namespace: &str, name: &str) -> CredentialRecord {
        let mut data = secret.data.unwrap_or_default();
        let cert = data
            .remove(&self.cert_data_key)
            .map(|bytes| bytes.0)
            .unwrap_or_default();
        let key = data
            .remove(&self.key_data_key)
            .map(|bytes| bytes.0)
            .unwrap_or_default();

        if cert.is_empty() || key.is_empty() {
            warn!(
                "Secret {}/{} is missing '{}' or '{}', it will be overwritten",
                namespace, name, self.cert_data_key, self.key_data_key
            );
        }

        CredentialRecord::new(
            secret.metadata.namespace.as_deref().unwrap_or(namespace),
            secret.metadata.name.as_deref().unwrap_or(name),
            cert,
            key,
        )
        .with_resource_version(secret.metadata.resource_version)
    }
}

impl Default for SecretLayout {
    fn default() -> Self {
        use crate::constants::{DEFAULT_CERT_DATA_KEY, DEFAULT_KEY_DATA_KEY};
        Self::new(DEFAULT_CERT_DATA_KEY, DEFAULT_KEY_DATA_KEY)
    }
}

/// [`CredentialStore`] backed by Kubernetes Secrets
#[derive(Clone)]
pub struct KubernetesSecretStore {
    client: Client,
    layout: SecretLayout,
}

impl std::fmt::Debug for KubernetesSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubernetesSecretStore")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl KubernetesSecretStore {
    pub fn new(client: Client, layout: SecretLayout) -> Self {
        Self { client, layout }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map a kube error onto the store's error kinds
fn classify_error(
    error: kube::Error,
    operation: StoreOperation,
    namespace: &str,
    name: &str,
) -> StoreError {
    match error {
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => StoreError::Backend {
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
            source: Box::new(other),
        },
    }
}

#[async_trait]
impl CredentialStore for KubernetesSecretStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        match self.secrets(namespace).get(name).await {
            Ok(secret) => Ok(Some(self.layout.from_secret(secret, namespace, name))),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("Secret {}/{} does not exist yet", namespace, name);
                Ok(None)
            }
            Err(e) => Err(classify_error(e, StoreOperation::Get, namespace, name)),
        }
    }

    async fn create(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let secret = self.layout.to_secret(record);
        let created = self
            .secrets(&record.namespace)
            .create(&PostParams::default(), &secret)
            .await
            .map_err(|e| {
                classify_error(e, StoreOperation::Create, &record.namespace, &record.name)
            })?;

        Ok(self
            .layout
            .from_secret(created, &record.namespace, &record.name))
    }

    async fn update(&self, record: &CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let secret = self.layout.to_secret(record);
        let replaced = self
            .secrets(&record.namespace)
            .replace(&record.name, &PostParams::default(), &secret)
            .await
            .map_err(|e| {
                classify_error(e, StoreOperation::Update, &record.namespace, &record.name)
            })?;

        Ok(self
            .layout
            .from_secret(replaced, &record.namespace, &record.name))
    }
}
