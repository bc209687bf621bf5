//! # Secret Publisher
//!
//! Create-or-update of the target record with optimistic concurrency.
//!
//! The record is read first. If it does not exist it is created; otherwise
//! it is replaced carrying the version token from that read, so a concurrent
//! change made in between is rejected by the store instead of overwritten.
//! A rejected update is not retried here; the next cycle starts over.

use crate::config::SecretRef;
use crate::observability::metrics;
use crate::provider::{CredentialRecord, CredentialStore, StoreError, StoreOperation};
use tracing::debug;

/// What the publish did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Created {
        resource_version: Option<String>,
    },
    Updated {
        previous_version: Option<String>,
        resource_version: Option<String>,
    },
}

/// Publish a certificate and key into `target`
///
/// # Errors
///
/// Any [`StoreError`] from the lookup, create or update.
pub async fn publish(
    store: &dyn CredentialStore,
    target: &SecretRef,
    cert: &[u8],
    key: &[u8],
) -> Result<PublishOutcome, StoreError> {
    let existing = store.get(&target.namespace, &target.name).await?;
    let record = CredentialRecord::new(
        target.namespace.as_str(),
        target.name.as_str(),
        cert.to_vec(),
        key.to_vec(),
    );

    match existing {
        None => {
            let created = store.create(&record).await?;
            metrics::increment_secret_writes(StoreOperation::Create.as_str());
            debug!(
                "created secret {} successfully in namespace {}",
                target.name, target.namespace
            );
            Ok(PublishOutcome::Created {
                resource_version: created.resource_version,
            })
        }
        Some(current) => {
            let previous_version = current.resource_version;
            let record = record.with_resource_version(previous_version.clone());
            let updated = store.update(&record).await?;
            metrics::increment_secret_writes(StoreOperation::Update.as_str());
            debug!(
                "updated secret {} successfully in namespace {}",
                target.name, target.namespace
            );
            Ok(PublishOutcome::Updated {
                previous_version,
                resource_version: updated.resource_version,
            })
        }
    }
}
