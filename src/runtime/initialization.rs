//! # Initialization
//!
//! Startup sequence: configuration, logging, rustls, metrics, Kubernetes
//! client, sync pipeline.
//!
//! Configuration is validated before anything else so a bad flag stops the
//! process before any cycle runs.

use crate::cli::Args;
use crate::config::SyncerConfig;
use crate::observability;
use crate::provider::kubernetes::{KubernetesSecretStore, SecretLayout};
use crate::server::ServerState;
use crate::sync::{RustlsVerifier, SyncPipeline};
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the lifecycle needs to run
#[derive(Debug)]
pub struct InitializationResult {
    pub config: SyncerConfig,
    pub pipeline: SyncPipeline,
    pub server_state: Arc<ServerState>,
}

/// Initialize the syncer
///
/// # Errors
///
/// Fails on invalid configuration, when logging or metrics cannot be set up,
/// or when no Kubernetes client configuration can be found.
pub async fn initialize(args: &Args) -> Result<InitializationResult> {
    let config = SyncerConfig::from_args(args).context("Invalid configuration")?;

    observability::init_logging(&config.log_level, config.log_format)?;

    info!("Starting cert-secret-syncer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    // Required for rustls 0.23+ when no default provider is set via features.
    // Used by the Kubernetes client connection.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    observability::metrics::register_metrics()?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let store = Arc::new(KubernetesSecretStore::new(
        client,
        SecretLayout::new(config.cert_data_key.as_str(), config.key_data_key.as_str()),
    ));

    let pipeline = SyncPipeline::new(
        config.cert_path.clone(),
        config.cert_pattern.clone(),
        config.secret.clone(),
        store,
        Arc::new(RustlsVerifier::new()),
    );

    info!(
        "Syncing first file in {} matching '{}' to secret {}",
        config.cert_path.display(),
        config.cert_pattern.as_str(),
        pipeline.target()
    );

    Ok(InitializationResult {
        config,
        pipeline,
        server_state: Arc::new(ServerState::default()),
    })
}
