//! # Sync Pipeline
//!
//! One sync cycle: scan the certificate directory, validate the pair, publish
//! it.
//!
//! - `scanner`: picks the candidate file
//! - `pairing`: finds and verifies its counterpart
//! - `publisher`: creates or updates the target Secret
//!
//! The steps run strictly in that order. Nothing is cached between cycles;
//! every cycle re-reads the directory and the files.

pub mod error;
pub mod pairing;
pub mod publisher;
pub mod scanner;

pub use error::SyncError;
pub use pairing::{KeyPair, KeyPairVerifier, PairResolution, RustlsVerifier};
pub use publisher::PublishOutcome;

use crate::config::SecretRef;
use crate::provider::CredentialStore;
use async_trait::async_trait;
use pairing::CertCandidate;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Something the scheduler can run once per tick
#[async_trait]
pub trait SyncCycle: Send + Sync {
    async fn run_once(&self) -> Result<PublishOutcome, SyncError>;
}

/// Everything a cycle needs, built once at startup
#[derive(Clone)]
pub struct SyncPipeline {
    cert_dir: PathBuf,
    pattern: Regex,
    target: SecretRef,
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn KeyPairVerifier>,
}

impl std::fmt::Debug for SyncPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncPipeline")
            .field("cert_dir", &self.cert_dir)
            .field("pattern", &self.pattern.as_str())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl SyncPipeline {
    pub fn new(
        cert_dir: impl Into<PathBuf>,
        pattern: Regex,
        target: SecretRef,
        store: Arc<dyn CredentialStore>,
        verifier: Arc<dyn KeyPairVerifier>,
    ) -> Self {
        Self {
            cert_dir: cert_dir.into(),
            pattern,
            target,
            store,
            verifier,
        }
    }

    pub fn target(&self) -> &SecretRef {
        &self.target
    }

    /// Scan and validate, without touching the store
    ///
    /// # Errors
    ///
    /// [`SyncError::Io`], [`SyncError::CandidateNotFound`] or
    /// [`SyncError::PairNotFound`].
    pub fn discover(&self) -> Result<KeyPair, SyncError> {
        let scan = scanner::find_candidate(&self.cert_dir, &self.pattern)?;
        let candidate = CertCandidate::read(&scan.candidate)?;

        match pairing::resolve_pair(&candidate, &scan.entries, self.verifier.as_ref()) {
            PairResolution::Matched(pair) => Ok(pair),
            PairResolution::NoMatch { role, tried } => {
                debug!(
                    "candidate {} classified as {} has no counterpart among {} entries",
                    candidate.path.display(),
                    role.as_str(),
                    tried
                );
                Err(SyncError::PairNotFound {
                    candidate: candidate.path.clone(),
                })
            }
        }
    }
}

#[async_trait]
impl SyncCycle for SyncPipeline {
    async fn run_once(&self) -> Result<PublishOutcome, SyncError> {
        debug!("starting sync of certs to secret {}", self.target);

        let pair = self.discover()?;
        let outcome =
            publisher::publish(self.store.as_ref(), &self.target, pair.cert(), pair.key())
                .await?;

        Ok(outcome)
    }
}
