//! # Pair Validator
//!
//! Turns one candidate file into a validated certificate/key pair.
//!
//! The candidate is classified by content: anything containing `PRIVATE KEY`
//! is treated as the key, everything else as the certificate. Every entry of
//! the directory listing (the candidate included) is then tried as the
//! counterpart, in listing order, until the verifier accepts a combination.
//! The first accepted sibling wins.

use crate::constants::PRIVATE_KEY_MARKER;
use crate::sync::error::SyncError;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::sign::CertifiedKey;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

/// Why a certificate and key were not accepted as a pair
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("failed to parse certificate: {0}")]
    CertificateParse(String),

    #[error("no PEM certificate found")]
    NoCertificate,

    #[error("failed to parse private key: {0}")]
    PrivateKeyParse(String),

    #[error("private key cannot be loaded: {0}")]
    UnsupportedKey(#[source] rustls::Error),

    #[error("private key does not match certificate: {0}")]
    Mismatch(#[source] rustls::Error),
}

/// Checks that a certificate and a private key belong together
pub trait KeyPairVerifier: Send + Sync {
    fn verify(&self, cert_pem: &[u8], key_pem: &[u8]) -> Result<(), PairingError>;
}

/// Verifier that loads the pair the way a TLS server would
///
/// The first certificate's public key must equal the public key derived from
/// the private key. Chain trust is not checked.
#[derive(Debug, Clone)]
pub struct RustlsVerifier {
    provider: Arc<CryptoProvider>,
}

impl RustlsVerifier {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }
}

impl Default for RustlsVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyPairVerifier for RustlsVerifier {
    fn verify(&self, cert_pem: &[u8], key_pem: &[u8]) -> Result<(), PairingError> {
        let certs = CertificateDer::pem_slice_iter(cert_pem)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PairingError::CertificateParse(e.to_string()))?;
        if certs.is_empty() {
            return Err(PairingError::NoCertificate);
        }

        let key = PrivateKeyDer::from_pem_slice(key_pem)
            .map_err(|e| PairingError::PrivateKeyParse(e.to_string()))?;

        let signing_key = self
            .provider
            .key_provider
            .load_private_key(key)
            .map_err(PairingError::UnsupportedKey)?;

        CertifiedKey::new(certs, signing_key)
            .keys_match()
            .map_err(PairingError::Mismatch)
    }
}

/// What the candidate file looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRole {
    PrivateKey,
    Certificate,
}

impl CandidateRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateRole::PrivateKey => "private-key",
            CandidateRole::Certificate => "certificate",
        }
    }
}

/// Classify file content by looking for the private key marker
#[must_use]
pub fn classify(content: &[u8]) -> CandidateRole {
    if content
        .windows(PRIVATE_KEY_MARKER.len())
        .any(|window| window == PRIVATE_KEY_MARKER)
    {
        CandidateRole::PrivateKey
    } else {
        CandidateRole::Certificate
    }
}

/// A file picked by the scanner, read fresh for this cycle
pub struct CertCandidate {
    pub path: PathBuf,
    pub content: Zeroizing<Vec<u8>>,
}

impl CertCandidate {
    /// Read the candidate from disk
    ///
    /// # Errors
    ///
    /// [`SyncError::Io`] if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read(path).map_err(|e| SyncError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            content: Zeroizing::new(content),
        })
    }

    pub fn role(&self) -> CandidateRole {
        classify(&self.content)
    }
}

impl fmt::Debug for CertCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertCandidate")
            .field("path", &self.path)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A certificate and private key that passed verification
///
/// Only [`resolve_pair`] creates one.
pub struct KeyPair {
    cert_path: PathBuf,
    key_path: PathBuf,
    cert: Vec<u8>,
    key: Zeroizing<Vec<u8>>,
}

impl KeyPair {
    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    pub fn cert(&self) -> &[u8] {
        &self.cert
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .finish_non_exhaustive()
    }
}

/// Outcome of the sibling search
#[derive(Debug)]
pub enum PairResolution {
    Matched(KeyPair),
    NoMatch {
        role: CandidateRole,
        /// Number of siblings that were read and tried
        tried: usize,
    },
}

/// Search `siblings` for the counterpart of `candidate`
///
/// Siblings that cannot be read are skipped. The candidate itself is tried
/// like any other entry, so a single file holding both certificate and key
/// pairs with itself.
pub fn resolve_pair(
    candidate: &CertCandidate,
    siblings: &[PathBuf],
    verifier: &dyn KeyPairVerifier,
) -> PairResolution {
    let role = candidate.role();
    let mut tried = 0;

    for sibling in siblings {
        let content = if *sibling == candidate.path {
            candidate.content.clone()
        } else {
            match std::fs::read(sibling) {
                Ok(content) => Zeroizing::new(content),
                Err(e) => {
                    debug!("skipping {}: {}", sibling.display(), e);
                    continue;
                }
            }
        };
        tried += 1;

        let (cert_path, cert, key_path, key) = match role {
            CandidateRole::PrivateKey => (sibling, content, &candidate.path, &candidate.content),
            CandidateRole::Certificate => {
                (&candidate.path, candidate.content.clone(), sibling, &content)
            }
        };

        match verifier.verify(&cert, key) {
            Ok(()) => {
                debug!("found cert {}", cert_path.display());
                debug!("found key {}", key_path.display());
                return PairResolution::Matched(KeyPair {
                    cert_path: cert_path.clone(),
                    key_path: key_path.clone(),
                    cert: cert.to_vec(),
                    key: key.clone(),
                });
            }
            Err(e) => {
                debug!(
                    "{} and {} are not a pair: {}",
                    cert_path.display(),
                    key_path.display(),
                    e
                );
            }
        }
    }

    PairResolution::NoMatch { role, tried }
}
