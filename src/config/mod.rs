//! # Configuration
//!
//! Startup configuration, validated once before anything runs.
//!
//! - `syncer`: the validated [`SyncerConfig`] built from command-line flags
//! - `secret_ref`: parsing of the `<namespace>/<name>` target
//! - `duration`: parsing of interval strings such as `2m`
//!
//! Any failure here is a [`ConfigError`] and stops the process before the
//! first sync cycle.

pub mod duration;
pub mod secret_ref;
pub mod syncer;

pub use duration::parse_duration;
pub use secret_ref::SecretRef;
pub use syncer::{LogFormat, SyncerConfig};

use thiserror::Error;

/// Malformed startup configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--secret must be <namespace>/<secretname>, got '{0}'")]
    InvalidSecretRef(String),

    #[error("invalid --cert-regex '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid duration for {field}: {message}")]
    InvalidDuration { field: &'static str, message: String },

    #[error("invalid --listen-address '{address}': {reason}")]
    InvalidListenAddress {
        address: String,
        reason: &'static str,
    },

    #[error("invalid --log-format '{0}', expected 'json' or 'text'")]
    InvalidLogFormat(String),

    #[error("{0} must not be empty")]
    EmptyValue(&'static str),
}
