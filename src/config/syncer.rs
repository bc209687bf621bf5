//! # Syncer Configuration
//!
//! The validated form of [`Args`]. Built once at startup; nothing downstream
//! re-parses flags.

use crate::cli::Args;
use crate::config::{parse_duration, ConfigError, SecretRef};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(ConfigError::InvalidLogFormat(value.to_string())),
        }
    }
}

/// Process-wide configuration resolved from the command line
#[derive(Debug, Clone)]
pub struct SyncerConfig {
    /// Address the metrics and probe endpoint binds to, as `host:port`
    pub listen_address: String,
    /// Tracing level directive
    pub log_level: String,
    pub log_format: LogFormat,
    /// Directory scanned for the certificate and key
    pub cert_path: PathBuf,
    /// Pattern matched against full file paths
    pub cert_pattern: Regex,
    /// Target Secret
    pub secret: SecretRef,
    pub sync_interval: Duration,
    /// Secret data key for the certificate
    pub cert_data_key: String,
    /// Secret data key for the private key
    pub key_data_key: String,
    /// Budget for draining the HTTP server on shutdown
    pub shutdown_timeout: Duration,
}

impl SyncerConfig {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for the first invalid value found.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let secret: SecretRef = args.secret.parse()?;

        let cert_pattern =
            Regex::new(&args.cert_regex).map_err(|source| ConfigError::InvalidPattern {
                pattern: args.cert_regex.clone(),
                source,
            })?;

        let sync_interval = parse_duration(&args.sync_interval).map_err(|e| {
            ConfigError::InvalidDuration {
                field: "--sync-interval",
                message: e.to_string(),
            }
        })?;

        let shutdown_timeout = parse_duration(&args.shutdown_timeout).map_err(|e| {
            ConfigError::InvalidDuration {
                field: "--shutdown-timeout",
                message: e.to_string(),
            }
        })?;

        if args.cert_data_key.trim().is_empty() {
            return Err(ConfigError::EmptyValue("--cert-data-key"));
        }
        if args.key_data_key.trim().is_empty() {
            return Err(ConfigError::EmptyValue("--key-data-key"));
        }
        if args.log_level.trim().is_empty() {
            return Err(ConfigError::EmptyValue("--log-level"));
        }

        Ok(Self {
            listen_address: parse_listen_address(&args.listen_address)?,
            log_level: args.log_level.trim().to_lowercase(),
            log_format: args.log_format.parse()?,
            cert_path: args.cert_path.clone(),
            cert_pattern,
            secret,
            sync_interval,
            cert_data_key: args.cert_data_key.clone(),
            key_data_key: args.key_data_key.clone(),
            shutdown_timeout,
        })
    }
}

/// Normalize a `host:port` listen address, treating `:port` as all interfaces
///
/// The host may be a name; it is resolved when the server binds.
pub fn parse_listen_address(address: &str) -> Result<String, ConfigError> {
    let trimmed = address.trim();
    let full = if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    };

    let invalid = |reason: &'static str| ConfigError::InvalidListenAddress {
        address: address.to_string(),
        reason,
    };

    let (host, port) = full.rsplit_once(':').ok_or_else(|| invalid("expected <host>:<port>"))?;
    if host.is_empty() {
        return Err(invalid("host must not be empty"));
    }
    if port.parse::<u16>().is_err() {
        return Err(invalid("port must be a number between 0 and 65535"));
    }

    Ok(full)
}
