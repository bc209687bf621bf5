//! # Command Line
//!
//! Flags accepted by the `cert-secret-syncer` binary.
//!
//! Every flag can also be supplied through an environment variable so the
//! syncer can be configured from a Deployment or DaemonSet without rewriting
//! its arguments.
//!
//! ```bash
//! cert-secret-syncer \
//!     --cert-path /etc/kubernetes/ssl \
//!     --cert-regex 'kube-etcd.*\.pem' \
//!     --secret monitoring/etcd-cert
//! ```

use crate::constants::{
    DEFAULT_CERT_DATA_KEY, DEFAULT_CERT_PATH, DEFAULT_CERT_REGEX, DEFAULT_KEY_DATA_KEY,
    DEFAULT_LISTEN_ADDRESS, DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, DEFAULT_SECRET,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_SYNC_INTERVAL,
};
use clap::Parser;
use std::path::PathBuf;

/// Copies a TLS certificate/key pair from local disk into a Kubernetes Secret
#[derive(Parser, Debug, Clone)]
#[command(name = "cert-secret-syncer", version, about, long_about = None)]
pub struct Args {
    /// The address to listen on for HTTP metrics and probe requests
    #[arg(long, env = "LISTEN_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Log format (json, text)
    #[arg(long, env = "LOG_FORMAT", default_value = DEFAULT_LOG_FORMAT)]
    pub log_format: String,

    /// The directory to look in for the certificate and key
    #[arg(long, env = "CERT_PATH", default_value = DEFAULT_CERT_PATH)]
    pub cert_path: PathBuf,

    /// Regular expression matched against full file paths in cert-path.
    /// Only the first match is used.
    #[arg(long, env = "CERT_REGEX", default_value = DEFAULT_CERT_REGEX)]
    pub cert_regex: String,

    /// Target Secret as <namespace>/<name>
    #[arg(long, env = "SECRET", default_value = DEFAULT_SECRET)]
    pub secret: String,

    /// Interval between sync cycles (e.g. 30s, 2m, 1h)
    #[arg(long, env = "SYNC_INTERVAL", default_value = DEFAULT_SYNC_INTERVAL)]
    pub sync_interval: String,

    /// Secret data key the certificate is stored under
    #[arg(long, env = "CERT_DATA_KEY", default_value = DEFAULT_CERT_DATA_KEY)]
    pub cert_data_key: String,

    /// Secret data key the private key is stored under
    #[arg(long, env = "KEY_DATA_KEY", default_value = DEFAULT_KEY_DATA_KEY)]
    pub key_data_key: String,

    /// How long the HTTP server may take to drain on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value = DEFAULT_SHUTDOWN_TIMEOUT)]
    pub shutdown_timeout: String,
}
