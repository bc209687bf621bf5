//! # Constants
//!
//! Shared defaults used throughout the syncer.
//!
//! Every value here can be overridden from the command line or the matching
//! environment variable (see [`crate::cli::Args`]).

/// Default address for the metrics and probe endpoint.
/// A leading `:` binds all interfaces.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log format (`json` or `text`)
pub const DEFAULT_LOG_FORMAT: &str = "json";

/// Default directory searched for the certificate and key
pub const DEFAULT_CERT_PATH: &str = "/etc/kubernetes/ssl";

/// Default pattern matched against full file paths.
/// Only the first match in directory listing order is used.
pub const DEFAULT_CERT_REGEX: &str = "kube-etcd.*.pem";

/// Default target Secret, `<namespace>/<name>`
pub const DEFAULT_SECRET: &str = "monitoring/etcd-cert";

/// Separator between namespace and name in the target Secret reference
pub const SECRET_REF_SEPARATOR: char = '/';

/// Default interval between sync cycles
pub const DEFAULT_SYNC_INTERVAL: &str = "2m";

/// Default Secret data key holding the certificate
pub const DEFAULT_CERT_DATA_KEY: &str = "cert.pem";

/// Default Secret data key holding the private key
pub const DEFAULT_KEY_DATA_KEY: &str = "key.pem";

/// Default budget for draining the HTTP server on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: &str = "10s";

/// Marker used to classify a candidate file as a private key
pub const PRIVATE_KEY_MARKER: &[u8] = b"PRIVATE KEY";
