//! Cert Secret Syncer Library
//!
//! Core functionality for the cert-secret-syncer: find a certificate file on
//! disk, locate the private key that pairs with it, and keep a Kubernetes
//! Secret in sync with the pair.
//!
//! ## Quick Start
//!
//! ```rust
//! use cert_secret_syncer::prelude::*;
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod server;
pub mod sync;
