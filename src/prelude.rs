//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use cert_secret_syncer::prelude::*;
//! ```

pub use crate::config::{ConfigError, SecretRef, SyncerConfig};

pub use crate::provider::{CredentialRecord, CredentialStore, StoreError, StoreOperation};

pub use crate::sync::{
    KeyPair, KeyPairVerifier, PublishOutcome, RustlsVerifier, SyncCycle, SyncError, SyncPipeline,
};

pub use crate::runtime::{ErrorPolicy, Scheduler, SchedulerReport, Shutdown, ShutdownSignal};
