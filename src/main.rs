//! # Cert Secret Syncer
//!
//! Keeps a Kubernetes Secret in sync with a TLS certificate and private key
//! found on the local filesystem, typically a control-plane node's
//! `/etc/kubernetes/ssl` directory.
//!
//! ## Overview
//!
//! Every sync interval the syncer:
//!
//! 1. **Scans the directory** - Picks the first file whose path matches `--cert-regex`
//! 2. **Finds the pair** - Looks through the same directory for the matching certificate or key
//! 3. **Publishes** - Creates the target Secret, or updates it in place
//!
//! A failed cycle is logged and retried on the next tick. SIGINT and SIGTERM
//! stop the schedule after the in-flight cycle completes.

use anyhow::Result;
use cert_secret_syncer::cli::Args;
use cert_secret_syncer::runtime::{initialize, lifecycle};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let init = initialize(&args).await?;

    lifecycle::run(init).await
}
