//! # Lifecycle
//!
//! Starts the HTTP server and the scheduler, blocks until SIGINT/SIGTERM,
//! then waits for the in-flight cycle and drains the server.

use crate::runtime::initialization::InitializationResult;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::shutdown::{wait_for_os_signal, Shutdown};
use crate::server::start_server;
use anyhow::{Context, Result};
use tracing::{error, info, warn};

/// Run until an OS shutdown signal arrives
///
/// # Errors
///
/// Fails if the scheduler task panicked.
pub async fn run(init: InitializationResult) -> Result<()> {
    let InitializationResult {
        config,
        pipeline,
        server_state,
    } = init;
    let shutdown = Shutdown::new();

    let server_signal = shutdown.signal();
    let listen_address = config.listen_address.clone();
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(&listen_address, server_state, server_signal).await {
            error!("HTTP server error: {:#}", e);
        }
    });

    let scheduler_signal = shutdown.signal();
    let interval = config.sync_interval;
    let scheduler_handle = tokio::spawn(async move {
        let mut scheduler = Scheduler::new(interval);
        scheduler.run(&pipeline, scheduler_signal).await
    });

    wait_for_os_signal().await;
    info!("Initiating graceful shutdown, waiting for in-flight sync to complete...");
    shutdown.trigger();

    let report = scheduler_handle
        .await
        .context("Sync scheduler task failed")?;
    info!(
        "Sync scheduler stopped after {} cycles ({} failed)",
        report.cycles, report.failures
    );

    match tokio::time::timeout(config.shutdown_timeout, &mut server_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("HTTP server task failed: {}", e),
        Err(_) => {
            warn!(
                "HTTP server did not drain within {}s, aborting",
                config.shutdown_timeout.as_secs()
            );
            server_handle.abort();
        }
    }

    info!("Shutdown complete");
    Ok(())
}
