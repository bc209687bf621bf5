//! # Metrics
//!
//! Prometheus metrics for monitoring the syncer.
//!
//! ## Metrics Exposed
//!
//! - `cert_syncer_sync_cycles_total` - Total number of sync cycles started
//! - `cert_syncer_sync_errors_total` - Failed sync cycles, labelled by error kind
//! - `cert_syncer_sync_duration_seconds` - Duration of sync cycles
//! - `cert_syncer_secret_writes_total` - Secret writes, labelled by operation (create/update)
//! - `cert_syncer_last_success_timestamp_seconds` - Unix time of the last successful cycle

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, IntGauge, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static SYNC_CYCLES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cert_syncer_sync_cycles_total",
        "Total number of sync cycles started",
    )
    .expect("Failed to create SYNC_CYCLES_TOTAL metric - this should never happen")
});

static SYNC_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cert_syncer_sync_errors_total",
            "Total number of failed sync cycles by error kind",
        ),
        &["kind"],
    )
    .expect("Failed to create SYNC_ERRORS_TOTAL metric - this should never happen")
});

static SYNC_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "cert_syncer_sync_duration_seconds",
            "Duration of sync cycles in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create SYNC_DURATION metric - this should never happen")
});

static SECRET_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cert_syncer_secret_writes_total",
            "Total number of Secret writes by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create SECRET_WRITES_TOTAL metric - this should never happen")
});

static LAST_SUCCESS_TIMESTAMP: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "cert_syncer_last_success_timestamp_seconds",
        "Unix timestamp of the last successful sync cycle",
    )
    .expect("Failed to create LAST_SUCCESS_TIMESTAMP metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SYNC_CYCLES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNC_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNC_DURATION.clone()))?;
    REGISTRY.register(Box::new(SECRET_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LAST_SUCCESS_TIMESTAMP.clone()))?;

    Ok(())
}

/// Snapshot of every registered metric family
pub fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}

pub fn increment_sync_cycles() {
    SYNC_CYCLES_TOTAL.inc();
}

pub fn increment_sync_errors(kind: &str) {
    SYNC_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn observe_sync_duration(duration: f64) {
    SYNC_DURATION.observe(duration);
}

pub fn increment_secret_writes(operation: &str) {
    SECRET_WRITES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn set_last_success_timestamp(timestamp: i64) {
    LAST_SUCCESS_TIMESTAMP.set(timestamp);
}
