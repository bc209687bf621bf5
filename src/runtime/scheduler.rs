//! # Scheduler
//!
//! Runs the sync cycle once at startup and then on a fixed interval until
//! shutdown.
//!
//! Cycles never overlap: the next tick is only awaited after the current
//! cycle returns. The shutdown signal is only observed between cycles, so a
//! cycle that has started always runs to completion.

use crate::observability::metrics;
use crate::runtime::error_policy::{CycleDecision, ErrorPolicy};
use crate::runtime::shutdown::ShutdownSignal;
use crate::sync::{PublishOutcome, SyncCycle};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Counters returned when the scheduler stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    pub cycles: u64,
    pub failures: u64,
}

/// Periodic runner for a [`SyncCycle`]
///
/// State changes are published on a watch channel so they can be observed
/// while [`Scheduler::run`] holds the scheduler.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    policy: ErrorPolicy,
    state: watch::Sender<SchedulerState>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        let (state, _rx) = watch::channel(SchedulerState::Idle);
        Self {
            interval,
            policy: ErrorPolicy::default(),
            state,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Receiver that follows the scheduler through `Idle`, `Running` and `Stopped`
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.send_replace(state);
    }

    /// Run until `shutdown` fires or the error policy says stop
    pub async fn run(
        &mut self,
        cycle: &dyn SyncCycle,
        mut shutdown: ShutdownSignal,
    ) -> SchedulerReport {
        let mut report = SchedulerReport::default();

        if shutdown.is_triggered() {
            self.set_state(SchedulerState::Stopped);
            return report;
        }

        info!("Starting periodic sync every {}s", self.interval.as_secs());

        if self.tick(cycle, &mut report).await == CycleDecision::Continue {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = shutdown.wait() => {
                        info!("Shutdown requested, stopping periodic sync");
                        break;
                    }
                    _ = ticker.tick() => {
                        if self.tick(cycle, &mut report).await == CycleDecision::Stop {
                            break;
                        }
                    }
                }
            }
        }

        self.set_state(SchedulerState::Stopped);
        info!(
            cycles = report.cycles,
            failures = report.failures,
            "Periodic sync stopped"
        );
        report
    }

    async fn tick(&self, cycle: &dyn SyncCycle, report: &mut SchedulerReport) -> CycleDecision {
        self.set_state(SchedulerState::Running);
        metrics::increment_sync_cycles();
        let started = Instant::now();

        let result = cycle.run_once().await;

        metrics::observe_sync_duration(started.elapsed().as_secs_f64());
        report.cycles += 1;
        self.set_state(SchedulerState::Idle);

        match result {
            Ok(outcome) => {
                metrics::set_last_success_timestamp(chrono::Utc::now().timestamp());
                match outcome {
                    PublishOutcome::Created { resource_version } => info!(
                        resource_version = resource_version.as_deref().unwrap_or(""),
                        "Created secret with synced certificate"
                    ),
                    PublishOutcome::Updated {
                        previous_version,
                        resource_version,
                    } => debug!(
                        previous_version = previous_version.as_deref().unwrap_or(""),
                        resource_version = resource_version.as_deref().unwrap_or(""),
                        "Updated secret with synced certificate"
                    ),
                }
                CycleDecision::Continue
            }
            Err(e) => {
                report.failures += 1;
                self.policy.handle(&e)
            }
        }
    }
}
