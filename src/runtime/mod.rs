//! # Runtime
//!
//! Startup, periodic scheduling and shutdown of the syncer process.
//!
//! - `initialization`: builds config, logging, metrics and the sync pipeline
//! - `scheduler`: runs the sync cycle at startup and on every interval tick
//! - `error_policy`: decides what a failed cycle means
//! - `shutdown`: the process-wide stop signal
//! - `lifecycle`: wires the scheduler and HTTP server to OS signals

pub mod error_policy;
pub mod initialization;
pub mod lifecycle;
pub mod scheduler;
pub mod shutdown;

pub use error_policy::{CycleDecision, ErrorPolicy};
pub use initialization::{initialize, InitializationResult};
pub use scheduler::{Scheduler, SchedulerReport, SchedulerState};
pub use shutdown::{Shutdown, ShutdownSignal};
