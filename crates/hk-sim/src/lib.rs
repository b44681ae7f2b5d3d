//! Tick-driven execution kernel for hydrokernel topologies.
//!
//! Provides:
//! - Staged scheduler with same-tick and previous-tick propagation
//! - Per-agent fault isolation (errors, non-finite outputs, panics)
//! - Append-only data logger with tabular export
//! - Scheduled attribute events and cooperative cancellation

pub mod cancel;
pub mod error;
pub mod fault;
pub mod guard;
pub mod logger;
pub mod scheduler;

// Re-exports for public API
pub use cancel::CancelToken;
pub use error::{SimError, SimResult};
pub use fault::{AgentState, FailedSourcePolicy, FaultEvent, FaultKind};
pub use guard::{StepOutcome, guarded_step};
pub use logger::{DataLogger, LogRecord, LogRow, LogTable, LoggerConfig};
pub use scheduler::{EventError, RunReport, ScheduledEvent, Scheduler, SchedulerOptions, SimProgress};
