//! Shared application service layer for hydrokernel.
//!
//! This crate provides a unified interface for the CLI and the network
//! server, centralizing config loading, topology compilation, simulation
//! execution with run caching, and result querying.

pub mod compile;
pub mod config_service;
pub mod context;
pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use compile::{CompiledRun, RunGate, build_topology, compile_config, resolve_properties};
pub use config_service::{ConfigSummary, describe_order, load_config, summarize, validate_config};
pub use context::AppContext;
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use query::{RunSummary, extract_series, get_run_summary, list_agent_ids};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    list_runs, load_run,
};

/// Version stamped into run ids and manifests.
pub const KERNEL_VERSION: &str = env!("CARGO_PKG_VERSION");
