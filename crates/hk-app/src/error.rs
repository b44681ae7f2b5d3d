//! Error types for the hk-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// provides one error surface for the CLI and the server.
///
/// Build-phase errors keep their original type so callers can tell a cycle
/// from a bad reference.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file {path}: {message}")]
    ConfigFileRead { path: PathBuf, message: String },

    #[error(transparent)]
    Project(#[from] hk_project::ProjectError),

    #[error(transparent)]
    Graph(#[from] hk_graph::GraphError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] hk_sim::SimError),

    #[error("Results error: {0}")]
    Results(#[from] hk_results::ResultsError),

    #[error("No run store configured")]
    NoStore,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hk-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for same-tick dependency cycles found while ordering.
    pub fn is_cyclic(&self) -> bool {
        matches!(self, AppError::Graph(err) if err.is_cyclic())
    }

    /// True when the config itself is at fault (as opposed to storage or
    /// an internal failure).
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AppError::ConfigFileRead { .. }
                | AppError::Project(_)
                | AppError::Graph(_)
                | AppError::InvalidInput(_)
        )
    }
}

impl From<hk_graph::ConfigError> for AppError {
    fn from(err: hk_graph::ConfigError) -> Self {
        AppError::Graph(err.into())
    }
}

impl From<hk_core::KernelError> for AppError {
    fn from(err: hk_core::KernelError) -> Self {
        AppError::Graph(hk_graph::ConfigError::from(err).into())
    }
}
