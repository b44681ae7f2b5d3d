//! Error types for simulation operations.

use hk_core::KernelError;
use thiserror::Error;

/// Errors that abort a run before (or instead of) ticking.
///
/// Agent failures are not here: they are isolated per agent and reported as
/// [`crate::FaultEvent`]s.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Event target '{target}' does not name an agent")]
    UnknownEventTarget { target: String },

    #[error("Log tick {tick} is not after the last recorded tick {last}")]
    LogOutOfOrder { tick: u64, last: u64 },

    #[error("CSV export failed: {message}")]
    Csv { message: String },
}

impl From<csv::Error> for SimError {
    fn from(err: csv::Error) -> Self {
        SimError::Csv {
            message: err.to_string(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
