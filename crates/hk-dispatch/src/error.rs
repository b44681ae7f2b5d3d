//! Error types for decision correlation.

use thiserror::Error;

/// A decision response that could not be matched to a pending request.
///
/// Never fatal: callers log it and report a rejection to the sender.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecisionCorrelationError {
    #[error("No decision request with id '{request_id}'")]
    UnknownRequest { request_id: String },

    #[error("Decision request '{request_id}' has already expired")]
    Expired { request_id: String },
}

pub type DispatchResult<T> = Result<T, DecisionCorrelationError>;
