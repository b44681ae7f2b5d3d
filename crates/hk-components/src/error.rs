//! Error types for component construction and stepping.

use thiserror::Error;

/// Errors raised while constructing a component from its properties.
///
/// These surface as configuration errors in the build phase, before any
/// tick runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Unknown component type '{tag}'")]
    UnknownType { tag: String },

    #[error("Component type '{tag}' is already registered")]
    DuplicateType { tag: String },

    #[error("Agent '{agent}': missing required property '{name}'")]
    MissingProperty { agent: String, name: String },

    #[error("Agent '{agent}': invalid property '{name}': {reason}")]
    InvalidProperty {
        agent: String,
        name: String,
        reason: String,
    },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

/// Failure of a single agent step or attribute write.
///
/// The scheduler never lets one of these escape the tick loop; it is turned
/// into a fault event and the agent is retired for the rest of the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error("Required input '{name}' is unavailable")]
    MissingInput { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: String, value: f64 },

    #[error("{message}")]
    Failed { message: String },
}

impl StepError {
    pub fn failed(message: impl Into<String>) -> Self {
        StepError::Failed {
            message: message.into(),
        }
    }
}

pub type StepResult<T> = Result<T, StepError>;
