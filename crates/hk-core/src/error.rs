use thiserror::Error;

pub type KernelResult<T> = Result<T, KernelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Malformed attribute reference '{reference}': expected \"agentId.attribute\"")]
    MalformedAttrRef { reference: String },

    #[error("Invalid agent id '{id}': {reason}")]
    InvalidAgentId { id: String, reason: &'static str },
}
