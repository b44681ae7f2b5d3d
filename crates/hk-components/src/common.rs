//! Small helpers shared by the stock components.

use crate::error::{StepError, StepResult};

/// Reject NaN/inf before it leaks into downstream inputs.
pub(crate) fn check_finite(value: f64, what: &str) -> StepResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StepError::NonFinite {
            what: what.to_string(),
            value,
        })
    }
}

pub(crate) fn unknown_attribute(name: &str) -> StepError {
    StepError::UnknownAttribute {
        name: name.to_string(),
    }
}
