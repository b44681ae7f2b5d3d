//! Fault boundary around a single agent step.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use hk_components::{Inputs, StepContext, Steppable};

use crate::fault::FaultKind;

/// Result of one guarded step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Completed,
    Faulted { kind: FaultKind, message: String },
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed)
    }
}

/// Run `agent.step` and classify the result.
///
/// A panic is caught at this boundary. The agent may be left half-updated
/// in that case; the caller retires it, so its state is never read again.
pub fn guarded_step(
    agent: &mut dyn Steppable,
    ctx: &StepContext<'_>,
    inputs: &Inputs,
) -> StepOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| agent.step(ctx, inputs)));

    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            return StepOutcome::Faulted {
                kind: FaultKind::StepFailed,
                message: err.to_string(),
            };
        }
        Err(payload) => {
            return StepOutcome::Faulted {
                kind: FaultKind::Panicked,
                message: panic_message(payload.as_ref()),
            };
        }
    }

    for output in &agent.ports().outputs {
        if let Some(value) = agent.attribute(output)
            && !value.is_finite()
        {
            return StepOutcome::Faulted {
                kind: FaultKind::NonFiniteOutput,
                message: format!("output '{output}' is {value}"),
            };
        }
    }

    StepOutcome::Completed
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
