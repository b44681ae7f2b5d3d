//! Fault-injection component.

use hk_core::AgentId;

use crate::common::unknown_attribute;
use crate::error::{ComponentError, ComponentResult, StepError, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// How the injected fault manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Step returns an error.
    Error,
    /// Step succeeds but leaves a NaN output.
    Nan,
    /// Step panics.
    Panic,
}

/// Counts its steps in `value` and fails on step `fail_on_step` (1-based).
#[derive(Debug, Clone)]
pub struct Faulty {
    fail_on_step: u64,
    mode: FaultMode,
    steps: u64,
    value: f64,
    ports: Ports,
}

impl Faulty {
    pub const TYPE_TAG: &'static str = "faulty";

    pub fn new(fail_on_step: u64, mode: FaultMode) -> Self {
        Self {
            fail_on_step,
            mode,
            steps: 0,
            value: 0.0,
            ports: Ports::new(Vec::<String>::new(), ["value"]),
        }
    }

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["fail_on_step", "mode"]);
        let fail_on_step = reader.u64_opt("fail_on_step")?.unwrap_or(1);
        if fail_on_step == 0 {
            return Err(ComponentError::InvalidProperty {
                agent: id.to_string(),
                name: "fail_on_step".to_string(),
                reason: "steps are counted from 1".to_string(),
            });
        }
        let mode = match reader.str_opt("mode")?.unwrap_or("error") {
            "error" => FaultMode::Error,
            "nan" => FaultMode::Nan,
            "panic" => FaultMode::Panic,
            other => {
                return Err(ComponentError::InvalidProperty {
                    agent: id.to_string(),
                    name: "mode".to_string(),
                    reason: format!("unknown mode '{other}' (expected error, nan or panic)"),
                });
            }
        };
        Ok(Self::new(fail_on_step, mode))
    }
}

impl Steppable for Faulty {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "value").then_some(self.value)
    }

    fn set_attribute(&mut self, name: &str, _value: f64) -> StepResult<()> {
        Err(unknown_attribute(name))
    }

    fn step(&mut self, ctx: &StepContext<'_>, _inputs: &Inputs) -> StepResult<()> {
        self.steps += 1;
        if self.steps != self.fail_on_step {
            self.value = self.steps as f64;
            return Ok(());
        }
        match self.mode {
            FaultMode::Error => Err(StepError::failed(format!(
                "injected fault on step {} (tick {})",
                self.steps, ctx.tick
            ))),
            FaultMode::Nan => {
                self.value = f64::NAN;
                Ok(())
            }
            FaultMode::Panic => panic!("injected panic on step {}", self.steps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fails_on_configured_step() {
        let id = AgentId::new("bad");
        let props = json!({"fail_on_step": 3});
        let mut f = Faulty::from_properties(&id, props.as_object().unwrap()).unwrap();
        for tick in 0..2 {
            assert!(f.step(&StepContext::new(&id, tick, 1.0), &Inputs::new()).is_ok());
        }
        assert!(f.step(&StepContext::new(&id, 2, 1.0), &Inputs::new()).is_err());
    }

    #[test]
    fn rejects_unknown_mode() {
        let id = AgentId::new("bad");
        let props = json!({"mode": "explode"});
        assert!(Faulty::from_properties(&id, props.as_object().unwrap()).is_err());
    }
}
