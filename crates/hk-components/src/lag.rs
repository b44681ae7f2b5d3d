//! First-order lag with optional rate limiting.

use hk_core::AgentId;

use crate::common::unknown_attribute;
use crate::error::{ComponentError, ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// Dynamics: `d(out)/dt = (input - out) / tau`, clamped to
/// `[-rate_limit, rate_limit]`, advanced with explicit Euler.
///
/// Models actuator travel (e.g. a valve following its command).
#[derive(Debug, Clone)]
pub struct Lag {
    pub tau: f64,
    pub rate_limit: f64,
    output: f64,
    ports: Ports,
}

impl Lag {
    pub const TYPE_TAG: &'static str = "lag";

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["tau", "rate_limit", "initial"]);
        let tau = reader.f64("tau")?;
        if tau <= 0.0 {
            return Err(ComponentError::InvalidProperty {
                agent: id.to_string(),
                name: "tau".to_string(),
                reason: "tau must be positive".to_string(),
            });
        }
        let rate_limit = reader.f64_or("rate_limit", f64::INFINITY)?;
        if rate_limit <= 0.0 {
            return Err(ComponentError::InvalidProperty {
                agent: id.to_string(),
                name: "rate_limit".to_string(),
                reason: "rate_limit must be positive".to_string(),
            });
        }
        Ok(Self {
            tau,
            rate_limit,
            output: reader.f64_or("initial", 0.0)?,
            ports: Ports::new(["input"], ["output"]),
        })
    }

    fn rate(&self, command: f64) -> f64 {
        ((command - self.output) / self.tau).clamp(-self.rate_limit, self.rate_limit)
    }
}

impl Steppable for Lag {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "output" => Some(self.output),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> StepResult<()> {
        match name {
            "output" => {
                self.output = value;
                Ok(())
            }
            _ => Err(unknown_attribute(name)),
        }
    }

    fn step(&mut self, ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()> {
        let command = inputs.require("input")?;
        let next = self.output + self.rate(command) * ctx.dt;
        // Explicit Euler overshoots once dt > tau; never step past the command.
        self.output = if (command - self.output).signum() != (command - next).signum() {
            command
        } else {
            next
        };
        Ok(())
    }
}
