//! Running integral of the input over simulation time.

use hk_core::AgentId;

use crate::common::{check_finite, unknown_attribute};
use crate::error::{ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// `output += input * dt` each tick, optionally clamped to `[min, max]`.
///
/// Useful as a storage volume fed by a net flow.
#[derive(Debug, Clone)]
pub struct Accumulator {
    output: f64,
    min: f64,
    max: f64,
    ports: Ports,
}

impl Accumulator {
    pub const TYPE_TAG: &'static str = "accumulator";

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["initial", "min", "max"]);
        let min = reader.f64_or("min", f64::NEG_INFINITY)?;
        let max = reader.f64_or("max", f64::INFINITY)?;
        if min > max {
            return Err(crate::ComponentError::InvalidProperty {
                agent: id.to_string(),
                name: "min".to_string(),
                reason: "min must not exceed max".to_string(),
            });
        }
        let initial = reader.f64_or("initial", 0.0)?.clamp(min, max);
        Ok(Self {
            output: initial,
            min,
            max,
            ports: Ports::new(["input"], ["output"]),
        })
    }
}

impl Steppable for Accumulator {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "output").then_some(self.output)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> StepResult<()> {
        match name {
            "output" => {
                self.output = check_finite(value, "output")?.clamp(self.min, self.max);
                Ok(())
            }
            _ => Err(unknown_attribute(name)),
        }
    }

    fn step(&mut self, ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()> {
        let rate = inputs.require("input")?;
        self.output = (self.output + rate * ctx.dt).clamp(self.min, self.max);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integrates_and_clamps() {
        let id = AgentId::new("tank");
        let props = json!({"initial": 1.0, "min": 0.0, "max": 2.0});
        let mut acc = Accumulator::from_properties(&id, props.as_object().unwrap()).unwrap();
        let inputs: Inputs = [("input", 0.4)].into_iter().collect();
        acc.step(&StepContext::new(&id, 0, 0.5), &inputs).unwrap();
        assert!((acc.attribute("output").unwrap() - 1.2).abs() < 1e-12);
        for tick in 1..10 {
            acc.step(&StepContext::new(&id, tick, 0.5), &inputs).unwrap();
        }
        assert_eq!(acc.attribute("output"), Some(2.0));
    }
}
