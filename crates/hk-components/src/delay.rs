//! Unit delay: emits the input it received on the previous tick.

use hk_core::AgentId;

use crate::common::unknown_attribute;
use crate::error::{ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

#[derive(Debug, Clone)]
pub struct Delay {
    held: f64,
    output: f64,
    ports: Ports,
}

impl Delay {
    pub const TYPE_TAG: &'static str = "delay";

    pub fn new(initial: f64) -> Self {
        Self {
            held: initial,
            output: initial,
            ports: Ports::new(["input"], ["output"]),
        }
    }

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["initial"]);
        Ok(Self::new(reader.f64_or("initial", 0.0)?))
    }
}

impl Steppable for Delay {
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
                self.output = value;
                self.held = value;
                Ok(())
            }
            _ => Err(unknown_attribute(name)),
        }
    }

    fn step(&mut self, _ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()> {
        let input = inputs.require("input")?;
        self.output = self.held;
        self.held = input;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_lags_input_by_one_tick() {
        let id = AgentId::new("d");
        let mut d = Delay::new(-1.0);
        let mut seen = Vec::new();
        for (tick, x) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            let inputs: Inputs = [("input", x)].into_iter().collect();
            d.step(&StepContext::new(&id, tick as u64, 1.0), &inputs)
                .unwrap();
            seen.push(d.attribute("output").unwrap());
        }
        assert_eq!(seen, vec![-1.0, 1.0, 2.0]);
    }
}
