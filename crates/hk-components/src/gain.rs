//! Affine gain: `output = gain * input + bias`.

use hk_core::AgentId;

use crate::common::{check_finite, unknown_attribute};
use crate::error::{ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

#[derive(Debug, Clone)]
pub struct Gain {
    pub gain: f64,
    pub bias: f64,
    output: f64,
    ports: Ports,
}

impl Gain {
    pub const TYPE_TAG: &'static str = "gain";

    pub fn new(gain: f64, bias: f64) -> Self {
        Self {
            gain,
            bias,
            output: 0.0,
            ports: Ports::new(["input"], ["output"]).with_parameters(["gain", "bias"]),
        }
    }

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["gain", "bias"]);
        Ok(Self::new(reader.f64_or("gain", 1.0)?, reader.f64_or("bias", 0.0)?))
    }
}

impl Steppable for Gain {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "output" => Some(self.output),
            "gain" => Some(self.gain),
            "bias" => Some(self.bias),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> StepResult<()> {
        let value = check_finite(value, name)?;
        match name {
            "output" => self.output = value,
            "gain" => self.gain = value,
            "bias" => self.bias = value,
            _ => return Err(unknown_attribute(name)),
        }
        Ok(())
    }

    fn step(&mut self, _ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()> {
        let input = inputs.require("input")?;
        self.output = self.gain * input + self.bias;
        Ok(())
    }
}
