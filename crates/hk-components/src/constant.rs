//! Constant signal source.

use hk_core::AgentId;

use crate::common::{check_finite, unknown_attribute};
use crate::error::{ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// Emits a fixed `output`. The value is a writable parameter so scheduled
/// events can change it mid-run.
#[derive(Debug, Clone)]
pub struct Constant {
    value: f64,
    ports: Ports,
}

impl Constant {
    pub const TYPE_TAG: &'static str = "constant";

    pub fn new(value: f64) -> Self {
        Self {
            value,
            ports: Ports::new(Vec::<String>::new(), ["output"]).with_parameters(["value"]),
        }
    }

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["value"]);
        Ok(Self::new(reader.f64("value")?))
    }
}

impl Steppable for Constant {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "output" | "value" => Some(self.value),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> StepResult<()> {
        match name {
            "output" | "value" => {
                self.value = check_finite(value, "value")?;
                Ok(())
            }
            _ => Err(unknown_attribute(name)),
        }
    }

    fn step(&mut self, _ctx: &StepContext<'_>, _inputs: &Inputs) -> StepResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_holds_value_across_steps() {
        let id = AgentId::new("A");
        let mut c = Constant::new(5.0);
        for tick in 0..3 {
            c.step(&StepContext::new(&id, tick, 1.0), &Inputs::new())
                .unwrap();
            assert_eq!(c.attribute("output"), Some(5.0));
        }
    }

    #[test]
    fn value_is_writable() {
        let mut c = Constant::new(1.0);
        c.set_attribute("value", 7.0).unwrap();
        assert_eq!(c.attribute("output"), Some(7.0));
        assert!(c.set_attribute("value", f64::NAN).is_err());
        assert!(c.set_attribute("level", 1.0).is_err());
    }
}
