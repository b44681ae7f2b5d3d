//! Step counter used for smoke tests and as a heartbeat.

use hk_core::AgentId;

use crate::common::unknown_attribute;
use crate::error::{ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

#[derive(Debug, Clone)]
pub struct Dummy {
    count: u64,
    ports: Ports,
}

impl Dummy {
    pub const TYPE_TAG: &'static str = "dummy";

    pub fn new() -> Self {
        Self {
            count: 0,
            ports: Ports::new(Vec::<String>::new(), ["count"]),
        }
    }

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        PropertyReader::new(id, props).warn_unknown(&[]);
        Ok(Self::new())
    }
}

impl Default for Dummy {
    fn default() -> Self {
        Self::new()
    }
}

impl Steppable for Dummy {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "count").then_some(self.count as f64)
    }

    fn set_attribute(&mut self, name: &str, _value: f64) -> StepResult<()> {
        Err(unknown_attribute(name))
    }

    fn step(&mut self, _ctx: &StepContext<'_>, _inputs: &Inputs) -> StepResult<()> {
        self.count += 1;
        Ok(())
    }
}
