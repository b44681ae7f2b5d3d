//! Replays a fixed sequence of values, one per tick.

use hk_core::AgentId;

use crate::common::unknown_attribute;
use crate::error::{ComponentError, ComponentResult, StepError, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// Time-series source (rainfall, demand profiles, ...).
///
/// The values come from the `values` property; configurations may instead
/// name a shared dataset, which the compile step inlines into `values`
/// before construction. Past the end of the series the last value is held,
/// unless `hold` is false, in which case the step fails.
#[derive(Debug, Clone)]
pub struct Series {
    values: Vec<f64>,
    hold: bool,
    output: f64,
    ports: Ports,
}

impl Series {
    pub const TYPE_TAG: &'static str = "series";

    pub fn new(values: Vec<f64>, hold: bool) -> Option<Self> {
        let first = *values.first()?;
        Some(Self {
            values,
            hold,
            output: first,
            ports: Ports::new(Vec::<String>::new(), ["output"]),
        })
    }

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["values", "hold", "dataset"]);
        let values = match reader.f64_list_opt("values")? {
            Some(values) => values,
            None => {
                let reason = match reader.str_opt("dataset")? {
                    Some(name) => format!("dataset '{name}' was not resolved"),
                    None => "either 'values' or 'dataset' is required".to_string(),
                };
                return Err(ComponentError::InvalidProperty {
                    agent: id.to_string(),
                    name: "values".to_string(),
                    reason,
                });
            }
        };
        let hold = reader.bool_or("hold", true)?;
        Self::new(values, hold).ok_or_else(|| ComponentError::InvalidProperty {
            agent: id.to_string(),
            name: "values".to_string(),
            reason: "series must not be empty".to_string(),
        })
    }
}

impl Steppable for Series {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "output").then_some(self.output)
    }

    fn set_attribute(&mut self, name: &str, _value: f64) -> StepResult<()> {
        Err(unknown_attribute(name))
    }

    fn step(&mut self, ctx: &StepContext<'_>, _inputs: &Inputs) -> StepResult<()> {
        let index = ctx.tick as usize;
        self.output = match self.values.get(index) {
            Some(v) => *v,
            None if self.hold => self.values[self.values.len() - 1],
            None => {
                return Err(StepError::failed(format!(
                    "series exhausted after {} values",
                    self.values.len()
                )));
            }
        };
        Ok(())
    }
}
