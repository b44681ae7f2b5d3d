//! Weighted sum of named inputs.

use hk_core::AgentId;

use crate::common::unknown_attribute;
use crate::error::{ComponentError, ComponentResult, StepResult};
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// `output = Σ weights[i] * inputs[i]`. Input names come from the `inputs`
/// property (default `a`, `b`); weights default to 1.
#[derive(Debug, Clone)]
pub struct Sum {
    weights: Vec<f64>,
    output: f64,
    ports: Ports,
}

impl Sum {
    pub const TYPE_TAG: &'static str = "sum";

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["inputs", "weights"]);

        let names = reader
            .string_list_opt("inputs")?
            .unwrap_or_else(|| vec!["a".to_string(), "b".to_string()]);
        if names.is_empty() {
            return Err(ComponentError::InvalidProperty {
                agent: id.to_string(),
                name: "inputs".to_string(),
                reason: "at least one input is required".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(ComponentError::InvalidProperty {
                agent: id.to_string(),
                name: "inputs".to_string(),
                reason: format!("duplicate input name '{dup}'"),
            });
        }

        let weights = match reader.f64_list_opt("weights")? {
            Some(w) if w.len() != names.len() => {
                return Err(ComponentError::InvalidProperty {
                    agent: id.to_string(),
                    name: "weights".to_string(),
                    reason: format!("expected {} weights, got {}", names.len(), w.len()),
                });
            }
            Some(w) => w,
            None => vec![1.0; names.len()],
        };

        Ok(Self {
            weights,
            output: 0.0,
            ports: Ports::new(names, ["output"]),
        })
    }
}

impl Steppable for Sum {
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
                Ok(())
            }
            _ => Err(unknown_attribute(name)),
        }
    }

    fn step(&mut self, _ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()> {
        let mut total = 0.0;
        for (name, weight) in self.ports.inputs.iter().zip(&self.weights) {
            total += weight * inputs.require(name)?;
        }
        self.output = total;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn weighted_sum() {
        let id = AgentId::new("mix");
        let props = json!({"inputs": ["inflow", "outflow"], "weights": [1.0, -1.0]});
        let mut s = Sum::from_properties(&id, props.as_object().unwrap()).unwrap();
        let inputs: Inputs = [("inflow", 3.0), ("outflow", 1.0)].into_iter().collect();
        s.step(&StepContext::new(&id, 0, 1.0), &inputs).unwrap();
        assert_eq!(s.attribute("output"), Some(2.0));
    }

    #[test]
    fn weight_count_must_match() {
        let id = AgentId::new("mix");
        let props = json!({"inputs": ["a", "b"], "weights": [1.0]});
        assert!(Sum::from_properties(&id, props.as_object().unwrap()).is_err());
    }

    #[test]
    fn duplicate_inputs_rejected() {
        let id = AgentId::new("mix");
        let props = json!({"inputs": ["a", "a"]});
        assert!(Sum::from_properties(&id, props.as_object().unwrap()).is_err());
    }
}
