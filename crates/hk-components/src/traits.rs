//! The `Steppable` capability every component implements.

use std::collections::BTreeMap;

use hk_core::AgentId;
use serde_json::Value;

use crate::error::{StepError, StepResult};
use crate::gate::{DecisionGate, DecisionOutcome};

/// Named attributes an agent exposes, fixed at construction.
///
/// - `inputs` may be driven by connections.
/// - `outputs` are read after each step, propagated and logged.
/// - `parameters` are writable through [`Steppable::set_attribute`] (e.g. by
///   scheduled events) but are neither connected nor logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ports {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub parameters: Vec<String>,
}

impl Ports {
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters<P>(mut self, parameters: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|n| n == name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|n| n == name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|n| n == name)
    }
}

/// Input values gathered for one agent right before its step.
///
/// An input that is absent was either never connected or is fed by a failed
/// agent under the `Unavailable` policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    values: BTreeMap<String, f64>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of a required input, or `MissingInput`.
    pub fn require(&self, name: &str) -> StepResult<f64> {
        self.get(name).ok_or_else(|| StepError::MissingInput {
            name: name.to_string(),
        })
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Inputs {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Per-step context handed to an agent by the scheduler.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub agent_id: &'a AgentId,
    pub tick: u64,
    pub dt: f64,
    /// Simulation time at the start of this tick.
    pub time: f64,
    pub gate: Option<&'a dyn DecisionGate>,
}

impl<'a> StepContext<'a> {
    pub fn new(agent_id: &'a AgentId, tick: u64, dt: f64) -> Self {
        Self {
            agent_id,
            tick,
            dt,
            time: tick as f64 * dt,
            gate: None,
        }
    }

    pub fn with_gate(mut self, gate: Option<&'a dyn DecisionGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Ask the supervisory layer to confirm an automated decision.
    ///
    /// Blocks until a response arrives or the gate's timeout expires. Returns
    /// `None` when the run has no supervisory layer attached.
    pub fn request_decision(&self, payload: Value) -> Option<DecisionOutcome> {
        self.gate.map(|gate| gate.request(self.agent_id, payload))
    }
}

/// Uniform capability of every simulated component.
///
/// Implementations own their runtime state exclusively. The scheduler calls
/// [`Steppable::step`] once per tick while the agent is alive, then reads
/// every output through [`Steppable::attribute`].
pub trait Steppable: Send {
    /// Registry tag this instance was created from.
    fn type_tag(&self) -> &str;

    /// Declared inputs/outputs/parameters.
    fn ports(&self) -> &Ports;

    /// Current value of a named attribute (output or parameter).
    fn attribute(&self, name: &str) -> Option<f64>;

    /// Overwrite a named attribute.
    fn set_attribute(&mut self, name: &str, value: f64) -> StepResult<()>;

    /// Compute outputs from the current inputs and advance one tick.
    fn step(&mut self, ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_lookup() {
        let ports = Ports::new(["a", "b"], ["out"]).with_parameters(["gain"]);
        assert!(ports.has_input("a"));
        assert!(!ports.has_input("out"));
        assert!(ports.has_output("out"));
        assert!(ports.has_parameter("gain"));
    }

    #[test]
    fn inputs_require_reports_missing() {
        let inputs: Inputs = [("flow", 2.0)].into_iter().collect();
        assert_eq!(inputs.require("flow").unwrap(), 2.0);
        assert_eq!(
            inputs.require("level"),
            Err(StepError::MissingInput {
                name: "level".to_string()
            })
        );
        assert_eq!(inputs.get_or("level", 1.5), 1.5);
    }

    #[test]
    fn context_without_gate_yields_no_decision() {
        let id = AgentId::new("sw");
        let ctx = StepContext::new(&id, 4, 0.5);
        assert_eq!(ctx.time, 2.0);
        assert!(ctx.request_decision(Value::Null).is_none());
    }
}
