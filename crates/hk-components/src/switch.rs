//! Threshold switch whose transitions can require operator confirmation.

use hk_core::AgentId;
use serde_json::json;

use crate::common::{check_finite, unknown_attribute};
use crate::error::{ComponentResult, StepResult};
use crate::gate::Decision;
use crate::properties::{Properties, PropertyReader};
use crate::traits::{Inputs, Ports, StepContext, Steppable};

/// Drives `command` to `on_value` while `input >= threshold`, otherwise to
/// `off_value` (e.g. a pump started on high level).
///
/// When a decision gate is attached every proposed transition is sent for
/// confirmation:
/// - `Approve` applies the proposal,
/// - `Reject` keeps the current command and suppresses re-asking until the
///   proposal changes,
/// - `Override { value }` sets the command to the operator's value.
///
/// Without a gate transitions apply immediately.
#[derive(Debug, Clone)]
pub struct SupervisedSwitch {
    threshold: f64,
    on_value: f64,
    off_value: f64,
    command: f64,
    declined: Option<f64>,
    ports: Ports,
}

impl SupervisedSwitch {
    pub const TYPE_TAG: &'static str = "supervised_switch";

    pub fn from_properties(id: &AgentId, props: &Properties) -> ComponentResult<Self> {
        let reader = PropertyReader::new(id, props);
        reader.warn_unknown(&["threshold", "on_value", "off_value"]);
        let off_value = reader.f64_or("off_value", 0.0)?;
        Ok(Self {
            threshold: reader.f64("threshold")?,
            on_value: reader.f64_or("on_value", 1.0)?,
            off_value,
            command: off_value,
            declined: None,
            ports: Ports::new(["input"], ["command"]).with_parameters(["threshold"]),
        })
    }
}

impl Steppable for SupervisedSwitch {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn ports(&self) -> &Ports {
        &self.ports
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "command" => Some(self.command),
            "threshold" => Some(self.threshold),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> StepResult<()> {
        let value = check_finite(value, name)?;
        match name {
            "command" => self.command = value,
            "threshold" => self.threshold = value,
            _ => return Err(unknown_attribute(name)),
        }
        Ok(())
    }

    fn step(&mut self, ctx: &StepContext<'_>, inputs: &Inputs) -> StepResult<()> {
        let input = inputs.require("input")?;
        let proposed = if input >= self.threshold {
            self.on_value
        } else {
            self.off_value
        };

        if proposed == self.command {
            self.declined = None;
            return Ok(());
        }
        if self.declined == Some(proposed) {
            return Ok(());
        }

        let payload = json!({
            "agentId": ctx.agent_id.as_str(),
            "tick": ctx.tick,
            "time": ctx.time,
            "input": input,
            "threshold": self.threshold,
            "current": self.command,
            "proposed": proposed,
        });
        let Some(outcome) = ctx.request_decision(payload) else {
            self.command = proposed;
            return Ok(());
        };

        tracing::debug!(
            agent = %ctx.agent_id,
            request_id = %outcome.request_id,
            decision = ?outcome.decision,
            expired = outcome.is_expired(),
            "switch decision resolved"
        );
        match outcome.decision {
            Decision::Approve => {
                self.command = proposed;
                self.declined = None;
            }
            Decision::Reject => self.declined = Some(proposed),
            Decision::Override { value } => {
                self.command = check_finite(value, "override value")?;
                self.declined = Some(proposed);
            }
        }
        Ok(())
    }
}
