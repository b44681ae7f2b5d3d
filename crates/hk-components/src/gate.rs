//! Seam between components and the supervisory (human-in-the-loop) layer.

use hk_core::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operator answer to a decision request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    /// Carry out the proposed automated action.
    Approve,
    /// Keep the current state; the proposed action is dropped.
    Reject,
    /// Replace the proposed action with an operator-chosen value.
    Override { value: f64 },
}

/// How a decision request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Fulfilled,
    Expired,
}

/// Result delivered to the flow that issued a decision request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub request_id: String,
    pub decision: Decision,
    pub resolution: Resolution,
}

impl DecisionOutcome {
    pub fn is_expired(&self) -> bool {
        self.resolution == Resolution::Expired
    }
}

/// Something that can pause an automated decision for confirmation.
///
/// `request` blocks the calling (simulation) thread until the decision is
/// fulfilled or expires, so implementations must never hold locks across
/// the wait.
pub trait DecisionGate: Send + Sync {
    fn request(&self, agent_id: &AgentId, payload: Value) -> DecisionOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_wire_format() {
        let json = serde_json::to_value(Decision::Override { value: 0.25 }).unwrap();
        assert_eq!(json, serde_json::json!({"action": "override", "value": 0.25}));

        let parsed: Decision = serde_json::from_str(r#"{"action":"approve"}"#).unwrap();
        assert_eq!(parsed, Decision::Approve);
    }
}
