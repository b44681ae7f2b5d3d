//! Fault records and failure policy.

use hk_core::AgentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Alive,
    /// Terminal for the run.
    Failed,
}

/// What went wrong inside a guarded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    StepFailed,
    NonFiniteOutput,
    Panicked,
}

/// One isolated agent failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultEvent {
    pub tick: u64,
    pub agent_id: AgentId,
    pub kind: FaultKind,
    pub message: String,
}

/// What downstream agents see from a failed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedSourcePolicy {
    /// Keep delivering the last value produced before the failing step.
    #[default]
    HoldLast,
    /// Omit the input entirely.
    Unavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_event_json_shape() {
        let event = FaultEvent {
            tick: 2,
            agent_id: AgentId::new("f"),
            kind: FaultKind::StepFailed,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tick": 2, "agentId": "f", "kind": "StepFailed", "message": "boom"})
        );
    }

    #[test]
    fn policy_parses_snake_case() {
        let policy: FailedSourcePolicy = serde_json::from_str("\"unavailable\"").unwrap();
        assert_eq!(policy, FailedSourcePolicy::Unavailable);
        assert_eq!(FailedSourcePolicy::default(), FailedSourcePolicy::HoldLast);
    }
}
