use hk_components::Decision;
use hk_dispatch::DecisionRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages accepted from WebSocket clients.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "decisionResponse")]
    DecisionResponse {
        #[serde(rename = "requestId")]
        request_id: String,
        decision: Decision,
    },
}

/// Messages pushed to WebSocket clients.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "connected")]
    Connected,
    #[serde(rename = "decisionRequest")]
    DecisionRequest {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "agentId", skip_serializing_if = "Option::is_none")]
        agent_id: Option<String>,
        payload: Value,
    },
    #[serde(rename = "decisionAck")]
    DecisionAck {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

impl From<DecisionRequest> for ServerMessage {
    fn from(request: DecisionRequest) -> Self {
        ServerMessage::DecisionRequest {
            request_id: request.request_id,
            agent_id: request.agent_id.map(|id| id.to_string()),
            payload: request.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_decision_response_parses() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "decisionResponse",
            "requestId": "r-1",
            "decision": {"action": "override", "value": 0.5}
        }))
        .unwrap();
        let ClientMessage::DecisionResponse {
            request_id,
            decision,
        } = msg;
        assert_eq!(request_id, "r-1");
        assert_eq!(decision, Decision::Override { value: 0.5 });
    }

    #[test]
    fn server_messages_are_tagged() {
        assert_eq!(
            serde_json::to_value(ServerMessage::Connected).unwrap(),
            json!({"type": "connected"})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::DecisionAck {
                request_id: "r-1".to_string()
            })
            .unwrap(),
            json!({"type": "decisionAck", "requestId": "r-1"})
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::DecisionRequest {
                request_id: "r-2".to_string(),
                agent_id: None,
                payload: json!({"proposed": 1.0}),
            })
            .unwrap(),
            json!({"type": "decisionRequest", "requestId": "r-2", "payload": {"proposed": 1.0}})
        );
    }
}
