use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use hk_dispatch::{DecisionRequest, SubmitAck};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::ServerState;

/// GET /api/ws - operator channel for decision requests and responses.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<ServerState>) {
    // Subscribe before announcing, so no request raised in between is lost.
    let mut decisions_rx = state.decisions_tx.subscribe();
    info!("WebSocket connection established");

    if let Err(e) = send(&mut socket, &ServerMessage::Connected).await {
        warn!(error = %e, "Failed to greet client");
        return;
    }

    // Requests raised before this client connected.
    for request in state.dispatcher().pending_decisions() {
        if let Err(e) = send(&mut socket, &ServerMessage::from(request)).await {
            warn!(error = %e, "Failed to replay pending decision");
            return;
        }
    }

    loop {
        tokio::select! {
            Some(msg) = socket.recv() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        let reply = handle_client_message(&state, &text);
                        if let Err(e) = send(&mut socket, &reply).await {
                            error!(error = %e, "Failed to send reply");
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            error!(error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Ok(_) => {
                        // Ignore binary, pong messages
                    }
                    Err(e) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            result = decisions_rx.recv() => {
                match result {
                    Ok(request) => {
                        if let Err(e) = forward_request(&mut socket, request).await {
                            error!(error = %e, "Failed to forward decision request");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped = skipped, "WebSocket lagged, skipped decision requests");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Decision broadcast channel closed");
                        break;
                    }
                }
            }

            else => {
                break;
            }
        }
    }

    info!("WebSocket connection closed");
}

/// Apply one client message and produce the reply.
pub(crate) fn handle_client_message(state: &ServerState, text: &str) -> ServerMessage {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "Unparseable client message");
            return ServerMessage::Error {
                message: format!("invalid message: {e}"),
            };
        }
    };

    match msg {
        ClientMessage::DecisionResponse {
            request_id,
            decision,
        } => match state.dispatcher().submit_decision(&request_id, decision) {
            Ok(ack) => {
                if ack == SubmitAck::Duplicate {
                    info!(request_id = %request_id, "duplicate decision ignored");
                }
                ServerMessage::DecisionAck { request_id }
            }
            Err(e) => ServerMessage::Error {
                message: e.to_string(),
            },
        },
    }
}

async fn forward_request(socket: &mut WebSocket, request: DecisionRequest) -> anyhow::Result<()> {
    send(socket, &ServerMessage::from(request)).await
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
