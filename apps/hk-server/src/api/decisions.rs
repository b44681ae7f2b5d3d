use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use hk_dispatch::DecisionRequest;

use super::devices::DataResponse;
use crate::state::ServerState;

/// GET /api/decisions - decision requests still awaiting an operator.
pub(crate) async fn pending_decisions(
    State(state): State<Arc<ServerState>>,
) -> Json<DataResponse<Vec<DecisionRequest>>> {
    DataResponse::success(state.dispatcher().pending_decisions())
}
