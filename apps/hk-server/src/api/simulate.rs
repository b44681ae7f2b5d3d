use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use hk_app::{RunOptions, RunRequest, ensure_run};
use hk_project::SimulationConfig;
use hk_sim::{FaultEvent, LogTable};
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use crate::state::ServerState;

#[derive(Serialize)]
pub(crate) struct SimulateResponse {
    status: &'static str,
    #[serde(rename = "runId")]
    run_id: String,
    data: LogTable,
    faults: Vec<FaultEvent>,
}

/// POST /api/simulate - build and run a config, returning the exported log.
///
/// The run executes on the blocking pool: supervised components may park
/// it until an operator answers over the WebSocket.
pub(crate) async fn simulate(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<SimulateResponse>, ApiError> {
    let config: SimulationConfig =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    hk_project::validate_config(&config).map_err(|e| ApiError::Unprocessable(e.to_string()))?;

    info!(components = config.components.len(), "simulation requested");

    let ctx = Arc::clone(&state.ctx);
    let response = tokio::task::spawn_blocking(move || {
        let mut request = RunRequest::new(&config);
        request.options = RunOptions {
            use_cache: false,
            supervised: true,
            ..RunOptions::default()
        };
        ensure_run(&ctx, &request)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(SimulateResponse {
        status: "success",
        run_id: response.run_id,
        data: response.log,
        faults: response.faults,
    }))
}
