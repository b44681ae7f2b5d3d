use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use hk_dispatch::DeviceStatus;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::state::ServerState;

#[derive(Serialize)]
pub(crate) struct DataResponse<T> {
    status: &'static str,
    data: T,
}

impl<T> DataResponse<T> {
    pub(crate) fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            data,
        })
    }
}

/// POST /api/devices/:id/status - record the latest values from a device.
pub(crate) async fn update_status(
    State(state): State<Arc<ServerState>>,
    Path(device_id): Path<String>,
    Json(values): Json<Map<String, Value>>,
) -> Json<DataResponse<DeviceStatus>> {
    debug!(device_id = %device_id, fields = values.len(), "device status received");
    DataResponse::success(state.dispatcher().update_device_status(device_id, values))
}

/// GET /api/devices - snapshot of every device's latest status.
pub(crate) async fn list_devices(
    State(state): State<Arc<ServerState>>,
) -> Json<DataResponse<BTreeMap<String, DeviceStatus>>> {
    DataResponse::success(state.dispatcher().get_all_statuses())
}
