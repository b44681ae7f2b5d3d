//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hk_dispatch::DispatchConfig;
use hk_server::{ServerState, create_router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn create_test_app() -> (Router, ServerState) {
    let state = ServerState::new(DispatchConfig::default());
    (create_router(state.clone()), state)
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn simulate_returns_log_table() {
    let (app, _) = create_test_app();
    let config = json!({
        "simulationParams": {"totalTime": 3.0, "dt": 1.0},
        "components": {
            "A": {"type": "constant", "properties": {"value": 5.0}},
            "B": {"type": "gain", "properties": {"gain": 2.0}}
        },
        "connections": [{"source": "A.output", "target": "B.input"}]
    });

    let (status, body) = call(app, post_json("/api/simulate", config)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["columns"], json!(["A.output", "B.output"]));
    let rows = body["data"]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2], json!({"tick": 2, "time": 2.0, "A.output": 5.0, "B.output": 10.0}));
    assert_eq!(body["faults"], json!([]));
}

#[tokio::test]
async fn simulate_reports_isolated_faults() {
    let (app, _) = create_test_app();
    let config = json!({
        "simulationParams": {"totalTime": 5.0, "dt": 1.0},
        "components": {
            "ok": {"type": "dummy"},
            "bad": {"type": "faulty", "properties": {"fail_on_step": 2}}
        }
    });

    let (status, body) = call(app, post_json("/api/simulate", config)).await;

    assert_eq!(status, StatusCode::OK);
    let faults = body["faults"].as_array().unwrap();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0]["agentId"], "bad");
    assert_eq!(faults[0]["tick"], 1);
}

#[tokio::test]
async fn simulate_rejects_cycles() {
    let (app, _) = create_test_app();
    let config = json!({
        "simulationParams": {"totalTime": 1.0, "dt": 1.0},
        "components": {
            "A": {"type": "gain", "properties": {"gain": 1.0}},
            "B": {"type": "gain", "properties": {"gain": 1.0}}
        },
        "connections": [
            {"source": "A.output", "target": "B.input"},
            {"source": "B.output", "target": "A.input"}
        ]
    });

    let (status, body) = call(app, post_json("/api/simulate", config)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("Cyclic"));
}

#[tokio::test]
async fn simulate_rejects_malformed_body() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/simulate")
        .header("content-type", "application/json")
        .body(Body::from("{\"simulationParams\": "))
        .unwrap();

    let (status, body) = call(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn device_status_roundtrip() {
    let (app, state) = create_test_app();

    let (status, body) = call(
        app.clone(),
        post_json("/api/devices/pump-1/status", json!({"flow": 3.5, "running": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["values"]["flow"], 3.5);

    let (status, body) = call(app, get("/api/devices")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pump-1"]["values"]["running"], true);
    assert_eq!(state.dispatcher().get_all_statuses().len(), 1);
}

#[tokio::test]
async fn no_pending_decisions_initially() {
    let (app, _) = create_test_app();
    let (status, body) = call(app, get("/api/decisions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}
