use crate::{
    error::AppError,
    store::{
        MonitorStore,
        METRICS_WINDOW,
    },
};
use axum::{
    extract::{
        rejection::JsonRejection,
        State,
    },
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
    routing::{
        get,
        post,
    },
    Json,
    Router,
};
use std::sync::Arc;
use system_monitor_model::Snapshot;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MonitorStore>,
}

pub fn create_router(store: Arc<MonitorStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/api/monitor", post(ingest))
        .route("/api/latest", get(latest))
        .route("/api/history", get(history))
        .route("/api/metrics", get(metrics))
        .with_state(state)
}

async fn ingest(
    State(state): State<AppState>,
    payload: Result<Json<Snapshot>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(snapshot) = payload?;
    debug!(
        cpu_load = snapshot.cpu_load,
        gpu_load = snapshot.gpu_load,
        processes = snapshot.top_processes.len(),
        "snapshot ingested"
    );
    state.store.ingest(snapshot);
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn latest(State(state): State<AppState>) -> Response {
    match state.store.latest() {
        Some(snapshot) => Json(snapshot).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn history(State(state): State<AppState>) -> Json<Vec<Snapshot>> {
    Json(state.store.history())
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.store.windowed_average(METRICS_WINDOW) {
        Some(averages) => Json(averages).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
