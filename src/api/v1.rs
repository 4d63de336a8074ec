use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::response::{success, ApiResponse};
use super::ws::ws_alerts;
use crate::{
    controller::AppState,
    domain::{ExportSummary, FridgeState, LogEntry, StatusReport},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(get_status))
        .route("/log", get(get_log))
        .route("/summary", get(get_summary))
        .route("/setpoint", post(set_setpoint))
        .route("/power", post(toggle_power))
        .route("/override", post(activate_override))
        .route("/energy-saver", post(toggle_energy_saver))
        .route("/door", post(toggle_door))
        .route("/ws/alerts", get(ws_alerts))
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub state: FridgeState,
    pub report: StatusReport,
}

pub async fn get_status(State(st): State<AppState>) -> ApiResponse<SystemStatus> {
    let (state, report) = st.controller.status();
    success(SystemStatus { state, report })
}

pub async fn get_log(State(st): State<AppState>) -> ApiResponse<Vec<LogEntry>> {
    let log = st.controller.log();
    let count = log.len();
    success(log).with_count(count)
}

pub async fn get_summary(State(st): State<AppState>) -> ApiResponse<ExportSummary> {
    success(st.controller.export_summary())
}

#[derive(Debug, Deserialize)]
pub struct SetpointRequest {
    pub value: f64,
}

pub async fn set_setpoint(
    State(st): State<AppState>,
    payload: Result<Json<SetpointRequest>, JsonRejection>,
) -> Result<ApiResponse<FridgeState>, ApiError> {
    let Json(req) = payload?;
    Ok(success(st.controller.set_setpoint(req.value)?))
}

pub async fn toggle_power(
    State(st): State<AppState>,
) -> Result<ApiResponse<FridgeState>, ApiError> {
    Ok(success(st.controller.toggle_power()?))
}

pub async fn activate_override(State(st): State<AppState>) -> ApiResponse<FridgeState> {
    success(st.controller.activate_override())
}

pub async fn toggle_energy_saver(State(st): State<AppState>) -> ApiResponse<FridgeState> {
    success(st.controller.toggle_energy_saver())
}

pub async fn toggle_door(State(st): State<AppState>) -> ApiResponse<FridgeState> {
    success(st.controller.toggle_door())
}
