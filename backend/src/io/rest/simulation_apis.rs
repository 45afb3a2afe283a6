//! # REST API for Simulation Control
//!
//! Start, stop and toggle per-point simulations, inspect the scheduler and
//! stop everything at once.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use super::error_response;
use crate::io::rest::mappers::simulation_mapper::SimulationMapper;
use crate::AppState;

/// Create a router for simulation control APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/stop-all", post(stop_all))
        .route("/:id/toggle", post(toggle_simulation))
        .route("/:id/start", post(start_simulation))
        .route("/:id/stop", post(stop_simulation))
}

pub async fn toggle_simulation(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("POST /api/simulation/{}/toggle", id);

    match state.simulation_service.toggle(&id).await {
        Ok(outcome) => (StatusCode::OK, Json(SimulationMapper::to_toggle_response(&id, outcome))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn start_simulation(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("POST /api/simulation/{}/start", id);

    match state.simulation_service.start(&id).await {
        Ok(result) => (StatusCode::OK, Json(SimulationMapper::to_action_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn stop_simulation(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("POST /api/simulation/{}/stop", id);

    match state.simulation_service.stop(&id).await {
        Ok(result) => (StatusCode::OK, Json(SimulationMapper::to_action_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/simulation/status");

    match state.simulation_service.status().await {
        Ok(result) => (StatusCode::OK, Json(SimulationMapper::to_status_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn stop_all(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/simulation/stop-all");

    match state.simulation_service.stop_all().await {
        Ok(result) => (StatusCode::OK, Json(SimulationMapper::to_stop_all_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}
