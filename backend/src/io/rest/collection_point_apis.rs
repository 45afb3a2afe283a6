//! # REST API for Collection Points
//!
//! Registration, listing, updates, activation toggling and deletion of
//! collection points, plus the per-point transaction listing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch},
    Router,
};
use shared::{CreatePointRequest, PointListRequest, TransactionListRequest, UpdatePointRequest};
use tracing::info;

use super::error_response;
use crate::io::rest::mappers::collection_point_mapper::CollectionPointMapper;
use crate::io::rest::mappers::transaction_mapper::TransactionMapper;
use crate::AppState;

/// Create a router for collection point APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_points).post(create_point))
        .route("/:id", get(get_point).put(update_point).delete(delete_point))
        .route("/:id/status", patch(toggle_point_status))
        .route("/:id/transactions", get(list_point_transactions))
}

pub async fn list_points(
    State(state): State<AppState>,
    Query(request): Query<PointListRequest>,
) -> impl IntoResponse {
    info!("GET /api/points - query: {:?}", request);

    let filter = CollectionPointMapper::to_filter(request);
    match state.point_service.list_points(filter.clone()).await {
        Ok(result) => {
            (StatusCode::OK, Json(CollectionPointMapper::to_list_response(result, &filter))).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn create_point(
    State(state): State<AppState>,
    Json(request): Json<CreatePointRequest>,
) -> impl IntoResponse {
    info!("POST /api/points - request: {:?}", request);

    let command = CollectionPointMapper::to_create_command(request);
    match state.point_service.create_point(command).await {
        Ok(result) => (StatusCode::CREATED, Json(CollectionPointMapper::to_point_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

/// A point with its transaction count and per-outcome totals
pub async fn get_point(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/points/{}", id);

    match state.point_service.get_point_details(&id).await {
        Ok(details) => (StatusCode::OK, Json(CollectionPointMapper::to_detail_response(details))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_point(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePointRequest>,
) -> impl IntoResponse {
    info!("PUT /api/points/{} - request: {:?}", id, request);

    let command = CollectionPointMapper::to_update_command(request);
    match state.point_service.update_point(&id, command).await {
        Ok(result) => (StatusCode::OK, Json(CollectionPointMapper::to_point_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_point(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/points/{}", id);

    match state.point_service.delete_point(&id).await {
        Ok(result) => (StatusCode::OK, Json(CollectionPointMapper::to_delete_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Flip a point between Active and Inactive
pub async fn toggle_point_status(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("PATCH /api/points/{}/status", id);

    match state.point_service.toggle_status(&id).await {
        Ok(result) => (StatusCode::OK, Json(CollectionPointMapper::to_point_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Transactions of one point; the path id overrides any `pointId` in the query
pub async fn list_point_transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(request): Query<TransactionListRequest>,
) -> impl IntoResponse {
    info!("GET /api/points/{}/transactions - query: {:?}", id, request);

    if let Err(e) = state.point_service.get_point(&id).await {
        return error_response(e);
    }

    let mut query = TransactionMapper::to_query(request);
    query.point_id = Some(id);
    match state.transaction_service.list_transactions(query).await {
        Ok(result) => (StatusCode::OK, Json(TransactionMapper::to_list_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}
