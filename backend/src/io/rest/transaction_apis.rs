use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use shared::{
    CreateTransactionRequest, SimulateTransactionsRequest, TransactionListRequest, TransactionStatsRequest,
    UpdateTransactionRequest,
};
use tracing::info;

use super::error_response;
use crate::io::rest::mappers::transaction_mapper::TransactionMapper;
use crate::AppState;

/// Create a router for transaction APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/stats", get(transaction_stats))
        .route("/simulate", post(simulate_transactions))
        .route("/:id", get(get_transaction).put(update_transaction).delete(delete_transaction))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(request): Query<TransactionListRequest>,
) -> impl IntoResponse {
    info!("GET /api/transactions - query: {:?}", request);

    let query = TransactionMapper::to_query(request);
    match state.transaction_service.list_transactions(query).await {
        Ok(result) => (StatusCode::OK, Json(TransactionMapper::to_list_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_transaction(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("GET /api/transactions/{}", id);

    match state.transaction_service.get_transaction(&id).await {
        Ok(transaction) => (StatusCode::OK, Json(TransactionMapper::to_dto(transaction))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Totals, per-outcome breakdown, last seven days and top payment apps
pub async fn transaction_stats(
    State(state): State<AppState>,
    Query(request): Query<TransactionStatsRequest>,
) -> impl IntoResponse {
    info!("GET /api/transactions/stats - query: {:?}", request);

    let query = match TransactionMapper::to_stats_query(request) {
        Ok(query) => query,
        Err(e) => return error_response(e),
    };
    match state.transaction_service.stats(query).await {
        Ok(stats) => (StatusCode::OK, Json(TransactionMapper::to_stats_response(stats))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions - request: {:?}", request);

    let command = TransactionMapper::to_create_command(request);
    match state.transaction_service.create_transaction(command).await {
        Ok(result) => {
            (StatusCode::CREATED, Json(TransactionMapper::to_transaction_response(result))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Change a transaction's outcome
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTransactionRequest>,
) -> impl IntoResponse {
    info!("PUT /api/transactions/{} - request: {:?}", id, request);

    let outcome = TransactionMapper::outcome_to_domain(request.outcome);
    match state.transaction_service.update_outcome(&id, outcome).await {
        Ok(result) => (StatusCode::OK, Json(TransactionMapper::to_transaction_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_transaction(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/transactions/{}", id);

    match state.transaction_service.delete_transaction(&id).await {
        Ok(result) => (StatusCode::OK, Json(TransactionMapper::to_delete_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Generate transactions for a point immediately
pub async fn simulate_transactions(
    State(state): State<AppState>,
    Json(request): Json<SimulateTransactionsRequest>,
) -> impl IntoResponse {
    info!("POST /api/transactions/simulate - request: {:?}", request);

    let command = TransactionMapper::to_simulate_command(request);
    match state.transaction_service.simulate(command).await {
        Ok(result) => (StatusCode::CREATED, Json(TransactionMapper::to_simulate_response(result))).into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shared::{
        DeleteTransactionResponse, SimulateTransactionsResponse, Transaction, TransactionListResponse,
        TransactionOutcome, TransactionResponse, TransactionStatsResponse,
    };

    fn manual_transaction(point_id: &str, amount: f64) -> serde_json::Value {
        json!({
            "pointId": point_id,
            "amount": amount,
            "payerInfo": { "name": "Meera Iyer", "phone": "9123456789", "paymentApp": "PhonePe" }
        })
    }

    #[tokio::test]
    async fn test_simulate_then_list_and_get() {
        let (app, _) = test_app();
        create_point(&app, "SHOP1").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/transactions/simulate",
            Some(json!({ "pointId": "SHOP1", "count": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let simulated: SimulateTransactionsResponse = parse(&body);
        assert_eq!(simulated.transactions.len(), 3);
        assert!(simulated.transactions.iter().all(|t| t.reference.len() == 12));

        let (status, body) = send(&app, Method::GET, "/api/transactions?pointId=SHOP1", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: TransactionListResponse = parse(&body);
        assert_eq!(listed.total, 3);

        let id = &simulated.transactions[0].id;
        let (status, body) = send(&app, Method::GET, &format!("/api/transactions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let fetched: Transaction = parse(&body);
        assert_eq!(&fetched.id, id);
        assert_eq!(fetched.point_id, "SHOP1");
    }

    #[tokio::test]
    async fn test_outcome_filter() {
        let (app, _) = test_app();
        create_point(&app, "SHOP1").await;
        send(
            &app,
            Method::POST,
            "/api/transactions/simulate",
            Some(json!({ "pointId": "SHOP1", "count": 50 })),
        )
        .await;

        let (status, body) = send(&app, Method::GET, "/api/transactions?outcome=Success&limit=100", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed: TransactionListResponse = parse(&body);
        assert!(listed.transactions.iter().all(|t| t.outcome == TransactionOutcome::Success));
        assert_eq!(listed.total as usize, listed.transactions.len());
    }

    #[tokio::test]
    async fn test_simulate_errors() {
        let (app, _) = test_app();
        create_point(&app, "SHOP1").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/transactions/simulate",
            Some(json!({ "pointId": "ZZZZZ" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/transactions/simulate",
            Some(json!({ "pointId": "SHOP1", "count": 500 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(&app, Method::PATCH, "/api/points/SHOP1/status", None).await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/transactions/simulate",
            Some(json!({ "pointId": "SHOP1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/transactions/PAY0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_manual_create_update_delete() {
        let (app, _) = test_app();
        create_point(&app, "SHOP1").await;

        let (status, body) = send(&app, Method::POST, "/api/transactions", Some(manual_transaction("SHOP1", 120.0))).await;
        assert_eq!(status, StatusCode::CREATED);
        let created: TransactionResponse = parse(&body);
        assert_eq!(created.transaction.outcome, TransactionOutcome::Pending);
        assert_eq!(created.success_message, "Transaction created successfully");
        let uri = format!("/api/transactions/{}", created.transaction.id);

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "outcome": "Success" }))).await;
        assert_eq!(status, StatusCode::OK);
        let updated: TransactionResponse = parse(&body);
        assert_eq!(updated.transaction.outcome, TransactionOutcome::Success);

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "outcome": "Refunded" }))).await;
        assert!(status.is_client_error());

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let deleted: DeleteTransactionResponse = parse(&body);
        assert_eq!(deleted.transaction_id, created.transaction.id);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "outcome": "Failed" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_manual_create_errors() {
        let (app, _) = test_app();
        create_point(&app, "SHOP1").await;

        let (status, _) = send(&app, Method::POST, "/api/transactions", Some(manual_transaction("ZZZZZ", 10.0))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::POST, "/api/transactions", Some(manual_transaction("SHOP1", 0.0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut bad_phone = manual_transaction("SHOP1", 10.0);
        bad_phone["payerInfo"]["phone"] = json!("12345");
        let (status, _) = send(&app, Method::POST, "/api/transactions", Some(bad_phone)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (app, _) = test_app();
        create_point(&app, "SHOP1").await;
        create_point(&app, "SHOP2").await;
        send(&app, Method::POST, "/api/transactions", Some(manual_transaction("SHOP1", 100.0))).await;
        send(&app, Method::POST, "/api/transactions", Some(manual_transaction("SHOP1", 50.0))).await;
        send(&app, Method::POST, "/api/transactions", Some(manual_transaction("SHOP2", 30.0))).await;

        let (status, body) = send(&app, Method::GET, "/api/transactions/stats?pointId=SHOP1", None).await;
        assert_eq!(status, StatusCode::OK);
        let stats: TransactionStatsResponse = parse(&body);
        assert_eq!(stats.summary.total_transactions, 2);
        assert_eq!(stats.summary.total_amount, 150.0);
        assert_eq!(stats.summary.pending_transactions, 2);
        assert_eq!(stats.summary.success_rate, 0.0);
        assert_eq!(stats.top_payment_apps.len(), 1);
        assert_eq!(stats.top_payment_apps[0].count, 2);

        let (_, body) = send(&app, Method::GET, "/api/transactions/stats", None).await;
        let all: TransactionStatsResponse = parse(&body);
        assert_eq!(all.summary.total_transactions, 3);

        let (status, _) = send(&app, Method::GET, "/api/transactions/stats?startDate=soon", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, Method::GET, "/api/transactions/stats?endDate=2000-01-01", None).await;
        let empty: TransactionStatsResponse = parse(&body);
        assert_eq!(empty.summary.total_transactions, 0);
        assert!(empty.daily_stats.is_empty());
    }
}
