use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use shared::gwauth::gateway_claims;
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::models::{CustomerBalance, Transaction};
use crate::service::{PaymentService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PaymentService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/balances/:customer_id", get(view_balance))
        .route("/balances/:customer_id/credit", post(credit_balance))
        .route("/transactions/:transaction_id", get(view_transaction))
        .route("/transactions/:transaction_id/reverse", post(reverse_transaction))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse::new(SERVICE_NAME, env!("CARGO_PKG_VERSION")))
}

#[derive(Debug, Serialize)]
struct BalanceResponse {
    balance: CustomerBalance,
}

async fn view_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ServiceError> {
    let claims = gateway_claims(&headers)?;
    let balance = state
        .service
        .view_balance(claims.as_ref(), customer_id)
        .await?;
    Ok(Json(BalanceResponse { balance }))
}

#[derive(Debug, Deserialize)]
struct CreditRequest {
    amount: BigDecimal,
}

async fn credit_balance(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<CreditRequest>,
) -> Result<Json<BalanceResponse>, ServiceError> {
    let balance = state
        .service
        .credit_balance(customer_id, request.amount)
        .await?;
    Ok(Json(BalanceResponse { balance }))
}

#[derive(Debug, Serialize)]
struct TransactionResponse {
    transaction: Transaction,
}

async fn view_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ServiceError> {
    let transaction = state.service.view_transaction(transaction_id).await?;
    Ok(Json(TransactionResponse { transaction }))
}

async fn reverse_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ServiceError> {
    let transaction = state.service.reverse_transaction(transaction_id).await?;
    Ok(Json(TransactionResponse { transaction }))
}
