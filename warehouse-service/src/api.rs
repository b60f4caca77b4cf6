use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::models::{ProductStock, Reservation};
use crate::service::{WarehouseService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WarehouseService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/stock/:product_id", get(view_product_stock))
        .route("/stock/:product_id/add", post(add_product_stock))
        .route("/reservations/:reservation_id", get(view_reservation))
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
struct StockResponse {
    stock: ProductStock,
}

async fn view_product_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<StockResponse>, ServiceError> {
    let stock = state.service.view_product_stock(product_id).await?;
    Ok(Json(StockResponse { stock }))
}

#[derive(Debug, Deserialize)]
struct AddStockRequest {
    amount: i32,
}

async fn add_product_stock(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<AddStockRequest>,
) -> Result<Json<StockResponse>, ServiceError> {
    let stock = state
        .service
        .add_product_stock(product_id, request.amount)
        .await?;
    Ok(Json(StockResponse { stock }))
}

#[derive(Debug, Serialize)]
struct ReservationResponse {
    reservation: Reservation,
}

async fn view_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, ServiceError> {
    let reservation = state.service.view_reservation(reservation_id).await?;
    Ok(Json(ReservationResponse { reservation }))
}
