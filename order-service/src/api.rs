use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use shared::gwauth::gateway_claims;
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::models::Order;
use crate::service::{OrderService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/orders", post(place_order))
        .route("/orders/:order_id", get(view_order))
        .route("/customers/:customer_id/orders", get(view_orders))
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

#[derive(Debug, Deserialize)]
struct PlaceOrderRequest {
    customer_id: Uuid,
    cart: HashMap<Uuid, i32>,
}

#[derive(Debug, Serialize)]
struct OrderResponse {
    order: Order,
}

async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let claims = gateway_claims(&headers)?;

    let order = state
        .service
        .place_order(claims.as_ref(), request.customer_id, request.cart)
        .await?;

    Ok(Json(OrderResponse { order }))
}

async fn view_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ServiceError> {
    let order = state.service.view_order(order_id).await?;
    Ok(Json(OrderResponse { order }))
}

#[derive(Debug, Serialize)]
struct OrdersResponse {
    orders: Vec<Order>,
}

async fn view_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<OrdersResponse>, ServiceError> {
    let orders = state.service.view_orders(customer_id).await?;
    Ok(Json(OrdersResponse { orders }))
}
