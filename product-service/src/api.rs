use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::models::Product;
use crate::service::{ProductService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProductService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/products", get(view_products))
        .route("/products", post(create_product))
        .route("/products/:product_id", get(view_product))
        .route("/products/:product_id", delete(delete_product))
        .route("/products/:product_id/price", put(update_price))
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
struct ProductResponse {
    product: Product,
}

#[derive(Debug, Serialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

async fn view_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product = state.service.view_product(product_id).await?;
    Ok(Json(ProductResponse { product }))
}

async fn view_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, ServiceError> {
    let products = state.service.view_products().await?;
    Ok(Json(ProductsResponse { products }))
}

#[derive(Debug, Deserialize)]
struct CreateProductRequest {
    name: String,
    #[serde(default)]
    description: String,
    price: BigDecimal,
}

async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product = state
        .service
        .create_product(request.name, request.description, request.price)
        .await?;
    Ok(Json(ProductResponse { product }))
}

#[derive(Debug, Deserialize)]
struct UpdatePriceRequest {
    price: BigDecimal,
}

async fn update_price(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(request): Json<UpdatePriceRequest>,
) -> Result<Json<ProductResponse>, ServiceError> {
    let product = state
        .service
        .update_product_price(product_id, request.price)
        .await?;
    Ok(Json(ProductResponse { product }))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    state.service.delete_product(product_id).await?;
    Ok(Json(serde_json::json!({ "deleted": product_id })))
}
