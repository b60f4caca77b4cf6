use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::models::{Shipment, ShipmentItem};
use crate::service::{ShippingService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ShippingService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/shipments/:shipment_id", get(view_shipment))
        .route("/shipments/:shipment_id/manifest", get(view_manifest))
        .route("/shipments/:shipment_id/dispatch", post(dispatch_shipment))
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
struct ShipmentResponse {
    shipment: Shipment,
}

async fn view_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> Result<Json<ShipmentResponse>, ServiceError> {
    let shipment = state.service.view_shipment(shipment_id).await?;
    Ok(Json(ShipmentResponse { shipment }))
}

#[derive(Debug, Serialize)]
struct ManifestResponse {
    manifest: Vec<ShipmentItem>,
}

async fn view_manifest(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> Result<Json<ManifestResponse>, ServiceError> {
    let manifest = state.service.view_shipment_manifest(shipment_id).await?;
    Ok(Json(ManifestResponse { manifest }))
}

async fn dispatch_shipment(
    State(state): State<AppState>,
    Path(shipment_id): Path<Uuid>,
) -> Result<Json<ShipmentResponse>, ServiceError> {
    let shipment = state.service.dispatch_shipment(shipment_id).await?;
    Ok(Json(ShipmentResponse { shipment }))
}
