use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use shared::gwauth::gateway_claims;
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::service::{AuthService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AuthService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/auth/login", post(login_password))
        .route("/auth/password", post(set_password))
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
struct LoginRequest {
    user_id: Uuid,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
}

async fn login_password(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let token = state
        .service
        .login_password(request.user_id, &request.password)
        .await?;
    Ok(Json(LoginResponse { token }))
}

#[derive(Debug, Deserialize)]
struct SetPasswordRequest {
    user_id: Uuid,
    password: String,
}

async fn set_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = gateway_claims(&headers)?;
    state
        .service
        .set_password(claims.as_ref(), request.user_id, &request.password)
        .await?;
    Ok(Json(serde_json::json!({ "detail": "password updated" })))
}
