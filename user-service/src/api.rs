use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use shared::gwauth::gateway_claims;
use shared::{ServiceError, ServiceInfoResponse};
use uuid::Uuid;

use crate::models::User;
use crate::service::{UserService, SERVICE_NAME};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UserService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(service_info))
        .route("/users", post(register_user))
        .route("/users/:user_id", get(view_user))
        .route("/users/:user_id", delete(delete_user))
        .route("/users/:user_id/email", put(update_email))
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
struct UserResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct RegisterUserRequest {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<UserResponse>, ServiceError> {
    let user = state
        .service
        .register_user(
            request.email,
            request.password,
            request.first_name,
            request.last_name,
        )
        .await?;
    Ok(Json(UserResponse { user }))
}

async fn view_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ServiceError> {
    let user = state.service.view_user(user_id).await?;
    Ok(Json(UserResponse { user }))
}

#[derive(Debug, Deserialize)]
struct UpdateEmailRequest {
    email: String,
}

async fn update_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateEmailRequest>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let claims = gateway_claims(&headers)?;
    state
        .service
        .update_user_email(claims.as_ref(), user_id, request.email)
        .await?;
    Ok(Json(serde_json::json!({ "updated": user_id })))
}

async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ServiceError> {
    let claims = gateway_claims(&headers)?;
    let user = state.service.delete_user(claims.as_ref(), user_id).await?;
    Ok(Json(UserResponse { user }))
}
