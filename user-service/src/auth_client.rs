//! Synchronous client for the auth service.
//!
//! Registration calls `SetPassword` before committing the user row, so a
//! failed credential write rolls the whole registration back.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use shared::{ErrorCode, ServiceError};
use uuid::Uuid;

const AUTH_CALL_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), ServiceError>;
}

pub struct HttpAuthClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: String) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(AUTH_CALL_TIMEOUT)
            .build()
            .map_err(|err| {
                ServiceError::wrap(ErrorCode::Service, "failed to build auth client", err)
            })?;

        Ok(Self { client, base_url })
    }
}

#[derive(Serialize)]
struct SetPasswordRequest<'a> {
    user_id: Uuid,
    password: &'a str,
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), ServiceError> {
        let url = format!("{}/auth/password", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SetPasswordRequest { user_id, password })
            .send()
            .await
            .map_err(|err| {
                ServiceError::wrap(ErrorCode::ExtService, "failed to reach auth service", err)
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::new(
                ErrorCode::ExtService,
                format!("auth service rejected credential write ({})", response.status()),
            ));
        }

        Ok(())
    }
}
