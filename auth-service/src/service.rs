use std::sync::Arc;

use chrono::{Duration, Utc};
use shared::gwauth::{encode_claims, JwtClaims};
use shared::{ErrorCode, ServiceError, UserDeletedEvent};
use uuid::Uuid;

use crate::store::AuthStore;

pub const SERVICE_NAME: &str = "auth";

const TOKEN_TTL_HOURS: i64 = 1;

pub struct AuthService {
    store: Arc<dyn AuthStore>,
}

impl AuthService {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    /// Gateway callers may only change their own password.
    pub async fn set_password(
        &self,
        claims: Option<&JwtClaims>,
        user_id: Uuid,
        password: &str,
    ) -> Result<(), ServiceError> {
        let user_id = match claims {
            Some(claims) => claims.sub.parse::<Uuid>().map_err(|err| {
                ServiceError::wrap(ErrorCode::Unauthorised, "invalid jwt subject", err)
            })?,
            None => user_id,
        };

        if password.len() < 8 || password.len() > 64 {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: password must be 8 to 64 characters",
            ));
        }

        self.store.set_password(user_id, password).await
    }

    /// Verifies credentials and issues the caller's claims material. The
    /// gateway owns token signing and validation; services only ever see
    /// the decoded claims it forwards.
    pub async fn login_password(
        &self,
        user_id: Uuid,
        password: &str,
    ) -> Result<String, ServiceError> {
        let matched = self.store.verify_password(user_id, password).await?;
        if !matched {
            return Err(ServiceError::new(
                ErrorCode::Forbidden,
                "invalid user id or password",
            ));
        }

        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        encode_claims(&claims)
    }

    /// Compensation for the registration flow: a deleted user's orphaned
    /// credentials are removed here.
    pub async fn process_user_deleted_event(
        &self,
        event: UserDeletedEvent,
    ) -> Result<(), ServiceError> {
        self.store.delete_auth_methods(event.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use shared::EVENT_REVISION;

    use super::*;

    #[derive(Default)]
    struct MockStore {
        passwords: Mutex<HashMap<Uuid, String>>,
    }

    #[async_trait]
    impl AuthStore for MockStore {
        async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), ServiceError> {
            self.passwords.lock().unwrap().insert(user_id, password.to_string());
            Ok(())
        }

        async fn verify_password(
            &self,
            user_id: Uuid,
            password: &str,
        ) -> Result<bool, ServiceError> {
            Ok(self
                .passwords
                .lock()
                .unwrap()
                .get(&user_id)
                .is_some_and(|stored| stored == password))
        }

        async fn delete_auth_methods(&self, user_id: Uuid) -> Result<(), ServiceError> {
            self.passwords.lock().unwrap().remove(&user_id);
            Ok(())
        }
    }

    fn service() -> (AuthService, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (AuthService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn set_password_validates_length() {
        let (svc, _) = service();

        let err = svc
            .set_password(None, Uuid::new_v4(), "short")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn gateway_caller_changes_their_own_password() {
        let (svc, store) = service();
        let caller = Uuid::new_v4();
        let claims = JwtClaims {
            sub: caller.to_string(),
            iat: 0,
            exp: i64::MAX,
        };

        svc.set_password(Some(&claims), Uuid::new_v4(), "password1")
            .await
            .unwrap();

        assert!(store.passwords.lock().unwrap().contains_key(&caller));
    }

    #[tokio::test]
    async fn login_issues_claims_for_valid_credentials_only() {
        let (svc, _) = service();
        let user_id = Uuid::new_v4();

        svc.set_password(None, user_id, "password1").await.unwrap();

        let err = svc.login_password(user_id, "wrong-password").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let token = svc.login_password(user_id, "password1").await.unwrap();
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn user_deletion_removes_credentials() {
        let (svc, _) = service();
        let user_id = Uuid::new_v4();

        svc.set_password(None, user_id, "password1").await.unwrap();
        svc.process_user_deleted_event(UserDeletedEvent {
            revision: EVENT_REVISION,
            user_id,
        })
        .await
        .unwrap();

        let err = svc.login_password(user_id, "password1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
