use std::sync::Arc;

use shared::gwauth::JwtClaims;
use shared::{ErrorCode, ServiceError};
use uuid::Uuid;

use crate::models::User;
use crate::store::UserStore;

pub const SERVICE_NAME: &str = "user";

pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn view_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.store.get_user(user_id).await
    }

    pub async fn register_user(
        &self,
        email: String,
        password: String,
        first_name: String,
        last_name: String,
    ) -> Result<User, ServiceError> {
        if !email.contains('@') {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: malformed email address",
            ));
        }
        // bcrypt truncates beyond 72 bytes, so the upper bound is enforced
        // here rather than at hash time.
        if password.len() < 8 || password.len() > 64 {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: password must be 8 to 64 characters",
            ));
        }
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: names must not be empty",
            ));
        }

        self.store
            .register_user(email, password, first_name, last_name)
            .await
    }

    /// Gateway callers may only change their own email.
    pub async fn update_user_email(
        &self,
        claims: Option<&JwtClaims>,
        user_id: Uuid,
        email: String,
    ) -> Result<(), ServiceError> {
        let user_id = subject_or(claims, user_id)?;

        if !email.contains('@') {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: malformed email address",
            ));
        }

        self.store.update_user_email(user_id, email).await
    }

    /// Gateway callers may only delete themselves.
    pub async fn delete_user(
        &self,
        claims: Option<&JwtClaims>,
        user_id: Uuid,
    ) -> Result<User, ServiceError> {
        let user_id = subject_or(claims, user_id)?;
        self.store.delete_user(user_id).await
    }
}

fn subject_or(claims: Option<&JwtClaims>, user_id: Uuid) -> Result<Uuid, ServiceError> {
    match claims {
        Some(claims) => claims
            .sub
            .parse::<Uuid>()
            .map_err(|err| ServiceError::wrap(ErrorCode::Unauthorised, "invalid jwt subject", err)),
        None => Ok(user_id),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Register(String),
        UpdateEmail(Uuid, String),
        Delete(Uuid),
    }

    #[derive(Default)]
    struct MockStore {
        calls: Mutex<Vec<Call>>,
    }

    impl MockStore {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "U".into(),
            last_name: "One".into(),
            email: email.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl UserStore for MockStore {
        async fn get_user(&self, _user_id: Uuid) -> Result<User, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "user not found"))
        }

        async fn register_user(
            &self,
            email: String,
            _password: String,
            _first_name: String,
            _last_name: String,
        ) -> Result<User, ServiceError> {
            self.calls.lock().unwrap().push(Call::Register(email.clone()));
            Ok(user(&email))
        }

        async fn update_user_email(
            &self,
            user_id: Uuid,
            email: String,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::UpdateEmail(user_id, email));
            Ok(())
        }

        async fn delete_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
            self.calls.lock().unwrap().push(Call::Delete(user_id));
            Ok(user("gone@example.com"))
        }
    }

    fn service() -> (UserService, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (UserService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn registration_validates_inputs() {
        let (svc, store) = service();

        let err = svc
            .register_user("not-an-email".into(), "password1".into(), "A".into(), "B".into())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = svc
            .register_user("a@example.com".into(), "short".into(), "A".into(), "B".into())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = svc
            .register_user("a@example.com".into(), "password1".into(), "".into(), "B".into())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        assert!(store.calls().is_empty());

        svc.register_user("a@example.com".into(), "password1".into(), "A".into(), "B".into())
            .await
            .unwrap();
        assert_eq!(store.calls(), vec![Call::Register("a@example.com".into())]);
    }

    #[tokio::test]
    async fn gateway_caller_may_only_touch_themselves() {
        let (svc, store) = service();
        let caller = Uuid::new_v4();
        let claims = JwtClaims {
            sub: caller.to_string(),
            iat: 0,
            exp: i64::MAX,
        };

        svc.update_user_email(Some(&claims), Uuid::new_v4(), "new@example.com".into())
            .await
            .unwrap();
        svc.delete_user(Some(&claims), Uuid::new_v4()).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                Call::UpdateEmail(caller, "new@example.com".into()),
                Call::Delete(caller),
            ]
        );
    }
}
