use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use shared::ServiceError;
use uuid::Uuid;

use crate::hashing;
use crate::schema::auth_methods;

pub type DbPool = Pool<AsyncPgConnection>;

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), ServiceError>;
    async fn verify_password(&self, user_id: Uuid, password: &str) -> Result<bool, ServiceError>;
    async fn delete_auth_methods(&self, user_id: Uuid) -> Result<(), ServiceError>;
}

#[derive(Insertable)]
#[diesel(table_name = auth_methods)]
struct NewAuthMethodRow {
    user_id: Uuid,
    password_hash: String,
}

pub struct PgAuthStore {
    pool: DbPool,
}

impl PgAuthStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), ServiceError> {
        let hash = hashing::hash_password(password)?;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(auth_methods::table)
            .values(NewAuthMethodRow {
                user_id,
                password_hash: hash.clone(),
            })
            .on_conflict(auth_methods::user_id)
            .do_update()
            .set((
                auth_methods::password_hash.eq(hash),
                auth_methods::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn verify_password(&self, user_id: Uuid, password: &str) -> Result<bool, ServiceError> {
        let mut conn = self.pool.get().await?;

        let hash = auth_methods::table
            .filter(auth_methods::user_id.eq(user_id))
            .select(auth_methods::password_hash)
            .first::<String>(&mut conn)
            .await
            .optional()?;

        match hash {
            Some(hash) => Ok(hashing::verify_password(password, &hash)),
            None => Ok(false),
        }
    }

    async fn delete_auth_methods(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(auth_methods::table.filter(auth_methods::user_id.eq(user_id)))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
