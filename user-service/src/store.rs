use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{OutboxRecord, ServiceError};
use uuid::Uuid;

use crate::auth_client::AuthClient;
use crate::events;
use crate::models::{NewOutboxRow, NewUserRow, User};
use crate::schema::{event_outbox, users};

pub type DbPool = Pool<AsyncPgConnection>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: Uuid) -> Result<User, ServiceError>;

    /// Registers a user. Side-effect order: user row, `UserCreated` outbox
    /// row, credential write at the auth service, commit. An auth failure
    /// rolls everything back; a commit failure after the auth call leaves
    /// an orphan credential that the `UserDeleted` path cleans up.
    async fn register_user(
        &self,
        email: String,
        password: String,
        first_name: String,
        last_name: String,
    ) -> Result<User, ServiceError>;

    async fn update_user_email(&self, user_id: Uuid, email: String) -> Result<(), ServiceError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<User, ServiceError>;
}

pub struct PgUserStore {
    pool: DbPool,
    auth: Arc<dyn AuthClient>,
}

impl PgUserStore {
    pub fn new(pool: DbPool, auth: Arc<dyn AuthClient>) -> Self {
        Self { pool, auth }
    }
}

async fn insert_outbox(
    conn: &mut AsyncPgConnection,
    record: OutboxRecord,
) -> Result<(), ServiceError> {
    diesel::insert_into(event_outbox::table)
        .values(NewOutboxRow::from(record))
        .execute(conn)
        .await?;

    Ok(())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let mut conn = self.pool.get().await?;

        let user = users::table
            .filter(users::id.eq(user_id))
            .first::<User>(&mut conn)
            .await?;

        Ok(user)
    }

    async fn register_user(
        &self,
        email: String,
        password: String,
        first_name: String,
        last_name: String,
    ) -> Result<User, ServiceError> {
        let mut conn = self.pool.get().await?;
        let auth = self.auth.clone();

        conn.transaction::<User, ServiceError, _>(|conn| {
            async move {
                let user = diesel::insert_into(users::table)
                    .values(NewUserRow {
                        id: Uuid::new_v4(),
                        first_name,
                        last_name,
                        email,
                    })
                    .get_result::<User>(conn)
                    .await?;

                insert_outbox(conn, events::user_created(&user)?).await?;

                // Failure here aborts the transaction, so no user row and
                // no UserCreated event survive.
                auth.set_password(user.id, &password).await?;

                Ok(user)
            }
            .scope_boxed()
        })
        .await
    }

    async fn update_user_email(&self, user_id: Uuid, email: String) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                diesel::update(users::table.filter(users::id.eq(user_id)))
                    .set((
                        users::email.eq(&email),
                        users::updated_at.eq(diesel::dsl::now),
                    ))
                    .get_result::<User>(conn)
                    .await?;

                insert_outbox(conn, events::user_email_updated(user_id, &email)?).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<User, ServiceError, _>(|conn| {
            async move {
                let user = users::table
                    .filter(users::id.eq(user_id))
                    .first::<User>(conn)
                    .await?;

                diesel::delete(users::table.filter(users::id.eq(user_id)))
                    .execute(conn)
                    .await?;

                insert_outbox(conn, events::user_deleted(&user)?).await?;

                Ok(user)
            }
            .scope_boxed()
        })
        .await
    }
}
