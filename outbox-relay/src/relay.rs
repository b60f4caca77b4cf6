use std::time::Duration;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rdkafka::producer::{FutureProducer, FutureRecord};
use shared::{ErrorCode, ServiceError};
use tokio::time;
use tracing::{debug, error, info};

use crate::config::RelayConfig;
use crate::schema::event_outbox;

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Debug, Queryable)]
struct OutboxRow {
    id: i64,
    aggregateid: String,
    aggregatetype: String,
    payload: Vec<u8>,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

#[derive(QueryableByName)]
struct FingerprintRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    fingerprint: String,
}

pub struct OutboxRelay {
    pool: DbPool,
    producer: FutureProducer,
    config: RelayConfig,
    poll_interval: Duration,
    batch_size: i64,
}

impl OutboxRelay {
    pub fn new(
        pool: DbPool,
        producer: FutureProducer,
        config: RelayConfig,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            pool,
            producer,
            config,
            poll_interval,
            batch_size,
        }
    }

    /// Records this relay's configuration in the service database.
    /// Re-applying an identical configuration is a no-op.
    pub async fn reconcile(&self) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query(
            "CREATE TABLE IF NOT EXISTS relay_state (
                connector TEXT PRIMARY KEY,
                fingerprint TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&mut conn)
        .await?;

        let connector = self.config.connector_name();
        let fingerprint = self.config.fingerprint();

        let existing = diesel::sql_query("SELECT fingerprint FROM relay_state WHERE connector = $1")
            .bind::<diesel::sql_types::Text, _>(&connector)
            .get_result::<FingerprintRow>(&mut conn)
            .await
            .optional()?;

        match existing {
            Some(row) if row.fingerprint == fingerprint => {
                info!(%connector, "relay configuration unchanged");
                return Ok(());
            }
            _ => {}
        }

        diesel::sql_query(
            "INSERT INTO relay_state (connector, fingerprint) VALUES ($1, $2)
             ON CONFLICT (connector)
             DO UPDATE SET fingerprint = EXCLUDED.fingerprint, applied_at = now()",
        )
        .bind::<diesel::sql_types::Text, _>(&connector)
        .bind::<diesel::sql_types::Text, _>(&fingerprint)
        .execute(&mut conn)
        .await?;

        info!(%connector, %fingerprint, "relay configuration applied");
        Ok(())
    }

    pub async fn run(&self) {
        let mut interval = time::interval(self.poll_interval);

        loop {
            interval.tick().await;

            if let Err(err) = self.forward_batch().await {
                error!("error forwarding outbox batch: {}", err.log_chain());
            }
        }
    }

    /// Publishes pending rows in id order, deleting each one only after
    /// the broker acknowledges it. Stops at the first failed publish so
    /// per-aggregate order is never violated.
    async fn forward_batch(&self) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        let rows = event_outbox::table
            .order(event_outbox::id.asc())
            .limit(self.batch_size)
            .load::<OutboxRow>(&mut conn)
            .await?;

        for row in rows {
            let record = FutureRecord::to(&row.aggregatetype)
                .key(&row.aggregateid)
                .payload(&row.payload);

            if let Err((err, _)) = self.producer.send(record, Duration::from_secs(5)).await {
                return Err(ServiceError::wrap(
                    ErrorCode::ExtService,
                    format!("failed to publish outbox row {} to {}", row.id, row.aggregatetype),
                    err,
                ));
            }

            diesel::delete(event_outbox::table.filter(event_outbox::id.eq(row.id)))
                .execute(&mut conn)
                .await?;

            debug!(id = row.id, topic = %row.aggregatetype, "forwarded outbox row");
        }

        Ok(())
    }
}
