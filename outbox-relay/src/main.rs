mod config;
mod relay;
mod schema;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use tracing::info;

use crate::config::RelayConfig;
use crate::relay::OutboxRelay;

/// Tails one service's `event_outbox` table and forwards each row to the
/// bus topic named by its `aggregatetype`, keyed by `aggregateid`.
#[derive(Parser)]
#[command(name = "outbox-relay")]
struct Args {
    #[arg(long, env = "SERVICE_NAME")]
    service_name: String,

    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    db_host: String,

    #[arg(long, env = "POSTGRES_PORT", default_value = "5432")]
    db_port: u16,

    #[arg(long, env = "POSTGRES_USER", default_value = "postgres")]
    db_user: String,

    #[arg(long, env = "POSTGRES_PASSWORD", default_value = "password")]
    db_password: String,

    #[arg(long, env = "POSTGRES_DB")]
    db_name: String,

    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    kafka_brokers: String,

    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "1")]
    poll_interval_secs: u64,

    #[arg(long, env = "BATCH_SIZE", default_value = "100")]
    batch_size: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = RelayConfig {
        service_name: args.service_name,
        db_host: args.db_host,
        db_port: args.db_port,
        db_user: args.db_user,
        db_password: args.db_password,
        db_name: args.db_name,
    };

    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.dsn());
    let pool = Pool::builder().build(manager).await?;

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &args.kafka_brokers)
        .set("message.timeout.ms", "5000")
        .create()?;

    let relay = OutboxRelay::new(
        pool,
        producer,
        config.clone(),
        Duration::from_secs(args.poll_interval_secs),
        args.batch_size,
    );

    relay
        .reconcile()
        .await
        .map_err(|e| anyhow::anyhow!("reconcile failed: {e}"))?;

    info!(connector = %config.connector_name(), "outbox relay started");
    relay.run().await;

    Ok(())
}
