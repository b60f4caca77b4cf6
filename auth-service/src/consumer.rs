use std::sync::Arc;

use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::Message;
use shared::{decode_event, topics, ErrorCode, ServiceError};
use tracing::{error, warn};

use crate::service::AuthService;

pub const CONSUME_TOPICS: &[&str] = &[topics::USER_STATE_DELETED];

pub struct AuthConsumer {
    consumer: StreamConsumer,
    service: Arc<AuthService>,
}

impl AuthConsumer {
    pub fn new(consumer: StreamConsumer, service: Arc<AuthService>) -> Result<Self, ServiceError> {
        consumer
            .subscribe(CONSUME_TOPICS)
            .map_err(|err| ServiceError::wrap(ErrorCode::ExtService, "failed to subscribe", err))?;

        Ok(Self { consumer, service })
    }

    /// Consumes until the bus fails unrecoverably. A failure processing a
    /// single record is logged and its offset left uncommitted so the
    /// record is redelivered.
    pub async fn run(&self) -> Result<(), ServiceError> {
        let mut stream = self.consumer.stream();

        while let Some(message) = stream.next().await {
            let message = message.map_err(|err| {
                ServiceError::wrap(ErrorCode::ExtService, "unrecoverable bus error", err)
            })?;

            let payload = message.payload().unwrap_or_default();
            if let Err(err) = self.dispatch(message.topic(), payload).await {
                error!(
                    topic = message.topic(),
                    "failed to process record: {}",
                    err.log_chain()
                );
                continue;
            }

            self.consumer
                .commit_message(&message, CommitMode::Async)
                .map_err(|err| {
                    ServiceError::wrap(ErrorCode::ExtService, "failed to commit offset", err)
                })?;
        }

        Ok(())
    }

    pub fn stop(&self) {
        self.consumer.unsubscribe();
    }

    async fn dispatch(&self, topic: &str, payload: &[u8]) -> Result<(), ServiceError> {
        match topic {
            topics::USER_STATE_DELETED => {
                self.service
                    .process_user_deleted_event(decode_event(payload)?)
                    .await
            }
            other => {
                warn!(topic = other, "received record from unexpected topic");
                Ok(())
            }
        }
    }
}
