use std::sync::Arc;

use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::Message;
use shared::{decode_event, topics, ErrorCode, ServiceError};
use tracing::{error, warn};

use crate::service::OrderService;

pub const CONSUME_TOPICS: &[&str] = &[
    topics::PRODUCT_PRICE_QUOTATION,
    topics::WAREHOUSE_RESERVATION_FAILED,
    topics::SHIPPING_SHIPMENT_ALLOCATION,
    topics::PAYMENT_PROCESSING,
];

pub struct OrderConsumer {
    consumer: StreamConsumer,
    service: Arc<OrderService>,
}

impl OrderConsumer {
    pub fn new(
        consumer: StreamConsumer,
        service: Arc<OrderService>,
    ) -> Result<Self, ServiceError> {
        consumer
            .subscribe(CONSUME_TOPICS)
            .map_err(|err| ServiceError::wrap(ErrorCode::ExtService, "failed to subscribe", err))?;

        Ok(Self { consumer, service })
    }

    /// Consumes until the bus fails unrecoverably.
    ///
    /// A failure while processing a single record aborts that record's
    /// transaction; the error is logged and its offset is left
    /// uncommitted so the record is redelivered. Only bus-level errors
    /// terminate the loop.
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
            topics::PRODUCT_PRICE_QUOTATION => {
                self.service
                    .process_price_quote_event(decode_event(payload)?)
                    .await
            }
            topics::WAREHOUSE_RESERVATION_FAILED => {
                self.service
                    .process_stock_reservation_event(decode_event(payload)?)
                    .await
            }
            topics::SHIPPING_SHIPMENT_ALLOCATION => {
                self.service
                    .process_shipment_allocation_event(decode_event(payload)?)
                    .await
            }
            topics::PAYMENT_PROCESSING => {
                self.service
                    .process_payment_processed_event(decode_event(payload)?)
                    .await
            }
            other => {
                warn!(topic = other, "received record from unexpected topic");
                Ok(())
            }
        }
    }
}
