//! Transactional outbox record.
//!
//! Services never publish to the bus directly. Every state-change method
//! prepares one or more [`OutboxRecord`]s and inserts them into the
//! service's `event_outbox` table inside the same database transaction as
//! the aggregate rows. The relay forwards `payload` to the `topic` with
//! `aggregate_id` as the partition key, preserving per-aggregate order.

use serde::Serialize;

use crate::error::ServiceError;
use crate::events::encode_event;

#[derive(Debug, Clone)]
pub struct OutboxRecord {
    pub aggregate_id: String,
    pub topic: &'static str,
    pub payload: Vec<u8>,
}

impl OutboxRecord {
    pub fn new<T: Serialize>(
        aggregate_id: impl ToString,
        topic: &'static str,
        event: &T,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            aggregate_id: aggregate_id.to_string(),
            topic,
            payload: encode_event(event)?,
        })
    }
}
