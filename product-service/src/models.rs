use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::event_outbox)]
pub struct NewOutboxRow {
    pub aggregateid: String,
    pub aggregatetype: String,
    pub payload: Vec<u8>,
}

impl From<shared::OutboxRecord> for NewOutboxRow {
    fn from(record: shared::OutboxRecord) -> Self {
        Self {
            aggregateid: record.aggregate_id,
            aggregatetype: record.topic.to_string(),
            payload: record.payload,
        }
    }
}
