use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[diesel(table_name = crate::schema::customer_balances)]
pub struct CustomerBalance {
    pub customer_id: Uuid,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
    pub processed_at: DateTime<Utc>,
    pub reversed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::transactions)]
pub struct NewTransactionRow {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
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
