use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Serialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
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
