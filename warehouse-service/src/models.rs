use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Insertable, Serialize)]
#[diesel(table_name = crate::schema::product_stock)]
pub struct ProductStock {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub id: Uuid,
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reserved_stock: HashMap<Uuid, i32>,
}

#[derive(Debug, Clone, Queryable)]
pub struct ReservationRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ReservationRow {
    pub fn into_reservation(self, reserved_stock: HashMap<Uuid, i32>) -> Reservation {
        Reservation {
            id: self.id,
            order_id: self.order_id,
            created_at: self.created_at,
            reserved_stock,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct NewReservationRow {
    pub id: Uuid,
    pub order_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::reservation_items)]
pub struct ReservationItemRow {
    pub reservation_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
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
