use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use shared::{ErrorCode, ServiceError};
use uuid::Uuid;

/// Order lifecycle states.
///
/// `Approved` and `Rejected` are terminal; an event that would transition
/// a terminal order is acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Pending => "PENDING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value {
            "PROCESSING" => Ok(OrderStatus::Processing),
            "PENDING" => Ok(OrderStatus::Pending),
            "APPROVED" => Ok(OrderStatus::Approved),
            "REJECTED" => Ok(OrderStatus::Rejected),
            other => Err(ServiceError::new(
                ErrorCode::Service,
                format!("unknown order status: {other}"),
            )),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Rejected)
    }

    /// Valid edges of the order state machine.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Processing, OrderStatus::Pending)
                | (OrderStatus::Processing, OrderStatus::Rejected)
                | (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Pending, OrderStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub customer_id: Uuid,
    pub items: HashMap<Uuid, i32>,
    pub items_price: Option<BigDecimal>,
    pub total_price: Option<BigDecimal>,
    pub shipping_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable)]
pub struct OrderRow {
    pub id: Uuid,
    pub status: String,
    pub customer_id: Uuid,
    pub items_price: Option<BigDecimal>,
    pub total_price: Option<BigDecimal>,
    pub shipping_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(self, items: HashMap<Uuid, i32>) -> Result<Order, ServiceError> {
        Ok(Order {
            id: self.id,
            status: OrderStatus::parse(&self.status)?,
            customer_id: self.customer_id,
            items,
            items_price: self.items_price,
            total_price: self.total_price,
            shipping_id: self.shipping_id,
            transaction_id: self.transaction_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub status: String,
    pub customer_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct OrderItemRow {
    pub order_id: Uuid,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in [
            OrderStatus::Processing,
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Rejected,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(OrderStatus::parse("SHIPPED").is_err());
    }

    #[test]
    fn state_machine_edges() {
        use OrderStatus::*;

        assert!(Processing.can_transition(Pending));
        assert!(Processing.can_transition(Rejected));
        assert!(Pending.can_transition(Approved));
        assert!(Pending.can_transition(Rejected));

        assert!(!Processing.can_transition(Approved));
        assert!(!Pending.can_transition(Processing));
        for terminal in [Approved, Rejected] {
            assert!(terminal.is_terminal());
            for to in [Processing, Pending, Approved, Rejected] {
                assert!(!terminal.can_transition(to));
            }
        }
    }
}
