//! Event payload definitions for the order-fulfilment saga.
//!
//! Every event carries a `revision` so consumers can reject payloads from
//! an incompatible schema generation. Revision 2 moved monetary amounts
//! from 32-bit floats to fixed-point decimals.
//!
//! Payloads travel as opaque bytes: JSON-encoded here, written to the
//! `event_outbox` table by the owning service and forwarded verbatim to
//! the bus by the relay.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCode, ServiceError};

/// Current event schema revision.
pub const EVENT_REVISION: u32 = 2;

pub fn encode_event<T: Serialize>(event: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(event)
        .map_err(|err| ServiceError::wrap(ErrorCode::Service, "failed to encode event", err))
}

/// Decodes a bus payload. A failure is reported like any other record
/// failure: the consumer logs it and leaves the offset uncommitted.
pub fn decode_event<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(payload)
        .map_err(|err| ServiceError::wrap(ErrorCode::Service, "failed to decode event", err))
}

/// Order context forwarded along saga events so downstream services never
/// need a cross-service read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub customer_id: Uuid,
    pub items_price: BigDecimal,
    pub total_price: BigDecimal,
}

// ---------------------------------------------------------------------------
// Order service events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub revision: u32,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub item_quantities: HashMap<Uuid, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPendingEvent {
    pub revision: u32,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub item_quantities: HashMap<Uuid, i32>,
    pub items_price: BigDecimal,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderApprovedEvent {
    pub revision: u32,
    pub order_id: Uuid,
    pub transaction_id: Uuid,
    pub shipping_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRejectedEvent {
    pub revision: u32,
    pub order_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub shipping_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Product service events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceQuoteStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPriceQuoteEvent {
    pub revision: u32,
    pub status: PriceQuoteStatus,
    pub order_id: Uuid,
    pub item_quantities: HashMap<Uuid, i32>,
    pub item_prices: HashMap<Uuid, BigDecimal>,
    pub total_price: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreatedEvent {
    pub revision: u32,
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDeletedEvent {
    pub revision: u32,
    pub product_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPriceUpdatedEvent {
    pub revision: u32,
    pub product_id: Uuid,
    pub price: BigDecimal,
}

// ---------------------------------------------------------------------------
// Warehouse service events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockCreatedEvent {
    pub revision: u32,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAddedEvent {
    pub revision: u32,
    pub product_id: Uuid,
    pub amount: i32,
    pub reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRemovedEvent {
    pub revision: u32,
    pub product_id: Uuid,
    pub amount: i32,
    pub reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Reserved,
    InsufficientStock,
    Returned,
    Consumed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReservationEvent {
    pub revision: u32,
    pub status: ReservationStatus,
    pub order_id: Uuid,
    pub order_metadata: Option<OrderMetadata>,
    pub reservation_id: Option<Uuid>,
    pub reservation_stock: HashMap<Uuid, i32>,
    pub insufficient_stock: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Shipping service events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStatus {
    Allocated,
    Failed,
    Released,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentAllocationEvent {
    pub revision: u32,
    pub status: AllocationStatus,
    pub order_id: Uuid,
    pub order_metadata: Option<OrderMetadata>,
    pub shipment_id: Option<Uuid>,
    pub shipment_stock: HashMap<Uuid, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDispatchedEvent {
    pub revision: u32,
    pub shipment_id: Uuid,
    pub order_id: Uuid,
}

// ---------------------------------------------------------------------------
// Payment service events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessedEvent {
    pub revision: u32,
    pub status: PaymentStatus,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
    pub transaction_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceCreatedEvent {
    pub revision: u32,
    pub customer_id: Uuid,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceCreditedEvent {
    pub revision: u32,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
    pub new_balance: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceDebitedEvent {
    pub revision: u32,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
    pub new_balance: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceClosedEvent {
    pub revision: u32,
    pub customer_id: Uuid,
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLoggedEvent {
    pub revision: u32,
    pub transaction_id: Uuid,
    pub order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReversedEvent {
    pub revision: u32,
    pub transaction_id: Uuid,
    pub order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub amount: BigDecimal,
}

// ---------------------------------------------------------------------------
// User service events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreatedEvent {
    pub revision: u32,
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDeletedEvent {
    pub revision: u32,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEmailUpdatedEvent {
    pub revision: u32,
    pub user_id: Uuid,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_event::<OrderCreatedEvent>(b"\x00\x01not-json").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Service);
    }

    #[test]
    fn reservation_event_carries_metadata_through_encoding() {
        let order_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();
        let event = StockReservationEvent {
            revision: EVENT_REVISION,
            status: ReservationStatus::Reserved,
            order_id,
            order_metadata: Some(OrderMetadata {
                customer_id: Uuid::new_v4(),
                items_price: BigDecimal::from_str("20.00").unwrap(),
                total_price: BigDecimal::from_str("20.00").unwrap(),
            }),
            reservation_id: Some(Uuid::new_v4()),
            reservation_stock: HashMap::from([(product_id, 2)]),
            insufficient_stock: vec![],
        };

        let bytes = encode_event(&event).unwrap();
        let decoded: StockReservationEvent = decode_event(&bytes).unwrap();
        assert_eq!(decoded.status, ReservationStatus::Reserved);
        assert_eq!(decoded.order_id, order_id);
        assert_eq!(decoded.reservation_stock[&product_id], 2);
        assert_eq!(
            decoded.order_metadata.unwrap().total_price,
            BigDecimal::from_str("20.00").unwrap()
        );
    }

    #[test]
    fn monetary_amounts_survive_as_exact_decimals() {
        let event = BalanceDebitedEvent {
            revision: EVENT_REVISION,
            customer_id: Uuid::new_v4(),
            amount: BigDecimal::from_str("0.10").unwrap(),
            new_balance: BigDecimal::from_str("99.90").unwrap(),
        };

        let decoded: BalanceDebitedEvent = decode_event(&encode_event(&event).unwrap()).unwrap();
        assert_eq!(decoded.amount, BigDecimal::from_str("0.10").unwrap());
        assert_eq!(decoded.new_balance, BigDecimal::from_str("99.90").unwrap());
    }
}
