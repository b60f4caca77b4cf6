use std::collections::HashMap;

use shared::{
    topics, OrderMetadata, OutboxRecord, ReservationStatus, ServiceError, StockAddedEvent,
    StockCreatedEvent, StockRemovedEvent, StockReservationEvent, EVENT_REVISION,
};
use uuid::Uuid;

use crate::models::ProductStock;

pub fn stock_created(stock: &ProductStock) -> Result<OutboxRecord, ServiceError> {
    let event = StockCreatedEvent {
        revision: EVENT_REVISION,
        product_id: stock.product_id,
        quantity: stock.quantity,
    };

    OutboxRecord::new(stock.product_id, topics::WAREHOUSE_STOCK_CREATED, &event)
}

pub fn stock_added(
    product_id: Uuid,
    amount: i32,
    reservation_id: Option<Uuid>,
) -> Result<OutboxRecord, ServiceError> {
    let event = StockAddedEvent {
        revision: EVENT_REVISION,
        product_id,
        amount,
        reservation_id,
    };

    OutboxRecord::new(product_id, topics::WAREHOUSE_STOCK_ADDED, &event)
}

pub fn stock_removed(
    product_id: Uuid,
    amount: i32,
    reservation_id: Option<Uuid>,
) -> Result<OutboxRecord, ServiceError> {
    let event = StockRemovedEvent {
        revision: EVENT_REVISION,
        product_id,
        amount,
        reservation_id,
    };

    OutboxRecord::new(product_id, topics::WAREHOUSE_STOCK_REMOVED, &event)
}

pub fn reservation_failed(
    order_id: Uuid,
    order_metadata: OrderMetadata,
    insufficient_stock: Vec<Uuid>,
) -> Result<OutboxRecord, ServiceError> {
    let event = StockReservationEvent {
        revision: EVENT_REVISION,
        status: ReservationStatus::InsufficientStock,
        order_id,
        order_metadata: Some(order_metadata),
        reservation_id: None,
        reservation_stock: HashMap::new(),
        insufficient_stock,
    };

    OutboxRecord::new(order_id, topics::WAREHOUSE_RESERVATION_FAILED, &event)
}

pub fn reservation_reserved(
    order_id: Uuid,
    order_metadata: OrderMetadata,
    reservation_id: Uuid,
    reservation_stock: HashMap<Uuid, i32>,
) -> Result<OutboxRecord, ServiceError> {
    let event = StockReservationEvent {
        revision: EVENT_REVISION,
        status: ReservationStatus::Reserved,
        order_id,
        order_metadata: Some(order_metadata),
        reservation_id: Some(reservation_id),
        reservation_stock,
        insufficient_stock: vec![],
    };

    OutboxRecord::new(reservation_id, topics::WAREHOUSE_RESERVATION_RESERVED, &event)
}

pub fn reservation_returned(
    order_id: Uuid,
    reservation_id: Uuid,
    reservation_stock: HashMap<Uuid, i32>,
) -> Result<OutboxRecord, ServiceError> {
    let event = StockReservationEvent {
        revision: EVENT_REVISION,
        status: ReservationStatus::Returned,
        order_id,
        order_metadata: None,
        reservation_id: Some(reservation_id),
        reservation_stock,
        insufficient_stock: vec![],
    };

    OutboxRecord::new(reservation_id, topics::WAREHOUSE_RESERVATION_RETURNED, &event)
}

pub fn reservation_consumed(
    order_id: Uuid,
    reservation_id: Uuid,
    reservation_stock: HashMap<Uuid, i32>,
) -> Result<OutboxRecord, ServiceError> {
    let event = StockReservationEvent {
        revision: EVENT_REVISION,
        status: ReservationStatus::Consumed,
        order_id,
        order_metadata: None,
        reservation_id: Some(reservation_id),
        reservation_stock,
        insufficient_stock: vec![],
    };

    OutboxRecord::new(reservation_id, topics::WAREHOUSE_RESERVATION_CONSUMED, &event)
}
