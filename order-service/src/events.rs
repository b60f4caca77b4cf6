use shared::{
    topics, OrderApprovedEvent, OrderCreatedEvent, OrderPendingEvent, OrderRejectedEvent,
    OutboxRecord, ServiceError, EVENT_REVISION,
};

use crate::models::Order;

pub fn order_created(order: &Order) -> Result<OutboxRecord, ServiceError> {
    let event = OrderCreatedEvent {
        revision: EVENT_REVISION,
        order_id: order.id,
        customer_id: order.customer_id,
        item_quantities: order.items.clone(),
    };

    OutboxRecord::new(order.id, topics::ORDER_STATE_CREATED, &event)
}

pub fn order_pending(order: &Order) -> Result<OutboxRecord, ServiceError> {
    let items_price = order.items_price.clone().ok_or_else(|| {
        ServiceError::new(shared::ErrorCode::Service, "pending order without items price")
    })?;
    let total_price = order.total_price.clone().ok_or_else(|| {
        ServiceError::new(shared::ErrorCode::Service, "pending order without total price")
    })?;

    let event = OrderPendingEvent {
        revision: EVENT_REVISION,
        order_id: order.id,
        customer_id: order.customer_id,
        item_quantities: order.items.clone(),
        items_price,
        total_price,
    };

    OutboxRecord::new(order.id, topics::ORDER_STATE_PENDING, &event)
}

pub fn order_approved(order: &Order) -> Result<OutboxRecord, ServiceError> {
    let transaction_id = order.transaction_id.ok_or_else(|| {
        ServiceError::new(shared::ErrorCode::Service, "approved order without transaction id")
    })?;
    let shipping_id = order.shipping_id.ok_or_else(|| {
        ServiceError::new(shared::ErrorCode::Service, "approved order without shipping id")
    })?;

    let event = OrderApprovedEvent {
        revision: EVENT_REVISION,
        order_id: order.id,
        transaction_id,
        shipping_id,
    };

    OutboxRecord::new(order.id, topics::ORDER_STATE_APPROVED, &event)
}

pub fn order_rejected(order: &Order) -> Result<OutboxRecord, ServiceError> {
    let event = OrderRejectedEvent {
        revision: EVENT_REVISION,
        order_id: order.id,
        transaction_id: order.transaction_id,
        shipping_id: order.shipping_id,
    };

    OutboxRecord::new(order.id, topics::ORDER_STATE_REJECTED, &event)
}
