use std::collections::HashMap;

use shared::{
    topics, AllocationStatus, OrderMetadata, OutboxRecord, ServiceError, ShipmentAllocationEvent,
    ShipmentDispatchedEvent, EVENT_REVISION,
};
use uuid::Uuid;

use crate::models::Shipment;

pub fn shipment_allocated(
    order_id: Uuid,
    order_metadata: OrderMetadata,
    shipment_id: Uuid,
    shipment_stock: HashMap<Uuid, i32>,
) -> Result<OutboxRecord, ServiceError> {
    let event = ShipmentAllocationEvent {
        revision: EVENT_REVISION,
        status: AllocationStatus::Allocated,
        order_id,
        order_metadata: Some(order_metadata),
        shipment_id: Some(shipment_id),
        shipment_stock,
    };

    OutboxRecord::new(shipment_id, topics::SHIPPING_SHIPMENT_ALLOCATION, &event)
}

pub fn shipment_released(
    order_id: Uuid,
    shipment_id: Uuid,
    shipment_stock: HashMap<Uuid, i32>,
) -> Result<OutboxRecord, ServiceError> {
    let event = ShipmentAllocationEvent {
        revision: EVENT_REVISION,
        status: AllocationStatus::Released,
        order_id,
        order_metadata: None,
        shipment_id: Some(shipment_id),
        shipment_stock,
    };

    OutboxRecord::new(shipment_id, topics::SHIPPING_SHIPMENT_ALLOCATION, &event)
}

pub fn shipment_dispatched(shipment: &Shipment) -> Result<OutboxRecord, ServiceError> {
    let event = ShipmentDispatchedEvent {
        revision: EVENT_REVISION,
        shipment_id: shipment.id,
        order_id: shipment.order_id,
    };

    OutboxRecord::new(shipment.id, topics::SHIPPING_SHIPMENT_DISPATCHED, &event)
}
