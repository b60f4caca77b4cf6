use std::collections::HashMap;

use bigdecimal::BigDecimal;
use shared::{
    topics, OutboxRecord, PriceQuoteStatus, ProductCreatedEvent, ProductDeletedEvent,
    ProductPriceQuoteEvent, ProductPriceUpdatedEvent, ServiceError, EVENT_REVISION,
};
use uuid::Uuid;

use crate::models::Product;

pub fn product_created(product: &Product) -> Result<OutboxRecord, ServiceError> {
    let event = ProductCreatedEvent {
        revision: EVENT_REVISION,
        product_id: product.id,
        name: product.name.clone(),
        price: product.price.clone(),
    };

    OutboxRecord::new(product.id, topics::PRODUCT_STATE_CREATED, &event)
}

pub fn product_deleted(product: &Product) -> Result<OutboxRecord, ServiceError> {
    let event = ProductDeletedEvent {
        revision: EVENT_REVISION,
        product_id: product.id,
    };

    OutboxRecord::new(product.id, topics::PRODUCT_STATE_DELETED, &event)
}

pub fn product_price_updated(product: &Product) -> Result<OutboxRecord, ServiceError> {
    let event = ProductPriceUpdatedEvent {
        revision: EVENT_REVISION,
        product_id: product.id,
        price: product.price.clone(),
    };

    OutboxRecord::new(product.id, topics::PRODUCT_ATTR_PRICE, &event)
}

pub fn price_quote_available(
    order_id: Uuid,
    item_quantities: HashMap<Uuid, i32>,
    item_prices: HashMap<Uuid, BigDecimal>,
    total_price: BigDecimal,
) -> Result<OutboxRecord, ServiceError> {
    let event = ProductPriceQuoteEvent {
        revision: EVENT_REVISION,
        status: PriceQuoteStatus::Available,
        order_id,
        item_quantities,
        item_prices,
        total_price: Some(total_price),
    };

    OutboxRecord::new(order_id, topics::PRODUCT_PRICE_QUOTATION, &event)
}

pub fn price_quote_unavailable(order_id: Uuid) -> Result<OutboxRecord, ServiceError> {
    let event = ProductPriceQuoteEvent {
        revision: EVENT_REVISION,
        status: PriceQuoteStatus::Unavailable,
        order_id,
        item_quantities: HashMap::new(),
        item_prices: HashMap::new(),
        total_price: None,
    };

    OutboxRecord::new(order_id, topics::PRODUCT_PRICE_QUOTATION, &event)
}
