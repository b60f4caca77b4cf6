use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{ErrorCode, OrderMetadata, OutboxRecord, ServiceError};
use tracing::warn;
use uuid::Uuid;

use crate::events;
use crate::models::{NewOutboxRow, NewShipmentRow, Shipment, ShipmentItem};
use crate::schema::{event_outbox, shipment_items, shipments};

pub type DbPool = Pool<AsyncPgConnection>;

#[async_trait]
pub trait ShippingStore: Send + Sync {
    async fn get_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError>;
    async fn get_shipment_items(
        &self,
        shipment_id: Uuid,
    ) -> Result<Vec<ShipmentItem>, ServiceError>;

    /// Allocates the shipment for a reserved order. A redelivered
    /// reservation finds the existing shipment via the unique `order_id`
    /// constraint and changes nothing.
    async fn allocate_order_shipment(
        &self,
        order_id: Uuid,
        order_metadata: OrderMetadata,
        product_quantities: HashMap<Uuid, i32>,
    ) -> Result<(), ServiceError>;

    /// Compensation: releases the allocation after a failed payment.
    async fn cancel_order_shipment(&self, order_id: Uuid) -> Result<(), ServiceError>;

    async fn dispatch_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError>;
}

pub struct PgShippingStore {
    pool: DbPool,
}

impl PgShippingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn insert_outbox(
    conn: &mut AsyncPgConnection,
    record: OutboxRecord,
) -> Result<(), ServiceError> {
    diesel::insert_into(event_outbox::table)
        .values(NewOutboxRow::from(record))
        .execute(conn)
        .await?;

    Ok(())
}

async fn load_shipment_items(
    conn: &mut AsyncPgConnection,
    shipment_id: Uuid,
) -> Result<Vec<ShipmentItem>, ServiceError> {
    let items = shipment_items::table
        .filter(shipment_items::shipment_id.eq(shipment_id))
        .load::<ShipmentItem>(conn)
        .await?;

    Ok(items)
}

#[async_trait]
impl ShippingStore for PgShippingStore {
    async fn get_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError> {
        let mut conn = self.pool.get().await?;

        let shipment = shipments::table
            .filter(shipments::id.eq(shipment_id))
            .first::<Shipment>(&mut conn)
            .await?;

        Ok(shipment)
    }

    async fn get_shipment_items(
        &self,
        shipment_id: Uuid,
    ) -> Result<Vec<ShipmentItem>, ServiceError> {
        let mut conn = self.pool.get().await?;
        load_shipment_items(&mut conn, shipment_id).await
    }

    async fn allocate_order_shipment(
        &self,
        order_id: Uuid,
        order_metadata: OrderMetadata,
        product_quantities: HashMap<Uuid, i32>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        let result = conn
            .transaction::<(), ServiceError, _>(|conn| {
                async move {
                    let shipment_id = Uuid::new_v4();
                    diesel::insert_into(shipments::table)
                        .values(NewShipmentRow {
                            id: shipment_id,
                            order_id,
                        })
                        .execute(conn)
                        .await?;

                    let item_rows: Vec<ShipmentItem> = product_quantities
                        .iter()
                        .map(|(product_id, quantity)| ShipmentItem {
                            shipment_id,
                            product_id: *product_id,
                            quantity: *quantity,
                        })
                        .collect();
                    diesel::insert_into(shipment_items::table)
                        .values(&item_rows)
                        .execute(conn)
                        .await?;

                    insert_outbox(
                        conn,
                        events::shipment_allocated(
                            order_id,
                            order_metadata,
                            shipment_id,
                            product_quantities,
                        )?,
                    )
                    .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Err(err) if err.code() == ErrorCode::AlreadyExists => {
                warn!(%order_id, "order already has a shipment, nothing to do");
                Ok(())
            }
            other => other,
        }
    }

    async fn cancel_order_shipment(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let shipment = shipments::table
                    .filter(shipments::order_id.eq(order_id))
                    .first::<Shipment>(conn)
                    .await
                    .optional()?;

                let Some(shipment) = shipment else {
                    warn!(%order_id, "no shipment to cancel");
                    return Ok(());
                };

                let items = load_shipment_items(conn, shipment.id).await?;
                let stock: HashMap<Uuid, i32> = items
                    .into_iter()
                    .map(|item| (item.product_id, item.quantity))
                    .collect();

                diesel::delete(
                    shipment_items::table.filter(shipment_items::shipment_id.eq(shipment.id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(shipments::table.filter(shipments::id.eq(shipment.id)))
                    .execute(conn)
                    .await?;

                insert_outbox(conn, events::shipment_released(order_id, shipment.id, stock)?)
                    .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn dispatch_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<Shipment, ServiceError, _>(|conn| {
            async move {
                let shipment = diesel::update(
                    shipments::table
                        .filter(shipments::id.eq(shipment_id))
                        .filter(shipments::dispatched.eq(false)),
                )
                .set(shipments::dispatched.eq(true))
                .get_result::<Shipment>(conn)
                .await
                .optional()?;

                match shipment {
                    Some(shipment) => {
                        insert_outbox(conn, events::shipment_dispatched(&shipment)?).await?;
                        Ok(shipment)
                    }
                    // Already dispatched, or unknown id.
                    None => {
                        let shipment = shipments::table
                            .filter(shipments::id.eq(shipment_id))
                            .first::<Shipment>(conn)
                            .await?;
                        Ok(shipment)
                    }
                }
            }
            .scope_boxed()
        })
        .await
    }
}
