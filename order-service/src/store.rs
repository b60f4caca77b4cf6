use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{OutboxRecord, ServiceError};
use tracing::warn;
use uuid::Uuid;

use crate::events;
use crate::models::{NewOrderRow, NewOutboxRow, Order, OrderItemRow, OrderRow, OrderStatus};
use crate::schema::{event_outbox, order_items, orders};

pub type DbPool = Pool<AsyncPgConnection>;

/// Storage operations owned by the order service.
///
/// Every mutation appends its outbound events to the `event_outbox` table
/// within the same database transaction as the aggregate change.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, order_id: Uuid) -> Result<Order, ServiceError>;
    async fn get_customer_orders(&self, customer_id: Uuid) -> Result<Vec<Order>, ServiceError>;

    /// Creates the order in `PROCESSING` and enqueues `OrderCreated`.
    async fn create_order(
        &self,
        customer_id: Uuid,
        items: HashMap<Uuid, i32>,
    ) -> Result<Order, ServiceError>;

    /// `PROCESSING -> PENDING` with prices attached; enqueues `OrderPending`.
    async fn process_order(
        &self,
        order_id: Uuid,
        items_price: BigDecimal,
        total_price: BigDecimal,
    ) -> Result<(), ServiceError>;

    /// Attaches the settling transaction to a `PENDING` order. The
    /// payment outcome and the shipment allocation arrive on different
    /// topics, so either may land first: the `PENDING -> APPROVED`
    /// transition (and its `OrderApproved` event) fires once both ids
    /// are attached, from whichever arrives last.
    async fn approve_order(&self, order_id: Uuid, transaction_id: Uuid)
        -> Result<(), ServiceError>;

    /// `PROCESSING|PENDING -> REJECTED`; enqueues `OrderRejected`.
    async fn reject_order(&self, order_id: Uuid) -> Result<(), ServiceError>;

    /// Attaches the allocated shipment, and completes a pending approval
    /// when the payment outcome arrived first. Never errors on orders
    /// already settled (a late allocation leaves a rejected order
    /// rejected).
    async fn set_order_shipment_id(
        &self,
        order_id: Uuid,
        shipping_id: Uuid,
    ) -> Result<(), ServiceError>;
}

pub struct PgOrderStore {
    pool: DbPool,
}

impl PgOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn load_items(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<HashMap<Uuid, i32>, ServiceError> {
    let rows = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .load::<OrderItemRow>(conn)
        .await?;

    Ok(rows.into_iter().map(|row| (row.product_id, row.quantity)).collect())
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

/// Moves a `PENDING` order to `APPROVED` once both the transaction and
/// the shipment are attached. The WHERE clause makes this a no-op while
/// either id is still missing and guarantees `OrderApproved` is enqueued
/// exactly once.
async fn try_complete_approval(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<(), ServiceError> {
    let row = diesel::update(
        orders::table
            .filter(orders::id.eq(order_id))
            .filter(orders::status.eq(OrderStatus::Pending.as_str()))
            .filter(orders::transaction_id.is_not_null())
            .filter(orders::shipping_id.is_not_null()),
    )
    .set((
        orders::status.eq(OrderStatus::Approved.as_str()),
        orders::updated_at.eq(diesel::dsl::now),
    ))
    .get_result::<OrderRow>(conn)
    .await
    .optional()?;

    let Some(row) = row else {
        return Ok(());
    };

    let items = load_items(conn, order_id).await?;
    let order = row.into_order(items)?;
    insert_outbox(conn, events::order_approved(&order)?).await?;

    Ok(())
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn get_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        let mut conn = self.pool.get().await?;

        let row = orders::table
            .filter(orders::id.eq(order_id))
            .first::<OrderRow>(&mut conn)
            .await?;
        let items = load_items(&mut conn, order_id).await?;

        row.into_order(items)
    }

    async fn get_customer_orders(&self, customer_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        let mut conn = self.pool.get().await?;

        let rows = orders::table
            .filter(orders::customer_id.eq(customer_id))
            .order(orders::created_at.desc())
            .load::<OrderRow>(&mut conn)
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let items = load_items(&mut conn, row.id).await?;
            result.push(row.into_order(items)?);
        }

        Ok(result)
    }

    async fn create_order(
        &self,
        customer_id: Uuid,
        items: HashMap<Uuid, i32>,
    ) -> Result<Order, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<Order, ServiceError, _>(|conn| {
            async move {
                let row = diesel::insert_into(orders::table)
                    .values(NewOrderRow {
                        id: Uuid::new_v4(),
                        status: OrderStatus::Processing.as_str().to_string(),
                        customer_id,
                    })
                    .get_result::<OrderRow>(conn)
                    .await?;

                let item_rows: Vec<OrderItemRow> = items
                    .iter()
                    .map(|(product_id, quantity)| OrderItemRow {
                        order_id: row.id,
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect();
                diesel::insert_into(order_items::table)
                    .values(&item_rows)
                    .execute(conn)
                    .await?;

                let order = row.into_order(items)?;
                insert_outbox(conn, events::order_created(&order)?).await?;

                Ok(order)
            }
            .scope_boxed()
        })
        .await
    }

    async fn process_order(
        &self,
        order_id: Uuid,
        items_price: BigDecimal,
        total_price: BigDecimal,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let row = diesel::update(
                    orders::table
                        .filter(orders::id.eq(order_id))
                        .filter(orders::status.eq(OrderStatus::Processing.as_str())),
                )
                .set((
                    orders::status.eq(OrderStatus::Pending.as_str()),
                    orders::items_price.eq(Some(items_price)),
                    orders::total_price.eq(Some(total_price)),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .get_result::<OrderRow>(conn)
                .await
                .optional()?;

                let Some(row) = row else {
                    warn!(%order_id, "price quote ignored: order not in PROCESSING");
                    return Ok(());
                };

                let items = load_items(conn, order_id).await?;
                let order = row.into_order(items)?;
                insert_outbox(conn, events::order_pending(&order)?).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn approve_order(
        &self,
        order_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let attached = diesel::update(
                    orders::table
                        .filter(orders::id.eq(order_id))
                        .filter(orders::status.eq(OrderStatus::Pending.as_str())),
                )
                .set((
                    orders::transaction_id.eq(Some(transaction_id)),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await?;

                if attached == 0 {
                    warn!(%order_id, "payment result ignored: order not in PENDING");
                    return Ok(());
                }

                // The shipment allocation may not have been consumed yet;
                // in that case approval completes when it arrives.
                try_complete_approval(conn, order_id).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn reject_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let open_states = [
                    OrderStatus::Processing.as_str(),
                    OrderStatus::Pending.as_str(),
                ];
                let row = diesel::update(
                    orders::table
                        .filter(orders::id.eq(order_id))
                        .filter(orders::status.eq_any(open_states)),
                )
                .set((
                    orders::status.eq(OrderStatus::Rejected.as_str()),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .get_result::<OrderRow>(conn)
                .await
                .optional()?;

                let Some(row) = row else {
                    warn!(%order_id, "rejection ignored: order already terminal");
                    return Ok(());
                };

                let items = load_items(conn, order_id).await?;
                let order = row.into_order(items)?;
                insert_outbox(conn, events::order_rejected(&order)?).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn set_order_shipment_id(
        &self,
        order_id: Uuid,
        shipping_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let updated = diesel::update(orders::table.filter(orders::id.eq(order_id)))
                    .set((
                        orders::shipping_id.eq(Some(shipping_id)),
                        orders::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;

                if updated == 0 {
                    warn!(%order_id, "shipment allocation ignored: unknown order");
                    return Ok(());
                }

                // The payment outcome may have been consumed first; the
                // deferred approval completes here in that case.
                try_complete_approval(conn, order_id).await
            }
            .scope_boxed()
        })
        .await
    }
}
