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
use crate::models::{
    NewOutboxRow, NewReservationRow, ProductStock, Reservation, ReservationItemRow, ReservationRow,
};
use crate::schema::{event_outbox, product_stock, reservation_items, reservations};

pub type DbPool = Pool<AsyncPgConnection>;

#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn get_product_stock(&self, product_id: Uuid) -> Result<ProductStock, ServiceError>;
    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation, ServiceError>;

    /// Creates the stock row for a new product. Redelivery finds the row
    /// already present and changes nothing.
    async fn create_product_stock(
        &self,
        product_id: Uuid,
        starting_quantity: i32,
    ) -> Result<(), ServiceError>;

    async fn add_product_stock(
        &self,
        product_id: Uuid,
        amount: i32,
    ) -> Result<ProductStock, ServiceError>;

    /// Reserves an order's stock, or records the insufficiency.
    ///
    /// The reservation transaction is rolled back in full when any item
    /// cannot be covered; only a `StockReservation.Failed` outbox row
    /// survives. A redelivered order finds the existing reservation via
    /// the unique `order_id` constraint and changes nothing.
    async fn reserve_order_stock(
        &self,
        order_id: Uuid,
        order_metadata: OrderMetadata,
        product_quantities: HashMap<Uuid, i32>,
    ) -> Result<(), ServiceError>;

    /// Compensation: puts the reserved quantities back on hand.
    async fn return_reserved_order_stock(&self, order_id: Uuid) -> Result<(), ServiceError>;

    /// Finalizes a paid order's reservation. Stock was already decremented
    /// at reserve time; consumption deletes the reservation and announces
    /// the removals.
    async fn consume_reserved_order_stock(&self, order_id: Uuid) -> Result<(), ServiceError>;
}

pub struct PgWarehouseStore {
    pool: DbPool,
}

impl PgWarehouseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Error type for the reservation transaction: insufficiency must roll the
/// transaction back while still reporting which products were short.
enum ReserveError {
    Insufficient(Vec<Uuid>),
    Service(ServiceError),
}

impl From<diesel::result::Error> for ReserveError {
    fn from(err: diesel::result::Error) -> Self {
        ReserveError::Service(err.into())
    }
}

impl From<ServiceError> for ReserveError {
    fn from(err: ServiceError) -> Self {
        ReserveError::Service(err)
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

async fn load_reservation_items(
    conn: &mut AsyncPgConnection,
    reservation_id: Uuid,
) -> Result<HashMap<Uuid, i32>, ServiceError> {
    let rows = reservation_items::table
        .filter(reservation_items::reservation_id.eq(reservation_id))
        .load::<ReservationItemRow>(conn)
        .await?;

    Ok(rows.into_iter().map(|row| (row.product_id, row.quantity)).collect())
}

async fn find_reservation_by_order(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
) -> Result<Option<Reservation>, ServiceError> {
    let row = reservations::table
        .filter(reservations::order_id.eq(order_id))
        .first::<ReservationRow>(conn)
        .await
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = load_reservation_items(conn, row.id).await?;
    Ok(Some(row.into_reservation(items)))
}

#[async_trait]
impl WarehouseStore for PgWarehouseStore {
    async fn get_product_stock(&self, product_id: Uuid) -> Result<ProductStock, ServiceError> {
        let mut conn = self.pool.get().await?;

        let stock = product_stock::table
            .filter(product_stock::product_id.eq(product_id))
            .first::<ProductStock>(&mut conn)
            .await?;

        Ok(stock)
    }

    async fn get_reservation(&self, reservation_id: Uuid) -> Result<Reservation, ServiceError> {
        let mut conn = self.pool.get().await?;

        let row = reservations::table
            .filter(reservations::id.eq(reservation_id))
            .first::<ReservationRow>(&mut conn)
            .await?;
        let items = load_reservation_items(&mut conn, reservation_id).await?;

        Ok(row.into_reservation(items))
    }

    async fn create_product_stock(
        &self,
        product_id: Uuid,
        starting_quantity: i32,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        let result = conn
            .transaction::<(), ServiceError, _>(|conn| {
                async move {
                    let stock = ProductStock {
                        product_id,
                        quantity: starting_quantity,
                    };
                    diesel::insert_into(product_stock::table)
                        .values(&stock)
                        .execute(conn)
                        .await?;

                    insert_outbox(conn, events::stock_created(&stock)?).await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Err(err) if err.code() == ErrorCode::AlreadyExists => {
                warn!(%product_id, "stock row already exists, nothing to do");
                Ok(())
            }
            other => other,
        }
    }

    async fn add_product_stock(
        &self,
        product_id: Uuid,
        amount: i32,
    ) -> Result<ProductStock, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<ProductStock, ServiceError, _>(|conn| {
            async move {
                let stock = diesel::update(
                    product_stock::table.filter(product_stock::product_id.eq(product_id)),
                )
                .set(product_stock::quantity.eq(product_stock::quantity + amount))
                .get_result::<ProductStock>(conn)
                .await?;

                insert_outbox(conn, events::stock_added(product_id, amount, None)?).await?;

                Ok(stock)
            }
            .scope_boxed()
        })
        .await
    }

    async fn reserve_order_stock(
        &self,
        order_id: Uuid,
        order_metadata: OrderMetadata,
        product_quantities: HashMap<Uuid, i32>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        let metadata = order_metadata.clone();
        let quantities = product_quantities.clone();
        let result = conn
            .transaction::<(), ReserveError, _>(|conn| {
                async move {
                    let reservation_id = Uuid::new_v4();
                    diesel::insert_into(reservations::table)
                        .values(NewReservationRow {
                            id: reservation_id,
                            order_id,
                        })
                        .execute(conn)
                        .await?;

                    let mut insufficient: Vec<Uuid> = vec![];
                    for (product_id, quantity) in &quantities {
                        // The UPDATE takes the row lock; the re-read below
                        // observes the post-decrement value within this
                        // transaction, so concurrent reservations cannot
                        // both pass the guard.
                        let updated = diesel::update(
                            product_stock::table
                                .filter(product_stock::product_id.eq(product_id)),
                        )
                        .set(product_stock::quantity.eq(product_stock::quantity - quantity))
                        .get_result::<ProductStock>(conn)
                        .await
                        .optional()?;

                        match updated {
                            Some(stock) if stock.quantity >= 0 => {
                                diesel::insert_into(reservation_items::table)
                                    .values(ReservationItemRow {
                                        reservation_id,
                                        product_id: *product_id,
                                        quantity: *quantity,
                                    })
                                    .execute(conn)
                                    .await?;
                            }
                            _ => insufficient.push(*product_id),
                        }
                    }

                    if !insufficient.is_empty() {
                        return Err(ReserveError::Insufficient(insufficient));
                    }

                    insert_outbox(
                        conn,
                        events::reservation_reserved(
                            order_id,
                            metadata,
                            reservation_id,
                            quantities,
                        )?,
                    )
                    .await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(ReserveError::Insufficient(insufficient)) => {
                // The reservation transaction was rolled back; only the
                // failure announcement is persisted.
                let mut conn = self.pool.get().await?;
                let record = events::reservation_failed(order_id, order_metadata, insufficient)?;
                insert_outbox(&mut conn, record).await?;
                Ok(())
            }
            Err(ReserveError::Service(err)) if err.code() == ErrorCode::AlreadyExists => {
                warn!(%order_id, "order already has a reservation, nothing to do");
                Ok(())
            }
            Err(ReserveError::Service(err)) => Err(err),
        }
    }

    async fn return_reserved_order_stock(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let Some(reservation) = find_reservation_by_order(conn, order_id).await? else {
                    warn!(%order_id, "no active reservation to return");
                    return Ok(());
                };

                for (product_id, quantity) in &reservation.reserved_stock {
                    diesel::update(
                        product_stock::table.filter(product_stock::product_id.eq(product_id)),
                    )
                    .set(product_stock::quantity.eq(product_stock::quantity + quantity))
                    .execute(conn)
                    .await?;
                }

                diesel::delete(
                    reservation_items::table
                        .filter(reservation_items::reservation_id.eq(reservation.id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(reservations::table.filter(reservations::id.eq(reservation.id)))
                    .execute(conn)
                    .await?;

                insert_outbox(
                    conn,
                    events::reservation_returned(
                        order_id,
                        reservation.id,
                        reservation.reserved_stock,
                    )?,
                )
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn consume_reserved_order_stock(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let Some(reservation) = find_reservation_by_order(conn, order_id).await? else {
                    warn!(%order_id, "no active reservation to consume");
                    return Ok(());
                };

                for (product_id, quantity) in &reservation.reserved_stock {
                    insert_outbox(
                        conn,
                        events::stock_removed(*product_id, *quantity, Some(reservation.id))?,
                    )
                    .await?;
                }

                diesel::delete(
                    reservation_items::table
                        .filter(reservation_items::reservation_id.eq(reservation.id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(reservations::table.filter(reservations::id.eq(reservation.id)))
                    .execute(conn)
                    .await?;

                insert_outbox(
                    conn,
                    events::reservation_consumed(
                        order_id,
                        reservation.id,
                        reservation.reserved_stock,
                    )?,
                )
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }
}
