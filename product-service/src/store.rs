use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{OutboxRecord, ServiceError};
use uuid::Uuid;

use crate::events;
use crate::models::{NewOutboxRow, NewProductRow, Product};
use crate::schema::{event_outbox, products};

pub type DbPool = Pool<AsyncPgConnection>;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_product(&self, product_id: Uuid) -> Result<Product, ServiceError>;
    async fn get_products(&self) -> Result<Vec<Product>, ServiceError>;

    async fn create_product(
        &self,
        name: String,
        description: String,
        price: BigDecimal,
    ) -> Result<Product, ServiceError>;
    async fn update_product_price(
        &self,
        product_id: Uuid,
        price: BigDecimal,
    ) -> Result<Product, ServiceError>;
    async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError>;

    /// Quotes an order's cart and enqueues the resulting
    /// `product.pricequotation` event (available or unavailable).
    async fn price_order_products(
        &self,
        order_id: Uuid,
        item_quantities: HashMap<Uuid, i32>,
    ) -> Result<(), ServiceError>;
}

/// Computes the quote total, or `None` when any cart product has no
/// fetched price.
pub fn compute_quote(
    item_prices: &HashMap<Uuid, BigDecimal>,
    item_quantities: &HashMap<Uuid, i32>,
) -> Option<BigDecimal> {
    let mut total = BigDecimal::from(0);
    for (product_id, quantity) in item_quantities {
        let price = item_prices.get(product_id)?;
        total += price * BigDecimal::from(*quantity);
    }

    Some(total)
}

pub struct PgProductStore {
    pool: DbPool,
}

impl PgProductStore {
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

#[async_trait]
impl ProductStore for PgProductStore {
    async fn get_product(&self, product_id: Uuid) -> Result<Product, ServiceError> {
        let mut conn = self.pool.get().await?;

        let product = products::table
            .filter(products::id.eq(product_id))
            .first::<Product>(&mut conn)
            .await?;

        Ok(product)
    }

    async fn get_products(&self) -> Result<Vec<Product>, ServiceError> {
        let mut conn = self.pool.get().await?;

        let rows = products::table
            .order(products::created_at.asc())
            .load::<Product>(&mut conn)
            .await?;

        Ok(rows)
    }

    async fn create_product(
        &self,
        name: String,
        description: String,
        price: BigDecimal,
    ) -> Result<Product, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<Product, ServiceError, _>(|conn| {
            async move {
                let product = diesel::insert_into(products::table)
                    .values(NewProductRow {
                        id: Uuid::new_v4(),
                        name,
                        description,
                        price,
                    })
                    .get_result::<Product>(conn)
                    .await?;

                insert_outbox(conn, events::product_created(&product)?).await?;

                Ok(product)
            }
            .scope_boxed()
        })
        .await
    }

    async fn update_product_price(
        &self,
        product_id: Uuid,
        price: BigDecimal,
    ) -> Result<Product, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<Product, ServiceError, _>(|conn| {
            async move {
                let product = diesel::update(products::table.filter(products::id.eq(product_id)))
                    .set((
                        products::price.eq(price),
                        products::updated_at.eq(diesel::dsl::now),
                    ))
                    .get_result::<Product>(conn)
                    .await?;

                insert_outbox(conn, events::product_price_updated(&product)?).await?;

                Ok(product)
            }
            .scope_boxed()
        })
        .await
    }

    async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let product = products::table
                    .filter(products::id.eq(product_id))
                    .first::<Product>(conn)
                    .await?;

                diesel::delete(products::table.filter(products::id.eq(product_id)))
                    .execute(conn)
                    .await?;

                insert_outbox(conn, events::product_deleted(&product)?).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn price_order_products(
        &self,
        order_id: Uuid,
        item_quantities: HashMap<Uuid, i32>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let product_ids: Vec<Uuid> = item_quantities.keys().copied().collect();
                let rows = products::table
                    .filter(products::id.eq_any(&product_ids))
                    .select((products::id, products::price))
                    .load::<(Uuid, BigDecimal)>(conn)
                    .await?;

                let mut item_prices: HashMap<Uuid, BigDecimal> = HashMap::new();
                for (id, price) in rows {
                    item_prices.insert(id, price);
                }

                let record = match compute_quote(&item_prices, &item_quantities) {
                    Some(total_price) => events::price_quote_available(
                        order_id,
                        item_quantities,
                        item_prices,
                        total_price,
                    )?,
                    None => events::price_quote_unavailable(order_id)?,
                };
                insert_outbox(conn, record).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn money(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn quote_totals_price_times_quantity() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let prices = HashMap::from([(p1, money("10.00")), (p2, money("2.50"))]);
        let quantities = HashMap::from([(p1, 2), (p2, 4)]);

        assert_eq!(compute_quote(&prices, &quantities), Some(money("30.00")));
    }

    #[test]
    fn quote_of_empty_cart_is_zero() {
        assert_eq!(
            compute_quote(&HashMap::new(), &HashMap::new()),
            Some(BigDecimal::from(0))
        );
    }

    #[test]
    fn missing_product_price_makes_quote_unavailable() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let prices = HashMap::from([(known, money("10.00"))]);
        let quantities = HashMap::from([(known, 1), (unknown, 1)]);

        assert_eq!(compute_quote(&prices, &quantities), None);
    }
}
