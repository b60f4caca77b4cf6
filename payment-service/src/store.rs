use async_trait::async_trait;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{ErrorCode, OutboxRecord, ServiceError};
use tracing::warn;
use uuid::Uuid;

use crate::events;
use crate::models::{CustomerBalance, NewOutboxRow, NewTransactionRow, Transaction};
use crate::schema::{customer_balances, event_outbox, transactions};

pub type DbPool = Pool<AsyncPgConnection>;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get_balance(&self, customer_id: Uuid) -> Result<CustomerBalance, ServiceError>;
    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, ServiceError>;

    /// Opens a zero balance for a new customer. Redelivery finds the row
    /// already present and changes nothing.
    async fn create_balance(&self, customer_id: Uuid) -> Result<(), ServiceError>;

    async fn credit_balance(
        &self,
        customer_id: Uuid,
        amount: BigDecimal,
    ) -> Result<CustomerBalance, ServiceError>;

    /// Removes the balance row when the customer is deleted.
    async fn close_balance(&self, customer_id: Uuid) -> Result<(), ServiceError>;

    /// Settles an order: debit, ledger entry, `PaymentProcessed` outcome.
    ///
    /// The debit is rolled back whenever it would leave the balance
    /// negative (or the customer has no balance); only the failure
    /// announcement survives. A redelivered order finds the existing
    /// transaction via the unique `order_id` index and changes nothing.
    async fn payment_for_order(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        amount: BigDecimal,
    ) -> Result<(), ServiceError>;

    /// Refund: stamps `reversed_at` and credits the amount back.
    async fn reverse_transaction(&self, transaction_id: Uuid) -> Result<Transaction, ServiceError>;
}

pub struct PgPaymentStore {
    pool: DbPool,
}

impl PgPaymentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

enum DebitError {
    InsufficientBalance,
    Service(ServiceError),
}

impl From<diesel::result::Error> for DebitError {
    fn from(err: diesel::result::Error) -> Self {
        DebitError::Service(err.into())
    }
}

impl From<ServiceError> for DebitError {
    fn from(err: ServiceError) -> Self {
        DebitError::Service(err)
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
impl PaymentStore for PgPaymentStore {
    async fn get_balance(&self, customer_id: Uuid) -> Result<CustomerBalance, ServiceError> {
        let mut conn = self.pool.get().await?;

        let balance = customer_balances::table
            .filter(customer_balances::customer_id.eq(customer_id))
            .first::<CustomerBalance>(&mut conn)
            .await?;

        Ok(balance)
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, ServiceError> {
        let mut conn = self.pool.get().await?;

        let transaction = transactions::table
            .filter(transactions::id.eq(transaction_id))
            .first::<Transaction>(&mut conn)
            .await?;

        Ok(transaction)
    }

    async fn create_balance(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        let result = conn
            .transaction::<(), ServiceError, _>(|conn| {
                async move {
                    let balance = CustomerBalance {
                        customer_id,
                        balance: BigDecimal::from(0),
                    };
                    diesel::insert_into(customer_balances::table)
                        .values(&balance)
                        .execute(conn)
                        .await?;

                    insert_outbox(conn, events::balance_created(&balance)?).await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Err(err) if err.code() == ErrorCode::AlreadyExists => {
                warn!(%customer_id, "balance already exists, nothing to do");
                Ok(())
            }
            other => other,
        }
    }

    async fn credit_balance(
        &self,
        customer_id: Uuid,
        amount: BigDecimal,
    ) -> Result<CustomerBalance, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<CustomerBalance, ServiceError, _>(|conn| {
            async move {
                let balance = diesel::update(
                    customer_balances::table
                        .filter(customer_balances::customer_id.eq(customer_id)),
                )
                .set(customer_balances::balance.eq(customer_balances::balance + amount.clone()))
                .get_result::<CustomerBalance>(conn)
                .await?;

                insert_outbox(
                    conn,
                    events::balance_credited(customer_id, amount, balance.balance.clone())?,
                )
                .await?;

                Ok(balance)
            }
            .scope_boxed()
        })
        .await
    }

    async fn close_balance(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<(), ServiceError, _>(|conn| {
            async move {
                let balance = customer_balances::table
                    .filter(customer_balances::customer_id.eq(customer_id))
                    .first::<CustomerBalance>(conn)
                    .await
                    .optional()?;

                let Some(balance) = balance else {
                    warn!(%customer_id, "no balance to close");
                    return Ok(());
                };

                diesel::delete(
                    customer_balances::table
                        .filter(customer_balances::customer_id.eq(customer_id)),
                )
                .execute(conn)
                .await?;

                insert_outbox(conn, events::balance_closed(&balance)?).await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn payment_for_order(
        &self,
        order_id: Uuid,
        customer_id: Uuid,
        amount: BigDecimal,
    ) -> Result<(), ServiceError> {
        let mut conn = self.pool.get().await?;

        let debit_amount = amount.clone();
        let result = conn
            .transaction::<(), DebitError, _>(|conn| {
                async move {
                    // The UPDATE takes the row lock; the returned value is
                    // the post-debit balance, so concurrent debits cannot
                    // both pass the guard.
                    let balance = diesel::update(
                        customer_balances::table
                            .filter(customer_balances::customer_id.eq(customer_id)),
                    )
                    .set(
                        customer_balances::balance
                            .eq(customer_balances::balance - debit_amount.clone()),
                    )
                    .get_result::<CustomerBalance>(conn)
                    .await
                    .optional()?;

                    let balance = match balance {
                        Some(balance) if balance.balance >= BigDecimal::from(0) => balance,
                        _ => return Err(DebitError::InsufficientBalance),
                    };

                    insert_outbox(
                        conn,
                        events::balance_debited(
                            customer_id,
                            debit_amount.clone(),
                            balance.balance.clone(),
                        )?,
                    )
                    .await?;

                    let transaction = diesel::insert_into(transactions::table)
                        .values(NewTransactionRow {
                            id: Uuid::new_v4(),
                            order_id: Some(order_id),
                            customer_id,
                            amount: debit_amount,
                        })
                        .get_result::<Transaction>(conn)
                        .await
                        .map_err(|err| DebitError::Service(err.into()))?;

                    insert_outbox(conn, events::transaction_logged(&transaction)?).await?;
                    insert_outbox(conn, events::payment_success(&transaction)?).await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(DebitError::InsufficientBalance) => {
                // The debit was rolled back; only the failure outcome is
                // persisted.
                let mut conn = self.pool.get().await?;
                let record = events::payment_failed(order_id, customer_id, amount)?;
                insert_outbox(&mut conn, record).await?;
                Ok(())
            }
            Err(DebitError::Service(err)) if err.code() == ErrorCode::AlreadyExists => {
                warn!(%order_id, "order already has a transaction, nothing to do");
                Ok(())
            }
            Err(DebitError::Service(err)) => Err(err),
        }
    }

    async fn reverse_transaction(&self, transaction_id: Uuid) -> Result<Transaction, ServiceError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<Transaction, ServiceError, _>(|conn| {
            async move {
                let reversed = diesel::update(
                    transactions::table
                        .filter(transactions::id.eq(transaction_id))
                        .filter(transactions::reversed_at.is_null()),
                )
                .set(transactions::reversed_at.eq(diesel::dsl::now))
                .get_result::<Transaction>(conn)
                .await
                .optional()?;

                let Some(transaction) = reversed else {
                    // Already reversed, or unknown id.
                    let transaction = transactions::table
                        .filter(transactions::id.eq(transaction_id))
                        .first::<Transaction>(conn)
                        .await?;
                    return Ok(transaction);
                };

                let balance = diesel::update(
                    customer_balances::table
                        .filter(customer_balances::customer_id.eq(transaction.customer_id)),
                )
                .set(
                    customer_balances::balance
                        .eq(customer_balances::balance + transaction.amount.clone()),
                )
                .get_result::<CustomerBalance>(conn)
                .await
                .optional()?;

                match balance {
                    Some(balance) => {
                        insert_outbox(
                            conn,
                            events::balance_credited(
                                transaction.customer_id,
                                transaction.amount.clone(),
                                balance.balance,
                            )?,
                        )
                        .await?;
                    }
                    None => {
                        warn!(customer_id = %transaction.customer_id, "refund without balance row")
                    }
                }

                insert_outbox(conn, events::transaction_reversed(&transaction)?).await?;

                Ok(transaction)
            }
            .scope_boxed()
        })
        .await
    }
}
