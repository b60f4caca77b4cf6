use bigdecimal::BigDecimal;
use shared::{
    topics, BalanceClosedEvent, BalanceCreatedEvent, BalanceCreditedEvent, BalanceDebitedEvent,
    OutboxRecord, PaymentProcessedEvent, PaymentStatus, ServiceError, TransactionLoggedEvent,
    TransactionReversedEvent, EVENT_REVISION,
};
use uuid::Uuid;

use crate::models::{CustomerBalance, Transaction};

pub fn balance_created(balance: &CustomerBalance) -> Result<OutboxRecord, ServiceError> {
    let event = BalanceCreatedEvent {
        revision: EVENT_REVISION,
        customer_id: balance.customer_id,
        balance: balance.balance.clone(),
    };

    OutboxRecord::new(balance.customer_id, topics::PAYMENT_BALANCE_CREATED, &event)
}

pub fn balance_credited(
    customer_id: Uuid,
    amount: BigDecimal,
    new_balance: BigDecimal,
) -> Result<OutboxRecord, ServiceError> {
    let event = BalanceCreditedEvent {
        revision: EVENT_REVISION,
        customer_id,
        amount,
        new_balance,
    };

    OutboxRecord::new(customer_id, topics::PAYMENT_BALANCE_CREDITED, &event)
}

pub fn balance_debited(
    customer_id: Uuid,
    amount: BigDecimal,
    new_balance: BigDecimal,
) -> Result<OutboxRecord, ServiceError> {
    let event = BalanceDebitedEvent {
        revision: EVENT_REVISION,
        customer_id,
        amount,
        new_balance,
    };

    OutboxRecord::new(customer_id, topics::PAYMENT_BALANCE_DEBITED, &event)
}

pub fn balance_closed(balance: &CustomerBalance) -> Result<OutboxRecord, ServiceError> {
    let event = BalanceClosedEvent {
        revision: EVENT_REVISION,
        customer_id: balance.customer_id,
        balance: balance.balance.clone(),
    };

    OutboxRecord::new(balance.customer_id, topics::PAYMENT_BALANCE_CLOSED, &event)
}

pub fn transaction_logged(transaction: &Transaction) -> Result<OutboxRecord, ServiceError> {
    let event = TransactionLoggedEvent {
        revision: EVENT_REVISION,
        transaction_id: transaction.id,
        order_id: transaction.order_id,
        customer_id: transaction.customer_id,
        amount: transaction.amount.clone(),
    };

    OutboxRecord::new(transaction.id, topics::PAYMENT_TRANSACTION_CREATED, &event)
}

pub fn transaction_reversed(transaction: &Transaction) -> Result<OutboxRecord, ServiceError> {
    let event = TransactionReversedEvent {
        revision: EVENT_REVISION,
        transaction_id: transaction.id,
        order_id: transaction.order_id,
        customer_id: transaction.customer_id,
        amount: transaction.amount.clone(),
    };

    OutboxRecord::new(transaction.id, topics::PAYMENT_TRANSACTION_REVERSED, &event)
}

pub fn payment_success(transaction: &Transaction) -> Result<OutboxRecord, ServiceError> {
    let order_id = transaction.order_id.ok_or_else(|| {
        ServiceError::new(shared::ErrorCode::Service, "order payment without order id")
    })?;

    let event = PaymentProcessedEvent {
        revision: EVENT_REVISION,
        status: PaymentStatus::Success,
        order_id,
        customer_id: transaction.customer_id,
        amount: transaction.amount.clone(),
        transaction_id: Some(transaction.id),
    };

    OutboxRecord::new(order_id, topics::PAYMENT_PROCESSING, &event)
}

pub fn payment_failed(
    order_id: Uuid,
    customer_id: Uuid,
    amount: BigDecimal,
) -> Result<OutboxRecord, ServiceError> {
    let event = PaymentProcessedEvent {
        revision: EVENT_REVISION,
        status: PaymentStatus::Failed,
        order_id,
        customer_id,
        amount,
        transaction_id: None,
    };

    OutboxRecord::new(order_id, topics::PAYMENT_PROCESSING, &event)
}
