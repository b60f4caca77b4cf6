use std::sync::Arc;

use bigdecimal::BigDecimal;
use shared::gwauth::JwtClaims;
use shared::{
    AllocationStatus, ErrorCode, ServiceError, ShipmentAllocationEvent, UserCreatedEvent,
    UserDeletedEvent,
};
use uuid::Uuid;

use crate::models::{CustomerBalance, Transaction};
use crate::store::PaymentStore;

pub const SERVICE_NAME: &str = "payment";

pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn PaymentStore>) -> Self {
        Self { store }
    }

    /// Gateway callers may only see their own balance.
    pub async fn view_balance(
        &self,
        claims: Option<&JwtClaims>,
        customer_id: Uuid,
    ) -> Result<CustomerBalance, ServiceError> {
        let customer_id = match claims {
            Some(claims) => claims.sub.parse::<Uuid>().map_err(|err| {
                ServiceError::wrap(ErrorCode::Unauthorised, "invalid jwt subject", err)
            })?,
            None => customer_id,
        };

        self.store.get_balance(customer_id).await
    }

    pub async fn view_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, ServiceError> {
        self.store.get_transaction(transaction_id).await
    }

    pub async fn credit_balance(
        &self,
        customer_id: Uuid,
        amount: BigDecimal,
    ) -> Result<CustomerBalance, ServiceError> {
        if amount <= BigDecimal::from(0) {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: amount must be positive",
            ));
        }

        self.store.credit_balance(customer_id, amount).await
    }

    pub async fn reverse_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, ServiceError> {
        self.store.reverse_transaction(transaction_id).await
    }

    pub async fn process_user_created_event(
        &self,
        event: UserCreatedEvent,
    ) -> Result<(), ServiceError> {
        self.store.create_balance(event.user_id).await
    }

    pub async fn process_user_deleted_event(
        &self,
        event: UserDeletedEvent,
    ) -> Result<(), ServiceError> {
        self.store.close_balance(event.user_id).await
    }

    /// An allocated shipment is the cue to settle the order.
    pub async fn process_shipment_allocation_event(
        &self,
        event: ShipmentAllocationEvent,
    ) -> Result<(), ServiceError> {
        if event.status != AllocationStatus::Allocated {
            return Ok(());
        }

        let order_metadata = event.order_metadata.ok_or_else(|| {
            ServiceError::new(ErrorCode::Service, "allocation event without order metadata")
        })?;

        self.store
            .payment_for_order(
                event.order_id,
                order_metadata.customer_id,
                order_metadata.total_price,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use shared::{OrderMetadata, EVENT_REVISION};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateBalance(Uuid),
        Credit(Uuid, BigDecimal),
        Close(Uuid),
        Pay(Uuid, Uuid, BigDecimal),
        Reverse(Uuid),
    }

    #[derive(Default)]
    struct MockStore {
        calls: Mutex<Vec<Call>>,
    }

    impl MockStore {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentStore for MockStore {
        async fn get_balance(&self, customer_id: Uuid) -> Result<CustomerBalance, ServiceError> {
            Ok(CustomerBalance {
                customer_id,
                balance: BigDecimal::from(0),
            })
        }

        async fn get_transaction(
            &self,
            _transaction_id: Uuid,
        ) -> Result<Transaction, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "transaction not found"))
        }

        async fn create_balance(&self, customer_id: Uuid) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::CreateBalance(customer_id));
            Ok(())
        }

        async fn credit_balance(
            &self,
            customer_id: Uuid,
            amount: BigDecimal,
        ) -> Result<CustomerBalance, ServiceError> {
            self.calls.lock().unwrap().push(Call::Credit(customer_id, amount.clone()));
            Ok(CustomerBalance {
                customer_id,
                balance: amount,
            })
        }

        async fn close_balance(&self, customer_id: Uuid) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Close(customer_id));
            Ok(())
        }

        async fn payment_for_order(
            &self,
            order_id: Uuid,
            customer_id: Uuid,
            amount: BigDecimal,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Pay(order_id, customer_id, amount));
            Ok(())
        }

        async fn reverse_transaction(
            &self,
            transaction_id: Uuid,
        ) -> Result<Transaction, ServiceError> {
            self.calls.lock().unwrap().push(Call::Reverse(transaction_id));
            Ok(Transaction {
                id: transaction_id,
                order_id: None,
                customer_id: Uuid::new_v4(),
                amount: BigDecimal::from(0),
                processed_at: Utc::now(),
                reversed_at: Some(Utc::now()),
            })
        }
    }

    fn service() -> (PaymentService, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (PaymentService::new(store.clone()), store)
    }

    fn money(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn credit_requires_positive_amount() {
        let (svc, store) = service();

        let err = svc
            .credit_balance(Uuid::new_v4(), BigDecimal::from(0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn gateway_caller_sees_their_own_balance() {
        let (svc, _store) = service();
        let caller = Uuid::new_v4();
        let claims = JwtClaims {
            sub: caller.to_string(),
            iat: 0,
            exp: i64::MAX,
        };

        let balance = svc
            .view_balance(Some(&claims), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(balance.customer_id, caller);
    }

    #[tokio::test]
    async fn user_lifecycle_opens_and_closes_the_balance() {
        let (svc, store) = service();
        let user_id = Uuid::new_v4();

        svc.process_user_created_event(UserCreatedEvent {
            revision: EVENT_REVISION,
            user_id,
            email: "u@example.com".into(),
            first_name: "U".into(),
            last_name: "One".into(),
        })
        .await
        .unwrap();

        svc.process_user_deleted_event(UserDeletedEvent {
            revision: EVENT_REVISION,
            user_id,
        })
        .await
        .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::CreateBalance(user_id), Call::Close(user_id)]
        );
    }

    #[tokio::test]
    async fn allocated_shipment_settles_the_order_from_metadata() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();

        svc.process_shipment_allocation_event(ShipmentAllocationEvent {
            revision: EVENT_REVISION,
            status: AllocationStatus::Allocated,
            order_id,
            order_metadata: Some(OrderMetadata {
                customer_id,
                items_price: money("20.00"),
                total_price: money("20.00"),
            }),
            shipment_id: Some(Uuid::new_v4()),
            shipment_stock: HashMap::new(),
        })
        .await
        .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::Pay(order_id, customer_id, money("20.00"))]
        );
    }

    #[tokio::test]
    async fn released_allocation_is_ignored() {
        let (svc, store) = service();

        svc.process_shipment_allocation_event(ShipmentAllocationEvent {
            revision: EVENT_REVISION,
            status: AllocationStatus::Released,
            order_id: Uuid::new_v4(),
            order_metadata: None,
            shipment_id: None,
            shipment_stock: HashMap::new(),
        })
        .await
        .unwrap();

        assert!(store.calls().is_empty());
    }
}
