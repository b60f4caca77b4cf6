use std::sync::Arc;

use shared::{
    AllocationStatus, ErrorCode, OrderMetadata, OrderPendingEvent, PaymentProcessedEvent,
    PaymentStatus, ProductCreatedEvent, ServiceError, ShipmentAllocationEvent,
};
use uuid::Uuid;

use crate::models::{ProductStock, Reservation};
use crate::store::WarehouseStore;

pub const SERVICE_NAME: &str = "warehouse";

pub struct WarehouseService {
    store: Arc<dyn WarehouseStore>,
}

impl WarehouseService {
    pub fn new(store: Arc<dyn WarehouseStore>) -> Self {
        Self { store }
    }

    pub async fn view_product_stock(&self, product_id: Uuid) -> Result<ProductStock, ServiceError> {
        self.store.get_product_stock(product_id).await
    }

    pub async fn view_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Reservation, ServiceError> {
        self.store.get_reservation(reservation_id).await
    }

    pub async fn add_product_stock(
        &self,
        product_id: Uuid,
        amount: i32,
    ) -> Result<ProductStock, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: amount must be positive",
            ));
        }

        self.store.add_product_stock(product_id, amount).await
    }

    /// New products start tracked with zero on-hand stock.
    pub async fn process_product_created_event(
        &self,
        event: ProductCreatedEvent,
    ) -> Result<(), ServiceError> {
        self.store.create_product_stock(event.product_id, 0).await
    }

    pub async fn process_order_pending_event(
        &self,
        event: OrderPendingEvent,
    ) -> Result<(), ServiceError> {
        self.store
            .reserve_order_stock(
                event.order_id,
                OrderMetadata {
                    customer_id: event.customer_id,
                    items_price: event.items_price,
                    total_price: event.total_price,
                },
                event.item_quantities,
            )
            .await
    }

    /// A failed allocation downstream means the reservation is returned.
    pub async fn process_shipment_allocation_event(
        &self,
        event: ShipmentAllocationEvent,
    ) -> Result<(), ServiceError> {
        if event.status == AllocationStatus::Failed {
            return self.store.return_reserved_order_stock(event.order_id).await;
        }

        Ok(())
    }

    pub async fn process_payment_processed_event(
        &self,
        event: PaymentProcessedEvent,
    ) -> Result<(), ServiceError> {
        match event.status {
            PaymentStatus::Failed => self.store.return_reserved_order_stock(event.order_id).await,
            PaymentStatus::Success => self.store.consume_reserved_order_stock(event.order_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use shared::EVENT_REVISION;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateStock(Uuid, i32),
        AddStock(Uuid, i32),
        Reserve(Uuid),
        Return(Uuid),
        Consume(Uuid),
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
    impl WarehouseStore for MockStore {
        async fn get_product_stock(
            &self,
            _product_id: Uuid,
        ) -> Result<ProductStock, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "stock not found"))
        }

        async fn get_reservation(
            &self,
            _reservation_id: Uuid,
        ) -> Result<Reservation, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "reservation not found"))
        }

        async fn create_product_stock(
            &self,
            product_id: Uuid,
            starting_quantity: i32,
        ) -> Result<(), ServiceError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::CreateStock(product_id, starting_quantity));
            Ok(())
        }

        async fn add_product_stock(
            &self,
            product_id: Uuid,
            amount: i32,
        ) -> Result<ProductStock, ServiceError> {
            self.calls.lock().unwrap().push(Call::AddStock(product_id, amount));
            Ok(ProductStock {
                product_id,
                quantity: amount,
            })
        }

        async fn reserve_order_stock(
            &self,
            order_id: Uuid,
            _order_metadata: OrderMetadata,
            _product_quantities: HashMap<Uuid, i32>,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Reserve(order_id));
            Ok(())
        }

        async fn return_reserved_order_stock(&self, order_id: Uuid) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Return(order_id));
            Ok(())
        }

        async fn consume_reserved_order_stock(&self, order_id: Uuid) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Consume(order_id));
            Ok(())
        }
    }

    fn service() -> (WarehouseService, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (WarehouseService::new(store.clone()), store)
    }

    fn money(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn add_stock_requires_positive_amount() {
        let (svc, store) = service();

        let err = svc.add_product_stock(Uuid::new_v4(), 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn product_created_starts_stock_at_zero() {
        let (svc, store) = service();
        let product_id = Uuid::new_v4();

        svc.process_product_created_event(ProductCreatedEvent {
            revision: EVENT_REVISION,
            product_id,
            name: "widget".into(),
            price: money("10.00"),
        })
        .await
        .unwrap();

        assert_eq!(store.calls(), vec![Call::CreateStock(product_id, 0)]);
    }

    #[tokio::test]
    async fn pending_order_reserves_stock() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        svc.process_order_pending_event(OrderPendingEvent {
            revision: EVENT_REVISION,
            order_id,
            customer_id: Uuid::new_v4(),
            item_quantities: HashMap::from([(Uuid::new_v4(), 2)]),
            items_price: money("20.00"),
            total_price: money("20.00"),
        })
        .await
        .unwrap();

        assert_eq!(store.calls(), vec![Call::Reserve(order_id)]);
    }

    #[tokio::test]
    async fn allocation_failure_returns_stock_but_success_does_not() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        let event = |status| ShipmentAllocationEvent {
            revision: EVENT_REVISION,
            status,
            order_id,
            order_metadata: None,
            shipment_id: None,
            shipment_stock: HashMap::new(),
        };

        svc.process_shipment_allocation_event(event(AllocationStatus::Allocated))
            .await
            .unwrap();
        assert!(store.calls().is_empty());

        svc.process_shipment_allocation_event(event(AllocationStatus::Failed))
            .await
            .unwrap();
        assert_eq!(store.calls(), vec![Call::Return(order_id)]);
    }

    #[tokio::test]
    async fn payment_outcome_settles_the_reservation() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        let event = |status| PaymentProcessedEvent {
            revision: EVENT_REVISION,
            status,
            order_id,
            customer_id: Uuid::new_v4(),
            amount: money("20.00"),
            transaction_id: None,
        };

        svc.process_payment_processed_event(event(PaymentStatus::Success))
            .await
            .unwrap();
        svc.process_payment_processed_event(event(PaymentStatus::Failed))
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::Consume(order_id), Call::Return(order_id)]
        );
    }
}
