use std::sync::Arc;

use shared::{
    ErrorCode, PaymentProcessedEvent, PaymentStatus, ReservationStatus, ServiceError,
    StockReservationEvent,
};
use uuid::Uuid;

use crate::models::{Shipment, ShipmentItem};
use crate::store::ShippingStore;

pub const SERVICE_NAME: &str = "shipping";

pub struct ShippingService {
    store: Arc<dyn ShippingStore>,
}

impl ShippingService {
    pub fn new(store: Arc<dyn ShippingStore>) -> Self {
        Self { store }
    }

    pub async fn view_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError> {
        self.store.get_shipment(shipment_id).await
    }

    pub async fn view_shipment_manifest(
        &self,
        shipment_id: Uuid,
    ) -> Result<Vec<ShipmentItem>, ServiceError> {
        self.store.get_shipment_items(shipment_id).await
    }

    pub async fn dispatch_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError> {
        self.store.dispatch_shipment(shipment_id).await
    }

    /// A successful reservation allocates the shipment for the order.
    pub async fn process_stock_reservation_event(
        &self,
        event: StockReservationEvent,
    ) -> Result<(), ServiceError> {
        if event.status != ReservationStatus::Reserved {
            return Ok(());
        }

        let order_metadata = event.order_metadata.ok_or_else(|| {
            ServiceError::new(ErrorCode::Service, "reserved event without order metadata")
        })?;

        self.store
            .allocate_order_shipment(event.order_id, order_metadata, event.reservation_stock)
            .await
    }

    pub async fn process_payment_processed_event(
        &self,
        event: PaymentProcessedEvent,
    ) -> Result<(), ServiceError> {
        if event.status == PaymentStatus::Failed {
            return self.store.cancel_order_shipment(event.order_id).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use shared::{OrderMetadata, EVENT_REVISION};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Allocate(Uuid),
        Cancel(Uuid),
        Dispatch(Uuid),
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
    impl ShippingStore for MockStore {
        async fn get_shipment(&self, _shipment_id: Uuid) -> Result<Shipment, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "shipment not found"))
        }

        async fn get_shipment_items(
            &self,
            _shipment_id: Uuid,
        ) -> Result<Vec<ShipmentItem>, ServiceError> {
            Ok(vec![])
        }

        async fn allocate_order_shipment(
            &self,
            order_id: Uuid,
            _order_metadata: OrderMetadata,
            _product_quantities: HashMap<Uuid, i32>,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Allocate(order_id));
            Ok(())
        }

        async fn cancel_order_shipment(&self, order_id: Uuid) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Cancel(order_id));
            Ok(())
        }

        async fn dispatch_shipment(&self, shipment_id: Uuid) -> Result<Shipment, ServiceError> {
            self.calls.lock().unwrap().push(Call::Dispatch(shipment_id));
            Ok(Shipment {
                id: shipment_id,
                order_id: Uuid::new_v4(),
                dispatched: true,
                created_at: Utc::now(),
            })
        }
    }

    fn service() -> (ShippingService, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (ShippingService::new(store.clone()), store)
    }

    fn metadata() -> OrderMetadata {
        OrderMetadata {
            customer_id: Uuid::new_v4(),
            items_price: BigDecimal::from_str("20.00").unwrap(),
            total_price: BigDecimal::from_str("20.00").unwrap(),
        }
    }

    #[tokio::test]
    async fn reserved_stock_allocates_a_shipment() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        svc.process_stock_reservation_event(StockReservationEvent {
            revision: EVENT_REVISION,
            status: ReservationStatus::Reserved,
            order_id,
            order_metadata: Some(metadata()),
            reservation_id: Some(Uuid::new_v4()),
            reservation_stock: HashMap::from([(Uuid::new_v4(), 2)]),
            insufficient_stock: vec![],
        })
        .await
        .unwrap();

        assert_eq!(store.calls(), vec![Call::Allocate(order_id)]);
    }

    #[tokio::test]
    async fn non_reserved_outcomes_are_ignored() {
        let (svc, store) = service();

        for status in [
            ReservationStatus::InsufficientStock,
            ReservationStatus::Returned,
            ReservationStatus::Consumed,
        ] {
            svc.process_stock_reservation_event(StockReservationEvent {
                revision: EVENT_REVISION,
                status,
                order_id: Uuid::new_v4(),
                order_metadata: None,
                reservation_id: None,
                reservation_stock: HashMap::new(),
                insufficient_stock: vec![],
            })
            .await
            .unwrap();
        }

        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn reserved_event_without_metadata_is_an_error() {
        let (svc, store) = service();

        let err = svc
            .process_stock_reservation_event(StockReservationEvent {
                revision: EVENT_REVISION,
                status: ReservationStatus::Reserved,
                order_id: Uuid::new_v4(),
                order_metadata: None,
                reservation_id: None,
                reservation_stock: HashMap::new(),
                insufficient_stock: vec![],
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Service);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_payment_cancels_the_allocation() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        let event = |status| PaymentProcessedEvent {
            revision: EVENT_REVISION,
            status,
            order_id,
            customer_id: Uuid::new_v4(),
            amount: BigDecimal::from_str("20.00").unwrap(),
            transaction_id: None,
        };

        svc.process_payment_processed_event(event(PaymentStatus::Success))
            .await
            .unwrap();
        assert!(store.calls().is_empty());

        svc.process_payment_processed_event(event(PaymentStatus::Failed))
            .await
            .unwrap();
        assert_eq!(store.calls(), vec![Call::Cancel(order_id)]);
    }
}
