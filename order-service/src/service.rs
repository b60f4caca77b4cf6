use std::collections::HashMap;
use std::sync::Arc;

use shared::gwauth::JwtClaims;
use shared::{
    AllocationStatus, ErrorCode, PaymentProcessedEvent, PaymentStatus, PriceQuoteStatus,
    ProductPriceQuoteEvent, ReservationStatus, ServiceError, ShipmentAllocationEvent,
    StockReservationEvent,
};
use uuid::Uuid;

use crate::models::Order;
use crate::store::OrderStore;

pub const SERVICE_NAME: &str = "order";

pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Creates an order in `PROCESSING`, which initiates the fulfilment
    /// saga across the other services.
    pub async fn place_order(
        &self,
        claims: Option<&JwtClaims>,
        customer_id: Uuid,
        cart: HashMap<Uuid, i32>,
    ) -> Result<Order, ServiceError> {
        // Gateway callers may only place orders for themselves.
        let customer_id = match claims {
            Some(claims) => claims.sub.parse::<Uuid>().map_err(|err| {
                ServiceError::wrap(ErrorCode::Unauthorised, "invalid jwt subject", err)
            })?,
            None => customer_id,
        };

        if cart.is_empty() {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: cart must not be empty",
            ));
        }
        if cart.values().any(|quantity| *quantity <= 0) {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: item quantities must be positive",
            ));
        }

        self.store.create_order(customer_id, cart).await
    }

    pub async fn view_order(&self, order_id: Uuid) -> Result<Order, ServiceError> {
        self.store.get_order(order_id).await
    }

    pub async fn view_orders(&self, customer_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        self.store.get_customer_orders(customer_id).await
    }

    pub async fn process_price_quote_event(
        &self,
        event: ProductPriceQuoteEvent,
    ) -> Result<(), ServiceError> {
        match event.status {
            PriceQuoteStatus::Available => {
                let total_price = event.total_price.ok_or_else(|| {
                    ServiceError::new(ErrorCode::Service, "available quote without total price")
                })?;
                self.store
                    .process_order(event.order_id, total_price.clone(), total_price)
                    .await
            }
            PriceQuoteStatus::Unavailable => self.store.reject_order(event.order_id).await,
        }
    }

    pub async fn process_stock_reservation_event(
        &self,
        event: StockReservationEvent,
    ) -> Result<(), ServiceError> {
        if event.status == ReservationStatus::InsufficientStock {
            return self.store.reject_order(event.order_id).await;
        }

        Ok(())
    }

    pub async fn process_shipment_allocation_event(
        &self,
        event: ShipmentAllocationEvent,
    ) -> Result<(), ServiceError> {
        match event.status {
            AllocationStatus::Failed => self.store.reject_order(event.order_id).await,
            AllocationStatus::Allocated => {
                let shipment_id = event.shipment_id.ok_or_else(|| {
                    ServiceError::new(ErrorCode::Service, "allocation event without shipment id")
                })?;
                self.store
                    .set_order_shipment_id(event.order_id, shipment_id)
                    .await
            }
            AllocationStatus::Released => Ok(()),
        }
    }

    pub async fn process_payment_processed_event(
        &self,
        event: PaymentProcessedEvent,
    ) -> Result<(), ServiceError> {
        match event.status {
            PaymentStatus::Success => {
                let transaction_id = event.transaction_id.ok_or_else(|| {
                    ServiceError::new(ErrorCode::Service, "payment success without transaction id")
                })?;
                self.store.approve_order(event.order_id, transaction_id).await
            }
            PaymentStatus::Failed => self.store.reject_order(event.order_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use shared::EVENT_REVISION;

    use super::*;
    use crate::models::OrderStatus;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(Uuid),
        Process(Uuid, BigDecimal),
        Approve(Uuid, Uuid),
        Reject(Uuid),
        SetShipment(Uuid, Uuid),
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
    impl OrderStore for MockStore {
        async fn get_order(&self, _order_id: Uuid) -> Result<Order, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "order not found"))
        }

        async fn get_customer_orders(
            &self,
            _customer_id: Uuid,
        ) -> Result<Vec<Order>, ServiceError> {
            Ok(vec![])
        }

        async fn create_order(
            &self,
            customer_id: Uuid,
            items: HashMap<Uuid, i32>,
        ) -> Result<Order, ServiceError> {
            self.calls.lock().unwrap().push(Call::Create(customer_id));
            Ok(Order {
                id: Uuid::new_v4(),
                status: OrderStatus::Processing,
                customer_id,
                items,
                items_price: None,
                total_price: None,
                shipping_id: None,
                transaction_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }

        async fn process_order(
            &self,
            order_id: Uuid,
            _items_price: BigDecimal,
            total_price: BigDecimal,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Process(order_id, total_price));
            Ok(())
        }

        async fn approve_order(
            &self,
            order_id: Uuid,
            transaction_id: Uuid,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Approve(order_id, transaction_id));
            Ok(())
        }

        async fn reject_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::Reject(order_id));
            Ok(())
        }

        async fn set_order_shipment_id(
            &self,
            order_id: Uuid,
            shipping_id: Uuid,
        ) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(Call::SetShipment(order_id, shipping_id));
            Ok(())
        }
    }

    fn service() -> (OrderService, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (OrderService::new(store.clone()), store)
    }

    fn money(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn place_order_rejects_empty_cart() {
        let (svc, store) = service();

        let err = svc
            .place_order(None, Uuid::new_v4(), HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn place_order_rejects_non_positive_quantity() {
        let (svc, store) = service();
        let cart = HashMap::from([(Uuid::new_v4(), 0)]);

        let err = svc.place_order(None, Uuid::new_v4(), cart).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn gateway_caller_id_overrides_request_customer() {
        let (svc, store) = service();
        let caller = Uuid::new_v4();
        let claims = JwtClaims {
            sub: caller.to_string(),
            iat: 0,
            exp: i64::MAX,
        };
        let cart = HashMap::from([(Uuid::new_v4(), 1)]);

        let order = svc
            .place_order(Some(&claims), Uuid::new_v4(), cart)
            .await
            .unwrap();
        assert_eq!(order.customer_id, caller);
        assert_eq!(store.calls(), vec![Call::Create(caller)]);
    }

    #[tokio::test]
    async fn available_quote_moves_order_to_pending() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        svc.process_price_quote_event(ProductPriceQuoteEvent {
            revision: EVENT_REVISION,
            status: PriceQuoteStatus::Available,
            order_id,
            item_quantities: HashMap::new(),
            item_prices: HashMap::new(),
            total_price: Some(money("20.00")),
        })
        .await
        .unwrap();

        assert_eq!(store.calls(), vec![Call::Process(order_id, money("20.00"))]);
    }

    #[tokio::test]
    async fn unavailable_quote_rejects_order() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        svc.process_price_quote_event(ProductPriceQuoteEvent {
            revision: EVENT_REVISION,
            status: PriceQuoteStatus::Unavailable,
            order_id,
            item_quantities: HashMap::new(),
            item_prices: HashMap::new(),
            total_price: None,
        })
        .await
        .unwrap();

        assert_eq!(store.calls(), vec![Call::Reject(order_id)]);
    }

    #[tokio::test]
    async fn insufficient_stock_rejects_but_reserved_is_ignored() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();

        let event = |status| StockReservationEvent {
            revision: EVENT_REVISION,
            status,
            order_id,
            order_metadata: None,
            reservation_id: None,
            reservation_stock: HashMap::new(),
            insufficient_stock: vec![],
        };

        svc.process_stock_reservation_event(event(ReservationStatus::Reserved))
            .await
            .unwrap();
        assert!(store.calls().is_empty());

        svc.process_stock_reservation_event(event(ReservationStatus::InsufficientStock))
            .await
            .unwrap();
        assert_eq!(store.calls(), vec![Call::Reject(order_id)]);
    }

    #[tokio::test]
    async fn allocation_attaches_shipment_and_failure_rejects() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();
        let shipment_id = Uuid::new_v4();

        svc.process_shipment_allocation_event(ShipmentAllocationEvent {
            revision: EVENT_REVISION,
            status: AllocationStatus::Allocated,
            order_id,
            order_metadata: None,
            shipment_id: Some(shipment_id),
            shipment_stock: HashMap::new(),
        })
        .await
        .unwrap();

        svc.process_shipment_allocation_event(ShipmentAllocationEvent {
            revision: EVENT_REVISION,
            status: AllocationStatus::Failed,
            order_id,
            order_metadata: None,
            shipment_id: None,
            shipment_stock: HashMap::new(),
        })
        .await
        .unwrap();

        assert_eq!(
            store.calls(),
            vec![
                Call::SetShipment(order_id, shipment_id),
                Call::Reject(order_id),
            ]
        );
    }

    #[tokio::test]
    async fn payment_outcome_settles_the_order() {
        let (svc, store) = service();
        let order_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        let transaction_id = Uuid::new_v4();

        svc.process_payment_processed_event(PaymentProcessedEvent {
            revision: EVENT_REVISION,
            status: PaymentStatus::Success,
            order_id,
            customer_id,
            amount: money("20.00"),
            transaction_id: Some(transaction_id),
        })
        .await
        .unwrap();

        svc.process_payment_processed_event(PaymentProcessedEvent {
            revision: EVENT_REVISION,
            status: PaymentStatus::Failed,
            order_id,
            customer_id,
            amount: money("20.00"),
            transaction_id: None,
        })
        .await
        .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::Approve(order_id, transaction_id), Call::Reject(order_id)]
        );
    }

    #[tokio::test]
    async fn payment_success_without_transaction_id_is_an_error() {
        let (svc, store) = service();

        let err = svc
            .process_payment_processed_event(PaymentProcessedEvent {
                revision: EVENT_REVISION,
                status: PaymentStatus::Success,
                order_id: Uuid::new_v4(),
                customer_id: Uuid::new_v4(),
                amount: money("20.00"),
                transaction_id: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Service);
        assert!(store.calls().is_empty());
    }
}
