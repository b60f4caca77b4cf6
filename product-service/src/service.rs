use std::sync::Arc;

use bigdecimal::BigDecimal;
use shared::{ErrorCode, OrderCreatedEvent, ServiceError};
use uuid::Uuid;

use crate::models::Product;
use crate::store::ProductStore;

pub const SERVICE_NAME: &str = "product";

pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub async fn view_product(&self, product_id: Uuid) -> Result<Product, ServiceError> {
        self.store.get_product(product_id).await
    }

    pub async fn view_products(&self) -> Result<Vec<Product>, ServiceError> {
        self.store.get_products().await
    }

    pub async fn create_product(
        &self,
        name: String,
        description: String,
        price: BigDecimal,
    ) -> Result<Product, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: product name must not be empty",
            ));
        }
        if price < BigDecimal::from(0) {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: price must not be negative",
            ));
        }

        self.store.create_product(name, description, price).await
    }

    pub async fn update_product_price(
        &self,
        product_id: Uuid,
        price: BigDecimal,
    ) -> Result<Product, ServiceError> {
        if price < BigDecimal::from(0) {
            return Err(ServiceError::new(
                ErrorCode::InvalidArgument,
                "invalid request: price must not be negative",
            ));
        }

        self.store.update_product_price(product_id, price).await
    }

    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        self.store.delete_product(product_id).await
    }

    /// Quotes the freshly placed order's cart.
    pub async fn process_order_created_event(
        &self,
        event: OrderCreatedEvent,
    ) -> Result<(), ServiceError> {
        self.store
            .price_order_products(event.order_id, event.item_quantities)
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
    use shared::EVENT_REVISION;

    use super::*;

    #[derive(Default)]
    struct MockStore {
        quoted: Mutex<Vec<(Uuid, HashMap<Uuid, i32>)>>,
    }

    #[async_trait]
    impl ProductStore for MockStore {
        async fn get_product(&self, _product_id: Uuid) -> Result<Product, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "product not found"))
        }

        async fn get_products(&self) -> Result<Vec<Product>, ServiceError> {
            Ok(vec![])
        }

        async fn create_product(
            &self,
            name: String,
            description: String,
            price: BigDecimal,
        ) -> Result<Product, ServiceError> {
            Ok(Product {
                id: Uuid::new_v4(),
                name,
                description,
                price,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }

        async fn update_product_price(
            &self,
            _product_id: Uuid,
            _price: BigDecimal,
        ) -> Result<Product, ServiceError> {
            Err(ServiceError::new(ErrorCode::NotFound, "product not found"))
        }

        async fn delete_product(&self, _product_id: Uuid) -> Result<(), ServiceError> {
            Ok(())
        }

        async fn price_order_products(
            &self,
            order_id: Uuid,
            item_quantities: HashMap<Uuid, i32>,
        ) -> Result<(), ServiceError> {
            self.quoted.lock().unwrap().push((order_id, item_quantities));
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_product_validates_inputs() {
        let svc = ProductService::new(Arc::new(MockStore::default()));

        let err = svc
            .create_product("".into(), "desc".into(), BigDecimal::from(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = svc
            .create_product(
                "widget".into(),
                "desc".into(),
                BigDecimal::from_str("-0.01").unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let product = svc
            .create_product("widget".into(), "desc".into(), BigDecimal::from(0))
            .await
            .unwrap();
        assert_eq!(product.name, "widget");
    }

    #[tokio::test]
    async fn order_created_triggers_a_quote() {
        let store = Arc::new(MockStore::default());
        let svc = ProductService::new(store.clone());
        let order_id = Uuid::new_v4();
        let product_id = Uuid::new_v4();

        svc.process_order_created_event(OrderCreatedEvent {
            revision: EVENT_REVISION,
            order_id,
            customer_id: Uuid::new_v4(),
            item_quantities: HashMap::from([(product_id, 2)]),
        })
        .await
        .unwrap();

        let quoted = store.quoted.lock().unwrap();
        assert_eq!(quoted.len(), 1);
        assert_eq!(quoted[0].0, order_id);
        assert_eq!(quoted[0].1[&product_id], 2);
    }
}
