//! Bus topic names.
//!
//! Topic naming is hierarchical; producers publish to the most specific
//! topic and the outbox relay routes each row to the topic stored in its
//! `aggregatetype` column.

// Order topics
pub const ORDER_STATE_CREATED: &str = "order.state.created";
pub const ORDER_STATE_PENDING: &str = "order.state.pending";
pub const ORDER_STATE_APPROVED: &str = "order.state.approved";
pub const ORDER_STATE_REJECTED: &str = "order.state.rejected";

// Product topics
pub const PRODUCT_STATE_CREATED: &str = "product.state.created";
pub const PRODUCT_STATE_DELETED: &str = "product.state.deleted";
pub const PRODUCT_ATTR_PRICE: &str = "product.attr.price";
pub const PRODUCT_PRICE_QUOTATION: &str = "product.pricequotation";

// Warehouse topics
pub const WAREHOUSE_STOCK_CREATED: &str = "warehouse.stock.created";
pub const WAREHOUSE_STOCK_ADDED: &str = "warehouse.stock.added";
pub const WAREHOUSE_STOCK_REMOVED: &str = "warehouse.stock.removed";
pub const WAREHOUSE_RESERVATION_FAILED: &str = "warehouse.reservation.failed";
pub const WAREHOUSE_RESERVATION_RESERVED: &str = "warehouse.reservation.reserved";
pub const WAREHOUSE_RESERVATION_RETURNED: &str = "warehouse.reservation.returned";
pub const WAREHOUSE_RESERVATION_CONSUMED: &str = "warehouse.reservation.consumed";

// Shipping topics
pub const SHIPPING_SHIPMENT_ALLOCATION: &str = "shipping.shipment.allocation";
pub const SHIPPING_SHIPMENT_DISPATCHED: &str = "shipping.shipment.dispatched";

// Payment topics
pub const PAYMENT_BALANCE_CREATED: &str = "payment.balance.created";
pub const PAYMENT_BALANCE_CREDITED: &str = "payment.balance.credited";
pub const PAYMENT_BALANCE_DEBITED: &str = "payment.balance.debited";
pub const PAYMENT_BALANCE_CLOSED: &str = "payment.balance.closed";
pub const PAYMENT_TRANSACTION_CREATED: &str = "payment.transaction.created";
pub const PAYMENT_TRANSACTION_REVERSED: &str = "payment.transaction.reversed";
pub const PAYMENT_PROCESSING: &str = "payment.processing";

// User topics
pub const USER_STATE_CREATED: &str = "user.state.created";
pub const USER_STATE_DELETED: &str = "user.state.deleted";
pub const USER_ATTR_EMAIL: &str = "user.attr.email";
