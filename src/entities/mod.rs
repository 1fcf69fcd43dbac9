//! Database entities (sea-orm models).

pub mod order;
pub mod order_status_history;
pub mod store_status;

pub use order::{
    DeliveryMode, LineItem, OrderStatus, PaymentMethod, PaymentStatus, StatusBucket,
};
