//! Business services over the database and event queue.

pub mod orders;
pub mod store_status;

pub use orders::OrderService;
pub use store_status::StoreStatusService;
