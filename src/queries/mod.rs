//! Read-side queries for dashboard views.

pub mod order_queries;

pub use order_queries::{OrderBuckets, OrdersByBucketQuery, PendingOrdersQuery, Query};
