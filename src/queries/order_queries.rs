use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::{
    entities::order::{self, Entity as Order, StatusBucket},
    errors::ServiceError,
    services::orders::OrderResponse,
};

/// Trait representing a generic asynchronous query.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query using the provided database connection
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

/// Admin dashboard view: recent orders grouped into status buckets.
///
/// This is the polling-fallback read: cheap enough to run on the
/// configured reconciliation interval, and authoritative over anything the
/// dashboard received via broadcast.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersByBucketQuery {
    /// How many recent orders to consider (newest first).
    pub limit: u64,
}

impl Default for OrdersByBucketQuery {
    fn default() -> Self {
        Self { limit: 200 }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct OrderBuckets {
    pub incoming: Vec<OrderResponse>,
    pub in_progress: Vec<OrderResponse>,
    pub delivering: Vec<OrderResponse>,
    pub done: Vec<OrderResponse>,
}

#[async_trait]
impl Query for OrdersByBucketQuery {
    type Result = OrderBuckets;

    #[instrument(skip(self, db), fields(limit = self.limit))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        debug!("Executing OrdersByBucketQuery");

        let rows = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .limit(self.limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut buckets = OrderBuckets::default();
        for row in rows {
            let bucket = row.status.bucket();
            let response = crate::services::orders::response_from_model(row)?;
            match bucket {
                StatusBucket::Incoming => buckets.incoming.push(response),
                StatusBucket::InProgress => buckets.in_progress.push(response),
                StatusBucket::Delivering => buckets.delivering.push(response),
                StatusBucket::Done => buckets.done.push(response),
            }
        }

        Ok(buckets)
    }
}

/// Orders currently awaiting staff action, oldest first (kitchen order).
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingOrdersQuery;

#[async_trait]
impl Query for PendingOrdersQuery {
    type Result = Vec<OrderResponse>;

    #[instrument(skip(self, db))]
    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        debug!("Executing PendingOrdersQuery");

        let rows = Order::find()
            .filter(order::Column::Status.eq(crate::entities::OrderStatus::Pending))
            .order_by_asc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        rows.into_iter()
            .map(crate::services::orders::response_from_model)
            .collect()
    }
}
