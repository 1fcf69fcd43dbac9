use crate::{
    entities::order::{
        self, ActiveModel as OrderActiveModel, DeliveryMode, Entity as OrderEntity, LineItem,
        Model as OrderModel, OrderStatus, PaymentMethod, PaymentStatus,
    },
    entities::order_status_history::{
        self, ActiveModel as HistoryActiveModel, Entity as HistoryEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request/Response types for the order service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Customer phone is required"))]
    pub customer_phone: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub line_items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub delivery_mode: DeliveryMode,
    pub delivery_address: Option<String>,
    pub landmark: Option<String>,
    pub distance_km: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub line_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub line_items: Vec<LineItem>,
    pub total_amount: Decimal,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_mode: DeliveryMode,
    pub delivery_address: Option<String>,
    pub landmark: Option<String>,
    pub distance_km: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub slip_image: Option<String>,
    pub line_user_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// One entry of an order's status timeline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// Service for managing orders and their status lifecycle.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a new order with status `pending` and writes the first
    /// status-history row in the same transaction.
    ///
    /// The client-supplied total is verified against the line item sum; a
    /// mismatch is rejected before anything is persisted.
    #[instrument(skip(self, request), fields(customer_name = %request.customer_name))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        validate_order_rules(&request)?;

        let db = &*self.db;
        let now = Utc::now();
        let order_id = generate_order_id(now);

        let line_items = serde_json::to_value(&request.line_items).map_err(|e| {
            error!(error = %e, "Failed to serialize line items");
            ServiceError::InternalError(format!("Failed to serialize line items: {}", e))
        })?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order_active_model = OrderActiveModel {
            id: Set(order_id.clone()),
            line_items: Set(line_items),
            total_amount: Set(request.total_amount),
            customer_name: Set(request.customer_name.trim().to_string()),
            customer_phone: Set(request.customer_phone.trim().to_string()),
            delivery_mode: Set(request.delivery_mode),
            delivery_address: Set(request.delivery_address),
            landmark: Set(request.landmark),
            distance_km: Set(request.distance_km),
            payment_method: Set(request.payment_method),
            payment_status: Set(PaymentStatus::Pending),
            slip_image: Set(None),
            line_user_id: Set(request.line_user_id),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let order_model = order_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        // Initial history row: every order's timeline starts at pending.
        append_history(&txn, &order_id, OrderStatus::Pending, now).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, total = %order_model.total_amount, "Order created successfully");

        let response = response_from_model(order_model)?;
        self.event_sender
            .send_or_log(Event::OrderCreated(response.clone()))
            .await;

        Ok(response)
    }

    /// Retrieves an order by ID
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &str) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order from database");
                ServiceError::DatabaseError(e)
            })?;

        order.map(response_from_model).transpose()
    }

    /// Lists orders with optional status filter and pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db;

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, per_page.max(1));

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;

        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page, per_page, "Failed to fetch orders page");
                ServiceError::DatabaseError(e)
            })?;

        let orders = orders
            .into_iter()
            .map(response_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderListResponse {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Lists a customer's orders by external platform user id, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_for_user(
        &self,
        line_user_id: &str,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db;

        let orders = OrderEntity::find()
            .filter(order::Column::LineUserId.eq(line_user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, line_user_id, "Failed to fetch user orders");
                ServiceError::DatabaseError(e)
            })?;

        orders.into_iter().map(response_from_model).collect()
    }

    /// Updates an order's status and appends a history row in the same
    /// transaction, then broadcasts the change.
    ///
    /// Any recognized status value is accepted; the operation does not check
    /// that the target is the immediate successor, and a repeated value still
    /// appends to the history. The admin UI computes the canonical next step
    /// via [`OrderStatus::next`] and offers only that; direct calls keep the
    /// flexibility of skip-ahead and out-of-band cancellation.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for status update");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for status update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for status update");
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })?;

        let old_status = order.status;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.status = Set(new_status);
        order_active_model.updated_at = Set(now);

        let updated_order = order_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        append_history(&txn, order_id, new_status, now).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, old_status = %old_status, new_status = %new_status, "Order status updated");

        let response = response_from_model(updated_order)?;
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order: response.clone(),
                old_status,
                new_status,
            })
            .await;

        Ok(response)
    }

    /// Records an uploaded payment slip: stores the image reference and moves
    /// payment status to `paid`.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn attach_slip(
        &self,
        order_id: &str,
        slip_path: String,
    ) -> Result<OrderResponse, ServiceError> {
        self.update_payment(order_id, PaymentStatus::Paid, Some(slip_path))
            .await
    }

    /// Staff confirmation of a received payment.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn confirm_payment(&self, order_id: &str) -> Result<OrderResponse, ServiceError> {
        self.update_payment(order_id, PaymentStatus::Confirmed, None)
            .await
    }

    async fn update_payment(
        &self,
        order_id: &str,
        payment_status: PaymentStatus,
        slip_path: Option<String>,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db;
        let now = Utc::now();

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for payment update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for payment update");
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })?;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.payment_status = Set(payment_status);
        if let Some(path) = slip_path {
            order_active_model.slip_image = Set(Some(path));
        }
        order_active_model.updated_at = Set(now);

        let updated_order = order_active_model.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update payment status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, payment_status = %payment_status, "Payment status updated");

        let response = response_from_model(updated_order)?;
        self.event_sender
            .send_or_log(Event::OrderUpdated(response.clone()))
            .await;

        Ok(response)
    }

    /// Returns the order's status timeline in chronological order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_history(
        &self,
        order_id: &str,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        let db = &*self.db;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for history read");
                ServiceError::DatabaseError(e)
            })?;

        if order.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order_id
            )));
        }

        let rows = HistoryEntity::find()
            .filter(order_status_history::Column::OrderId.eq(order_id))
            .order_by_asc(order_status_history::Column::ChangedAt)
            .order_by_asc(order_status_history::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch status history");
                ServiceError::DatabaseError(e)
            })?;

        Ok(rows
            .into_iter()
            .map(|row| StatusHistoryEntry {
                status: row.status,
                changed_at: row.changed_at,
            })
            .collect())
    }
}

/// Parses a client-supplied status string against the recognized set.
pub fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw)
        .map_err(|_| ServiceError::InvalidStatus(format!("Unknown order status: {}", raw)))
}

/// Business rules that the derive-based validation cannot express.
fn validate_order_rules(request: &CreateOrderRequest) -> Result<(), ServiceError> {
    if request.customer_name.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Customer name is required".to_string(),
        ));
    }
    if request.customer_phone.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Customer phone is required".to_string(),
        ));
    }

    if request.delivery_mode != DeliveryMode::Pickup {
        let has_address = request
            .delivery_address
            .as_deref()
            .map(str::trim)
            .is_some_and(|addr| !addr.is_empty());
        if !has_address {
            return Err(ServiceError::ValidationError(
                "Delivery address is required for delivery orders".to_string(),
            ));
        }
    }

    let item_sum: Decimal = request.line_items.iter().map(|item| item.unit_price).sum();
    if item_sum != request.total_amount {
        return Err(ServiceError::ValidationError(format!(
            "Total amount {} does not match line item sum {}",
            request.total_amount, item_sum
        )));
    }

    Ok(())
}

async fn append_history<C: sea_orm::ConnectionTrait>(
    conn: &C,
    order_id: &str,
    status: OrderStatus,
    changed_at: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let history = HistoryActiveModel {
        order_id: Set(order_id.to_string()),
        status: Set(status),
        changed_at: Set(changed_at),
        ..Default::default()
    };

    history.insert(conn).await.map_err(|e| {
        error!(error = %e, order_id = %order_id, "Failed to append status history");
        ServiceError::DatabaseError(e)
    })?;

    Ok(())
}

/// Generates a time-based, human-scannable order id, e.g.
/// `ORD-20240315-183042-K4TZ`. The embedded timestamp plus a random suffix
/// makes collisions practically impossible at restaurant volume.
fn generate_order_id(now: DateTime<Utc>) -> String {
    // Unambiguous alphabet: no 0/O, 1/I/L pairs.
    const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", now.format("%Y%m%d-%H%M%S"), suffix)
}

pub(crate) fn response_from_model(model: OrderModel) -> Result<OrderResponse, ServiceError> {
    let line_items: Vec<LineItem> = serde_json::from_value(model.line_items).map_err(|e| {
        error!(error = %e, order_id = %model.id, "Corrupt line items payload");
        ServiceError::InternalError(format!("Corrupt line items for order {}", model.id))
    })?;

    Ok(OrderResponse {
        id: model.id,
        line_items,
        total_amount: model.total_amount,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        delivery_mode: model.delivery_mode,
        delivery_address: model.delivery_address,
        landmark: model.landmark,
        distance_km: model.distance_km,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        slip_image: model.slip_image,
        line_user_id: model.line_user_id,
        status: model.status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
