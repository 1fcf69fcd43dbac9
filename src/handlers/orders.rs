use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    queries::{OrderBuckets, OrdersByBucketQuery, Query as OrderQuery},
    services::orders::{
        parse_status, CreateOrderRequest, OrderListResponse, OrderResponse, StatusHistoryEntry,
    },
    ApiResponse, AppState, ListQuery,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

/// Create a new order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Submit a storefront order. The order starts as pending and its first status-history row is written atomically.",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.order.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// Get a single order by id
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state
        .services
        .order
        .get_order(&order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

    Ok(Json(ApiResponse::success(order)))
}

/// List orders with pagination and optional status filter (staff view)
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
    ),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<OrderListResponse>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<OrderListResponse>>, ServiceError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let result = state
        .services
        .order
        .list_orders(status, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// List a customer's own orders by external platform user id
pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(line_user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ServiceError> {
    let orders = state
        .services
        .order
        .list_orders_for_user(&line_user_id)
        .await?;

    Ok(Json(ApiResponse::success(orders)))
}

/// Admin dashboard: recent orders grouped into status buckets
pub async fn order_buckets(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<OrderBuckets>>, ServiceError> {
    let buckets = OrdersByBucketQuery::default().execute(&state.db).await?;
    Ok(Json(ApiResponse::success(buckets)))
}

/// Update an order's status
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    summary = "Update order status",
    description = "Sets the order to any recognized status value and appends a history row. Unknown values are rejected; adjacency in the lifecycle is not enforced.",
    params(("id" = String, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Unknown status value", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    _admin: AdminUser,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let status = parse_status(&request.status)?;
    let order = state
        .services
        .order
        .update_status(&order_id, status)
        .await?;

    Ok(Json(ApiResponse::success(order)))
}

/// Staff confirmation of received payment
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let order = state.services.order.confirm_payment(&order_id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Upload a payment slip image for an order
///
/// Accepts a multipart form with a single `slip` image part. The image is
/// written under the configured upload directory and payment status moves
/// to `paid`.
pub async fn upload_slip(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    // Reject unknown orders before touching the filesystem.
    state
        .services
        .order
        .get_order(&order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

    let mut stored_path: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ServiceError::ValidationError(format!("Malformed multipart upload: {}", e))
    })? {
        if field.name() != Some("slip") {
            continue;
        }

        let extension = match field.content_type() {
            Some("image/jpeg") => "jpg",
            Some("image/png") => "png",
            Some("image/webp") => "webp",
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Unsupported slip content type: {}",
                    other
                )))
            }
            None => {
                return Err(ServiceError::ValidationError(
                    "Slip upload is missing a content type".to_string(),
                ))
            }
        };

        let bytes = field.bytes().await.map_err(|e| {
            ServiceError::ValidationError(format!("Failed to read slip upload: {}", e))
        })?;
        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "Slip upload is empty".to_string(),
            ));
        }

        let upload_dir = std::path::Path::new(&state.config.upload_dir);
        tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
            ServiceError::InternalError(format!("Failed to create upload directory: {}", e))
        })?;

        let file_name = format!("{}-{}.{}", order_id, Uuid::new_v4(), extension);
        let file_path = upload_dir.join(&file_name);
        tokio::fs::write(&file_path, &bytes).await.map_err(|e| {
            ServiceError::InternalError(format!("Failed to store slip image: {}", e))
        })?;

        stored_path = Some(file_path.to_string_lossy().into_owned());
        break;
    }

    let Some(path) = stored_path else {
        warn!(order_id = %order_id, "Slip upload without a 'slip' part");
        return Err(ServiceError::ValidationError(
            "Multipart upload must contain a 'slip' image part".to_string(),
        ));
    };

    let order = state.services.order.attach_slip(&order_id, path).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Ordered status timeline of one order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/history",
    summary = "Order status history",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<Vec<StatusHistoryEntry>>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order_history(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<StatusHistoryEntry>>>, ServiceError> {
    let history = state.services.order.get_history(&order_id).await?;
    Ok(Json(ApiResponse::success(history)))
}
