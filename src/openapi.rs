use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Khrua API",
        version = "0.1.0",
        description = r#"
# Khrua Restaurant Ordering API

Backend for a small restaurant ordering platform.

- **Orders**: storefront order submission, status lifecycle, payment slips
- **Store**: open/closed state, special menu, opening hours
- **Real-time**: room-scoped WebSocket events at `/api/v1/ws`
  (`rooms=admin,store_status,order:<id>`); push is best-effort, a fresh
  fetch is always authoritative

Admin endpoints require a bearer JWT:

```
Authorization: Bearer <token>
```
"#
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::get_order_history,
        crate::handlers::store::get_store_status,
    ),
    components(schemas(
        crate::entities::order::LineItem,
        crate::entities::order::OrderStatus,
        crate::entities::order::DeliveryMode,
        crate::entities::order::PaymentMethod,
        crate::entities::order::PaymentStatus,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderListResponse,
        crate::services::orders::StatusHistoryEntry,
        crate::services::store_status::StoreStatusResponse,
        crate::services::store_status::SetStoreStatusRequest,
        crate::errors::ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// Swagger UI router, merged into the app in `main`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
