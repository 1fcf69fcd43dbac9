use axum::{extract::State, Json};

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    services::store_status::{SetStoreStatusRequest, StoreStatusResponse},
    ApiResponse, AppState,
};

/// Current open/closed state, read by the storefront to gate ordering
#[utoipa::path(
    get,
    path = "/api/v1/store/status",
    summary = "Get store status",
    responses(
        (status = 200, description = "Store status", body = ApiResponse<StoreStatusResponse>),
    )
)]
pub async fn get_store_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StoreStatusResponse>>, ServiceError> {
    let status = state.services.store_status.get().await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Flip the store open/closed; the change is pushed to the store-status room
pub async fn set_store_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<SetStoreStatusRequest>,
) -> Result<Json<ApiResponse<StoreStatusResponse>>, ServiceError> {
    let status = state.services.store_status.set_status(request).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Replace today's special menu
pub async fn set_special_menu(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(menu): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<StoreStatusResponse>>, ServiceError> {
    let status = state.services.store_status.set_special_menu(menu).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// Replace the weekly opening hours
pub async fn set_opening_hours(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(hours): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<StoreStatusResponse>>, ServiceError> {
    let status = state.services.store_status.set_opening_hours(hours).await?;
    Ok(Json(ApiResponse::success(status)))
}
