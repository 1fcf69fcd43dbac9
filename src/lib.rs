//! Khrua API Library
//!
//! Backend for a small restaurant ordering platform: a storefront running in
//! a chat app's in-app browser, an admin point-of-sale dashboard, and a
//! REST + WebSocket service over a relational store. The core is the order
//! lifecycle: cart state, order submission, a linear status state machine,
//! and room-scoped broadcast of status changes.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod services;
pub mod storefront;

use axum::{
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub broadcaster: Arc<events::Broadcaster>,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<axum::Json<ApiResponse<T>>, errors::ServiceError>;

/// All v1 API routes. Admin-only routes are gated inside their handlers via
/// the [`auth::AdminUser`] extractor.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/buckets", get(handlers::orders::order_buckets))
        .route(
            "/orders/user/:line_user_id",
            get(handlers::orders::list_user_orders),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route(
            "/orders/:id/payment/confirm",
            post(handlers::orders::confirm_payment),
        )
        .route("/orders/:id/slip", post(handlers::orders::upload_slip))
        .route(
            "/orders/:id/history",
            get(handlers::orders::get_order_history),
        )
        .route(
            "/store/status",
            get(handlers::store::get_store_status).post(handlers::store::set_store_status),
        )
        .route("/store/special-menu", post(handlers::store::set_special_menu))
        .route("/store/hours", post(handlers::store::set_opening_hours))
        .route("/health", get(handlers::health::health_check))
        .route("/ws", get(handlers::ws::ws_handler))
}
