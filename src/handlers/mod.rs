//! HTTP handlers and route composition.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    events::EventSender,
    services::{OrderService, StoreStatusService},
};

pub mod health;
pub mod orders;
pub mod store;
pub mod ws;

/// Aggregated services handed to HTTP handlers through the app state.
#[derive(Clone)]
pub struct AppServices {
    pub order: Arc<OrderService>,
    pub store_status: Arc<StoreStatusService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            order: Arc::new(OrderService::new(db.clone(), event_sender.clone())),
            store_status: Arc::new(StoreStatusService::new(db, event_sender)),
        }
    }
}
