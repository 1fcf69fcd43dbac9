use crate::{
    entities::store_status::{
        self, ActiveModel as StoreStatusActiveModel, Entity as StoreStatusEntity,
        Model as StoreStatusModel, SINGLETON_ID,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreStatusResponse {
    pub is_open: bool,
    pub message: Option<String>,
    pub close_time: Option<String>,
    pub special_menu: Option<serde_json::Value>,
    pub opening_hours: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetStoreStatusRequest {
    pub is_open: bool,
    pub message: Option<String>,
    pub close_time: Option<String>,
}

/// Service for the store's singleton open/closed state and related settings.
#[derive(Clone)]
pub struct StoreStatusService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl StoreStatusService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Reads the store status, creating the default row (open, no message)
    /// on first access.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<StoreStatusResponse, ServiceError> {
        let model = self.get_or_init().await?;
        Ok(model_to_response(model))
    }

    /// Flips the store open/closed and broadcasts the change to the
    /// store-status room.
    #[instrument(skip(self), fields(is_open = request.is_open))]
    pub async fn set_status(
        &self,
        request: SetStoreStatusRequest,
    ) -> Result<StoreStatusResponse, ServiceError> {
        let current = self.get_or_init().await?;

        let mut active: StoreStatusActiveModel = current.into();
        active.is_open = Set(request.is_open);
        active.message = Set(request.message);
        active.close_time = Set(request.close_time);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await.map_err(|e| {
            error!(error = %e, "Failed to update store status");
            ServiceError::DatabaseError(e)
        })?;

        info!(is_open = updated.is_open, "Store status updated");

        let response = model_to_response(updated);
        self.event_sender
            .send_or_log(Event::StoreStatusChanged(response.clone()))
            .await;

        Ok(response)
    }

    /// Replaces today's special menu.
    #[instrument(skip(self, menu))]
    pub async fn set_special_menu(
        &self,
        menu: serde_json::Value,
    ) -> Result<StoreStatusResponse, ServiceError> {
        self.update_settings(|active| {
            active.special_menu = Set(Some(menu));
        })
        .await
    }

    /// Replaces the weekly opening hours.
    #[instrument(skip(self, hours))]
    pub async fn set_opening_hours(
        &self,
        hours: serde_json::Value,
    ) -> Result<StoreStatusResponse, ServiceError> {
        self.update_settings(|active| {
            active.opening_hours = Set(Some(hours));
        })
        .await
    }

    async fn update_settings<F>(&self, apply: F) -> Result<StoreStatusResponse, ServiceError>
    where
        F: FnOnce(&mut StoreStatusActiveModel),
    {
        let current = self.get_or_init().await?;

        let mut active: StoreStatusActiveModel = current.into();
        apply(&mut active);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await.map_err(|e| {
            error!(error = %e, "Failed to update store settings");
            ServiceError::DatabaseError(e)
        })?;

        Ok(model_to_response(updated))
    }

    async fn get_or_init(&self) -> Result<StoreStatusModel, ServiceError> {
        let db = &*self.db;

        let existing = StoreStatusEntity::find_by_id(SINGLETON_ID)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch store status");
                ServiceError::DatabaseError(e)
            })?;

        if let Some(model) = existing {
            return Ok(model);
        }

        let default_row = StoreStatusActiveModel {
            id: Set(SINGLETON_ID),
            is_open: Set(true),
            message: Set(None),
            close_time: Set(None),
            special_menu: Set(None),
            opening_hours: Set(None),
            updated_at: Set(Utc::now()),
        };

        default_row.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to initialize store status row");
            ServiceError::DatabaseError(e)
        })
    }
}

fn model_to_response(model: store_status::Model) -> StoreStatusResponse {
    StoreStatusResponse {
        is_open: model.is_open,
        message: model.message,
        close_time: model.close_time,
        special_menu: model.special_menu,
        opening_hours: model.opening_hours,
        updated_at: model.updated_at,
    }
}
