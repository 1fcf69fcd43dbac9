use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Singleton row holding the store's open/closed state and related settings.
/// Always id = 1; created lazily on first read.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "store_status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub is_open: bool,
    /// Message shown to customers while closed (e.g. "ปิดวันนี้").
    #[sea_orm(nullable)]
    pub message: Option<String>,
    #[sea_orm(nullable)]
    pub close_time: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub special_menu: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub opening_hours: Option<Json>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Primary key of the singleton row.
pub const SINGLETON_ID: i32 = 1;
