use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Time-based, human-scannable identifier (`ORD-YYYYMMDD-HHMMSS-XXXX`).
    /// Doubles as the broadcast room key for order tracking.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Snapshotted line items, serialized as JSON. One entry per unit.
    #[sea_orm(column_type = "Json")]
    pub line_items: Json,

    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,

    pub customer_name: String,
    pub customer_phone: String,

    pub delivery_mode: DeliveryMode,
    #[sea_orm(nullable)]
    pub delivery_address: Option<String>,
    #[sea_orm(nullable)]
    pub landmark: Option<String>,
    /// Client-computed distance from the store, if geolocation succeeded.
    #[sea_orm(column_type = "Decimal(Some((10, 3)))", nullable)]
    pub distance_km: Option<Decimal>,

    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[sea_orm(nullable)]
    pub slip_image: Option<String>,

    /// External chat-platform user id, for the customer's "my orders" list.
    #[sea_orm(nullable)]
    pub line_user_id: Option<String>,

    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_status_history::Entity")]
    StatusHistory,
}

impl Related<super::order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        Ok(self)
    }
}

/// One unit of a product inside an order, snapshotted at add-to-cart time.
///
/// The name and price are owned copies, never a live product reference, so
/// later menu edits cannot alter historical orders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Selected option map (e.g. noodle type). BTreeMap keeps serialization
    /// deterministic, which the grouped cart view relies on.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Order status lifecycle.
///
/// The linear forward order is pending → confirmed → cooking → ready →
/// delivered → completed; `cancelled` is reachable from any non-terminal
/// state as an out-of-band transition. The service accepts any recognized
/// value on update; the admin UI is what offers only [`OrderStatus::next`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cooking")]
    Cooking,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Canonical successor in the linear lifecycle, or `None` for terminal
    /// states. UI layers use this to offer the single forward action.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Cooking),
            Self::Cooking => Some(Self::Ready),
            Self::Ready => Some(Self::Delivered),
            Self::Delivered => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Dashboard bucket this status falls into.
    pub fn bucket(self) -> StatusBucket {
        match self {
            Self::Pending => StatusBucket::Incoming,
            Self::Confirmed | Self::Cooking | Self::Ready => StatusBucket::InProgress,
            Self::Delivered => StatusBucket::Delivering,
            Self::Completed | Self::Cancelled => StatusBucket::Done,
        }
    }
}

/// Grouping used by the admin dashboard order board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Incoming,
    InProgress,
    Delivering,
    Done,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryMode {
    #[sea_orm(string_value = "pickup")]
    Pickup,
    /// Store-operated delivery inside the free radius.
    #[sea_orm(string_value = "free_delivery")]
    FreeDelivery,
    /// Third-party rider, paid by the customer.
    #[sea_orm(string_value = "easy_delivery")]
    EasyDelivery,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "promptpay")]
    Promptpay,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Slip uploaded, awaiting staff confirmation.
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn next_walks_the_linear_lifecycle() {
        let mut status = OrderStatus::Pending;
        let mut seen = vec![status];
        while let Some(next) = status.next() {
            status = next;
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Cooking,
                OrderStatus::Ready,
                OrderStatus::Delivered,
                OrderStatus::Completed,
            ]
        );
    }

    #[test]
    fn terminal_states_have_no_successor() {
        assert_eq!(OrderStatus::Completed.next(), None);
        assert_eq!(OrderStatus::Cancelled.next(), None);
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Cooking,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let parsed = OrderStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn buckets_cover_every_status() {
        assert_eq!(OrderStatus::Pending.bucket(), StatusBucket::Incoming);
        assert_eq!(OrderStatus::Cooking.bucket(), StatusBucket::InProgress);
        assert_eq!(OrderStatus::Delivered.bucket(), StatusBucket::Delivering);
        assert_eq!(OrderStatus::Cancelled.bucket(), StatusBucket::Done);
    }
}
