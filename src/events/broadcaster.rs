use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::entities::OrderStatus;
use crate::services::orders::OrderResponse;
use crate::services::store_status::StoreStatusResponse;

/// A named broadcast grouping that a real-time client joins to receive
/// scoped events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// One customer tracking one order; keyed by order id.
    Order(String),
    /// Every connected staff dashboard.
    Admin,
    /// Any client wanting open/closed push updates.
    StoreStatus,
}

impl Room {
    /// Parses a client-supplied room name: `admin`, `store_status`, or
    /// `order:<id>`. Unknown names yield `None` and are ignored by callers.
    pub fn parse(raw: &str) -> Option<Room> {
        match raw.trim() {
            "admin" => Some(Room::Admin),
            "store_status" => Some(Room::StoreStatus),
            other => other
                .strip_prefix("order:")
                .filter(|id| !id.is_empty())
                .map(|id| Room::Order(id.to_string())),
        }
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::Order(id) => write!(f, "order:{}", id),
            Room::Admin => write!(f, "admin"),
            Room::StoreStatus => write!(f, "store_status"),
        }
    }
}

/// Room-scoped wire frames, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Admin room: a new order arrived.
    NewOrder(OrderResponse),
    /// Admin room: any status/payment mutation on an order.
    OrderUpdated(OrderResponse),
    /// Per-order room: status change for the tracked order.
    OrderStatusUpdated {
        order_id: String,
        status: OrderStatus,
        changed_at: DateTime<Utc>,
    },
    /// Store-status room: open/closed flipped.
    StoreStatusChanged(StoreStatusResponse),
}

/// Publish/subscribe fan-out over per-room tokio broadcast channels.
///
/// Delivery is at-most-once per connected subscriber per emission: there is
/// no replay, and a subscriber that lags past the channel capacity loses the
/// overwritten events. Clients treat a fresh fetch as authoritative over
/// anything received here.
#[derive(Debug)]
pub struct Broadcaster {
    rooms: DashMap<Room, broadcast::Sender<RoomEvent>>,
    capacity: usize,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    /// Joins a room, creating its channel on first use. Idempotent:
    /// re-subscribing yields a fresh receiver on the same channel.
    pub fn subscribe(&self, room: Room) -> broadcast::Receiver<RoomEvent> {
        self.rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Emits an event to a room, returning the number of subscribers it
    /// reached. A room nobody joined simply drops the event.
    pub fn emit(&self, room: &Room, event: RoomEvent) -> usize {
        match self.rooms.get(room) {
            Some(tx) => {
                let reached = tx.send(event).unwrap_or(0);
                debug!(room = %room, reached, "room event emitted");
                reached
            }
            None => {
                debug!(room = %room, "room event dropped (no channel)");
                0
            }
        }
    }

    /// Number of currently connected subscribers in a room.
    pub fn subscriber_count(&self, room: &Room) -> usize {
        self.rooms
            .get(room)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_the_three_room_kinds() {
        assert_eq!(Room::parse("admin"), Some(Room::Admin));
        assert_eq!(Room::parse("store_status"), Some(Room::StoreStatus));
        assert_eq!(
            Room::parse("order:ORD-20240101-120000-ABCD"),
            Some(Room::Order("ORD-20240101-120000-ABCD".into()))
        );
        assert_eq!(Room::parse("order:"), None);
        assert_eq!(Room::parse("kitchen"), None);
    }

    #[tokio::test]
    async fn emit_without_subscribers_reaches_nobody() {
        let broadcaster = Broadcaster::new(8);
        let reached = broadcaster.emit(
            &Room::Admin,
            RoomEvent::OrderStatusUpdated {
                order_id: "ORD-X".into(),
                status: OrderStatus::Confirmed,
                changed_at: Utc::now(),
            },
        );
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn resubscribing_is_idempotent() {
        let broadcaster = Broadcaster::new(8);
        let room = Room::Order("ORD-1".into());

        let _first = broadcaster.subscribe(room.clone());
        let mut second = broadcaster.subscribe(room.clone());
        assert_eq!(broadcaster.subscriber_count(&room), 2);

        let reached = broadcaster.emit(
            &room,
            RoomEvent::OrderStatusUpdated {
                order_id: "ORD-1".into(),
                status: OrderStatus::Cooking,
                changed_at: Utc::now(),
            },
        );
        assert_eq!(reached, 2);

        match second.recv().await.unwrap() {
            RoomEvent::OrderStatusUpdated { order_id, status, .. } => {
                assert_eq!(order_id, "ORD-1");
                assert_eq!(status, OrderStatus::Cooking);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
