use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::OrderStatus;
use crate::services::orders::OrderResponse;
use crate::services::store_status::StoreStatusResponse;

pub mod broadcaster;

pub use broadcaster::{Broadcaster, Room, RoomEvent};

// The various events that can occur in the system. Services emit these on a
// queue; the processor fans them out to broadcast rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(OrderResponse),
    OrderUpdated(OrderResponse),
    OrderStatusChanged {
        order: OrderResponse,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    StoreStatusChanged(StoreStatusResponse),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing. Event emission must never
    /// fail the surrounding request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Failed to enqueue event");
        }
    }
}

/// Background task draining the event queue and routing each event to its
/// broadcast rooms. Delivery is best-effort: a room with no subscribers
/// drops the emission, and disconnected clients reconcile by re-fetching.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, broadcaster: Arc<Broadcaster>) {
    info!("Event processor started");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated(order) => {
                broadcaster.emit(&Room::Admin, RoomEvent::NewOrder(order));
            }
            Event::OrderUpdated(order) => {
                broadcaster.emit(&Room::Admin, RoomEvent::OrderUpdated(order));
            }
            Event::OrderStatusChanged {
                order,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = %order.id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Broadcasting order status change"
                );
                broadcaster.emit(
                    &Room::Order(order.id.clone()),
                    RoomEvent::OrderStatusUpdated {
                        order_id: order.id.clone(),
                        status: new_status,
                        changed_at: order.updated_at,
                    },
                );
                broadcaster.emit(&Room::Admin, RoomEvent::OrderUpdated(order));
            }
            Event::StoreStatusChanged(status) => {
                broadcaster.emit(&Room::StoreStatus, RoomEvent::StoreStatusChanged(status));
            }
        }
    }

    info!("Event processor stopped");
}
