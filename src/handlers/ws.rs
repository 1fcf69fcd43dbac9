//! WebSocket endpoint for room-scoped real-time events.
//!
//! Clients name the rooms they want on connect (`?rooms=admin,order:ORD-...`)
//! and receive each room's events as JSON text frames. Joining is
//! fire-and-forget: unknown room names are ignored rather than rejected.
//! Delivery is best-effort with no replay: a client that lags or
//! disconnects is expected to reconcile with a polling re-fetch.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::{
    events::{Broadcaster, Room, RoomEvent},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Comma-separated room names: `admin`, `store_status`, `order:<id>`.
    #[serde(default)]
    pub rooms: String,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Response {
    let rooms: Vec<Room> = params
        .rooms
        .split(',')
        .filter(|raw| !raw.trim().is_empty())
        .filter_map(|raw| {
            let parsed = Room::parse(raw);
            if parsed.is_none() {
                warn!(room = raw, "Ignoring unknown room name");
            }
            parsed
        })
        .collect();

    let broadcaster = state.broadcaster.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, rooms, broadcaster))
}

async fn handle_socket(socket: WebSocket, rooms: Vec<Room>, broadcaster: Arc<Broadcaster>) {
    let (mut sink, mut stream) = socket.split();

    // Funnel every subscribed room into one per-connection queue so a single
    // writer owns the socket.
    let (tx, mut rx) = mpsc::channel::<RoomEvent>(64);
    let mut forwarders = Vec::with_capacity(rooms.len());

    for room in rooms {
        let mut subscription = broadcaster.subscribe(room.clone());
        let tx = tx.clone();
        forwarders.push(tokio::spawn(async move {
            loop {
                match subscription.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Missed events are not replayed; the client's
                        // polling re-fetch heals the gap.
                        warn!(room = %room, missed, "WebSocket subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
    drop(tx);

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(event) => {
                    let frame = match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "Failed to serialize room event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {
                    // Clients only listen; anything they send is ignored.
                }
            },
        }
    }

    for task in forwarders {
        task.abort();
    }
    debug!("WebSocket connection closed");
}
