//! Real-time notification fan-out.
//!
//! A process-wide broadcast channel plays the role of the connection
//! registry: every connected WebSocket client holds one subscription, and
//! dropping it on disconnect removes the membership. Delivery is
//! best-effort and at-most-once; the HTTP response for the triggering
//! creation has already been sent by the time any of this runs.

use crate::{api::AppState, models::FoundObject, store::Store};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Queue depth per subscriber; clients lagging past this simply miss events.
const CHANNEL_CAPACITY: usize = 256;

/// Event pushed to every connected client after an object is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundObjectNotice {
    /// Human-readable summary naming the finder and the place.
    #[serde(rename = "Update")]
    pub update: String,
    #[serde(rename = "newObject")]
    pub object: FoundObject,
}

pub fn channel() -> broadcast::Sender<FoundObjectNotice> {
    broadcast::channel(CHANNEL_CAPACITY).0
}

/// Resolve the finder's name and the place description, then fan the notice
/// out to everyone connected.
///
/// Runs in a task spawned after the 201 has been produced. The object is
/// already persisted and the response already gone, so every failure here
/// is logged and dropped; nothing is retried or rolled back.
pub async fn announce_found_object(
    store: Arc<Store>,
    tx: broadcast::Sender<FoundObjectNotice>,
    object: FoundObject,
) {
    let owner = match store.get_user(&object.owner_id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(
                "Dropping broadcast for object {}: owner {} not found",
                object.id, object.owner_id
            );
            return;
        }
        Err(e) => {
            warn!(
                "Dropping broadcast for object {}: owner lookup failed: {e:#}",
                object.id
            );
            return;
        }
    };

    let place = match store.get_place(&object.place_id) {
        Ok(Some(place)) => place,
        Ok(None) => {
            warn!(
                "Dropping broadcast for object {}: place {} not found",
                object.id, object.place_id
            );
            return;
        }
        Err(e) => {
            warn!(
                "Dropping broadcast for object {}: place lookup failed: {e:#}",
                object.id
            );
            return;
        }
    };

    let notice = FoundObjectNotice {
        update: format!(
            "New object found by {} at {}",
            owner.user_name, place.description
        ),
        object,
    };

    // Err here just means nobody is connected right now.
    let _ = tx.send(notice);
}

/// `GET /ws`: upgrade and stream every notice to the client.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut rx = state.notices.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                let notice = match event {
                    Ok(notice) => notice,
                    // Slow client: skip what it missed and keep going.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let msg = serde_json::to_string(&notice).unwrap_or_else(|e| {
                    warn!("Failed to serialize notice: {e}");
                    "{}".to_string()
                });
                if socket.send(Message::Text(msg)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text == "ping" => {
                        let _ = socket.send(Message::Text("pong".to_string())).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
