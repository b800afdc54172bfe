// src/realtime.rs

//! Best-effort realtime fan-out.
//!
//! Mutating handlers publish events onto named channels (`doubt-{id}`,
//! `junior-space`); WebSocket clients subscribe to a channel and receive the
//! events as JSON frames. Delivery is fire-and-forget: a publish with no
//! subscribers, or to a lagged subscriber, never fails the primary mutation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tokio::sync::broadcast;

/// Buffered events per channel before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Broadcaster {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publishes `{event, data}` to every subscriber of `channel`.
    /// Failures are logged and swallowed.
    pub fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) {
        let frame = serde_json::json!({ "event": event, "data": payload }).to_string();

        let sender = {
            let channels = match self.channels.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            channels.get(channel).cloned()
        };

        match sender {
            Some(tx) => {
                if let Err(e) = tx.send(frame) {
                    tracing::debug!("No live subscribers on '{}': {}", channel, e);
                }
            }
            None => tracing::debug!("Publish to unopened channel '{}' dropped", channel),
        }
    }

    /// Subscribes to a channel, creating it on first use.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        let mut channels = match self.channels.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

/// GET /api/ws/{channel} — upgrades to a WebSocket and streams channel events.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(channel): Path<String>,
    State(broadcaster): State<Broadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, channel, broadcaster))
}

async fn handle_socket(mut socket: WebSocket, channel: String, broadcaster: Broadcaster) {
    let mut rx = broadcaster.subscribe(&channel);
    tracing::debug!("WebSocket subscribed to '{}'", channel);

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Subscriber on '{}' lagged, {} events dropped", channel, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Clients don't send anything meaningful; drain until close.
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::debug!("WebSocket on '{}' closed", channel);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let b = Broadcaster::new();
        let mut rx = b.subscribe("doubt-1");

        b.publish("doubt-1", "new-comment", serde_json::json!({"id": 42}));

        let frame = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["event"], "new-comment");
        assert_eq!(parsed["data"]["id"], 42);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_swallowed() {
        let b = Broadcaster::new();
        // Never panics or errors; delivery is best-effort.
        b.publish("junior-space", "new-post", serde_json::json!({}));
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let b = Broadcaster::new();
        let mut rx1 = b.subscribe("doubt-1");
        let mut rx2 = b.subscribe("doubt-2");

        b.publish("doubt-2", "comment-deleted", serde_json::json!({"commentId": 7}));

        assert!(rx1.try_recv().is_err());
        let frame = rx2.recv().await.unwrap();
        assert!(frame.contains("comment-deleted"));
    }
}
