use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use tokio::sync::{mpsc, RwLock};
use taskboard_core::types::{DbId, Timestamp};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// Channel key under which a project's board updates are pushed.
pub fn project_channel(project_id: DbId) -> String {
    format!("project:{project_id}")
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Set once a message on this connection carries a valid token.
    pub user_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    pub connected_at: Timestamp,
    /// Channel keys this connection receives pushes for.
    pub channels: HashSet<String>,
}

/// Manages all active WebSocket connections and their channel subscriptions.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared across the
/// application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            channels: HashSet::new(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID. Its subscriptions go with it.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Remember which user is behind a connection.
    pub async fn set_user(&self, conn_id: &str, user_id: DbId) {
        if let Some(conn) = self.connections.write().await.get_mut(conn_id) {
            conn.user_id = Some(user_id);
        }
    }

    /// Subscribe a connection to a channel.
    ///
    /// Returns `false` when the connection is unknown.
    pub async fn subscribe(&self, conn_id: &str, channel: &str) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.channels.insert(channel.to_string());
                true
            }
            None => false,
        }
    }

    /// Drop a connection's subscription. Returns whether it was subscribed.
    pub async fn unsubscribe(&self, conn_id: &str, channel: &str) -> bool {
        self.connections
            .write()
            .await
            .get_mut(conn_id)
            .is_some_and(|conn| conn.channels.remove(channel))
    }

    /// Number of connections subscribed to `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.channels.contains(channel))
            .count()
    }

    /// Send a message to every subscriber of `channel`.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn broadcast_to_channel(&self, channel: &str, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|c| c.channels.contains(channel)) {
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    /// Send a message to one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.connections
            .read()
            .await
            .get(conn_id)
            .is_some_and(|conn| conn.sender.send(message).is_ok())
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap serialized JSON as a text frame.
pub fn text_message(json: String) -> Message {
    Message::Text(Utf8Bytes::from(json))
}
