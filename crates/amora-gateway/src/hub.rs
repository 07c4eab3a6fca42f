// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket hub: outbound senders for every live connection.
//!
//! Each WebSocket handler registers an mpsc sender under its connection id;
//! the hub is how the rest of the system (router, presence broadcasts)
//! reaches a socket. Delivery is best effort: a connection that is gone or
//! whose channel is full is skipped while the rest still receive the event.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use amora_core::{ConnectionId, EventSink, ServerEvent};

/// Outbound routing table for both channels.
#[derive(Debug, Default)]
pub struct SocketHub {
    presence_senders: DashMap<ConnectionId, mpsc::Sender<String>>,
    message_senders: DashMap<ConnectionId, mpsc::Sender<String>>,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_presence(&self, connection_id: ConnectionId, sender: mpsc::Sender<String>) {
        self.presence_senders.insert(connection_id, sender);
    }

    pub fn unregister_presence(&self, connection_id: &ConnectionId) {
        self.presence_senders.remove(connection_id);
    }

    pub fn register_message(&self, connection_id: ConnectionId, sender: mpsc::Sender<String>) {
        self.message_senders.insert(connection_id, sender);
    }

    pub fn unregister_message(&self, connection_id: &ConnectionId) {
        self.message_senders.remove(connection_id);
    }

    /// Number of live presence sockets (health endpoint).
    pub fn presence_socket_count(&self) -> usize {
        self.presence_senders.len()
    }

    /// Broadcast to every presence socket except `except` (the caller).
    pub async fn broadcast_presence_except(&self, except: &ConnectionId, event: &ServerEvent) {
        let frame = event.to_frame();
        // Snapshot the senders before awaiting: dashmap iteration must not
        // be held across an await point.
        let senders: Vec<mpsc::Sender<String>> = self
            .presence_senders
            .iter()
            .filter(|entry| entry.key() != except)
            .map(|entry| entry.value().clone())
            .collect();
        for sender in senders {
            let _ = sender.send(frame.clone()).await;
        }
    }

    async fn dispatch(
        map: &DashMap<ConnectionId, mpsc::Sender<String>>,
        connections: &[ConnectionId],
        event: &ServerEvent,
    ) {
        let frame = event.to_frame();
        let senders: Vec<mpsc::Sender<String>> = connections
            .iter()
            .filter_map(|id| map.get(id).map(|entry| entry.value().clone()))
            .collect();
        for sender in senders {
            // A closed receiver means the socket is already gone; skip it.
            let _ = sender.send(frame.clone()).await;
        }
    }
}

#[async_trait]
impl EventSink for SocketHub {
    async fn send_to_group(&self, connections: &[ConnectionId], event: &ServerEvent) {
        Self::dispatch(&self.message_senders, connections, event).await;
    }

    async fn send_to_presence(&self, connections: &[ConnectionId], event: &ServerEvent) {
        Self::dispatch(&self.presence_senders, connections, event).await;
    }
}
