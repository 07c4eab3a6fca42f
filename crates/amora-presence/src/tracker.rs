// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence tracker: transition events over the connection registry.

use amora_core::{ConnectionId, Username};

use crate::registry::ConnectionRegistry;

/// Tracks who is online and reports the transitions the gateway broadcasts.
///
/// Thin layer over [`ConnectionRegistry`] that adds structured logging. The
/// gateway owns a single shared instance.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    registry: ConnectionRegistry,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection. True iff the user just came online.
    pub fn user_connected(&self, username: &Username, connection_id: ConnectionId) -> bool {
        let is_online = self.registry.add(username, connection_id.clone());
        tracing::debug!(%username, %connection_id, is_online, "presence connect");
        is_online
    }

    /// Record a disconnection. True iff the user just went offline.
    pub fn user_disconnected(&self, username: &Username, connection_id: &ConnectionId) -> bool {
        let is_offline = self.registry.remove(username, connection_id);
        tracing::debug!(%username, %connection_id, is_offline, "presence disconnect");
        is_offline
    }

    /// Sorted snapshot of online usernames.
    pub fn online_users(&self) -> Vec<Username> {
        self.registry.online()
    }

    /// Every socket this user currently holds. Used by the message router's
    /// fallback path to address out-of-band notifications.
    pub fn connections_for(&self, username: &Username) -> Vec<ConnectionId> {
        self.registry.connections_for(username)
    }
}
