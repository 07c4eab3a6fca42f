// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Amora workspace.

use serde::{Deserialize, Serialize};

/// A case-normalized username.
///
/// Usernames are owned by the identity collaborator; this subsystem only uses
/// them as keys. All comparisons happen on the lowercased form, so two tokens
/// for `Alice` and `alice` resolve to the same presence entry and the same
/// conversation group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Normalize a raw username: trimmed and lowercased.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one live socket session.
///
/// Generated by the gateway when a socket opens; never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live socket session belonging to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: ConnectionId,
    pub username: Username,
}

/// The set of connections currently viewing a specific two-party conversation.
///
/// The group name is a deterministic function of the two participants (see
/// `amora-groups`), so both sides independently resolve to the same group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub connections: Vec<Connection>,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            connections: Vec::new(),
        }
    }

    /// True if any connection in the group belongs to `username`.
    pub fn has_member(&self, username: &Username) -> bool {
        self.connections.iter().any(|c| c.username == *username)
    }

    pub fn contains_connection(&self, connection_id: &ConnectionId) -> bool {
        self.connections
            .iter()
            .any(|c| c.connection_id == *connection_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .map(|c| c.connection_id.clone())
            .collect()
    }
}

/// A persisted chat message.
///
/// Timestamps are RFC 3339 strings in UTC. `read_at` is set at submission
/// time only when the recipient's connection is a member of the matching
/// conversation group, or later by the batched thread read-mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_username: Username,
    pub recipient_username: Username,
    pub content: String,
    pub sent_at: String,
    pub read_at: Option<String>,
}

impl ChatMessage {
    /// Build a new unread message stamped with the current time.
    pub fn new(sender: &Username, recipient: &Username, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_username: sender.clone(),
            recipient_username: recipient.clone(),
            content: content.to_string(),
            sent_at: chrono::Utc::now().to_rfc3339(),
            read_at: None,
        }
    }
}

/// The slice of a user record this subsystem needs: the identity key and the
/// display name carried in fallback notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: Username,
    pub known_as: String,
}
