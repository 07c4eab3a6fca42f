// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-to-client event contract.
//!
//! Frames are JSON objects `{"event": <name>, "data": ...}`. The event names
//! are a bit-exact contract with the browser client and must never change.

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Group, Username};

/// Lightweight fallback notification payload: who sent the message, without
/// the message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessageAlert {
    pub username: Username,
    pub known_as: String,
}

/// An event pushed to a connected client over one of the two channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A user's first connection came online (presence channel, to others).
    UserIsOnline(Username),
    /// A user's last connection went away (presence channel, to others).
    UserIsOffline(Username),
    /// Full online snapshot, delivered to a newly connected presence socket.
    GetOnlineUsers(Vec<Username>),
    /// Group membership changed (messaging channel, to all group members).
    UpdatedGroup(Group),
    /// Initial thread snapshot, oldest first (messaging channel, to caller).
    ReceiveMessageThread(Vec<ChatMessage>),
    /// A message was delivered into the open conversation.
    NewMessage(ChatMessage),
    /// Fallback: a message arrived for a conversation the recipient is not
    /// currently viewing (presence channel).
    NewMessageReceived(NewMessageAlert),
    /// A client-visible failure notice. The socket stays open.
    Error(String),
}

impl ServerEvent {
    /// Serialize to the wire frame. Serialization of these variants cannot
    /// fail; the fallback is only defensive.
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"Error","data":"serialization failure"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_event_frame_shape() {
        let frame = ServerEvent::UserIsOnline(Username::new("alice")).to_frame();
        assert_eq!(frame, r#"{"event":"UserIsOnline","data":"alice"}"#);
    }

    #[test]
    fn new_message_frame_round_trips() {
        let msg = ChatMessage::new(&Username::new("alice"), &Username::new("bob"), "hey");
        let frame = ServerEvent::NewMessage(msg.clone()).to_frame();
        let parsed: ServerEvent = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed, ServerEvent::NewMessage(msg));
    }

    #[test]
    fn alert_carries_display_name_not_content() {
        let frame = ServerEvent::NewMessageReceived(NewMessageAlert {
            username: Username::new("alice"),
            known_as: "Alice".into(),
        })
        .to_frame();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["data"]["username"], "alice");
        assert_eq!(json["data"]["known_as"], "Alice");
        assert!(json["data"].get("content").is_none());
    }
}
