// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event delivery collaborator trait.

use async_trait::async_trait;

use crate::events::ServerEvent;
use crate::types::ConnectionId;

/// Delivers events to live sockets.
///
/// Delivery is best effort: a connection that has already gone away is
/// silently skipped while delivery continues to the rest of the recipients.
/// The production implementation is the gateway's socket hub; tests use a
/// recording sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Send an event to connections on the messaging channel.
    async fn send_to_group(&self, connections: &[ConnectionId], event: &ServerEvent);

    /// Send an event to connections on the presence channel.
    async fn send_to_presence(&self, connections: &[ConnectionId], event: &ServerEvent);
}
