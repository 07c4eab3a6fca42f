// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence channel WebSocket handler.
//!
//! Server -> Client (JSON):
//! ```json
//! {"event": "UserIsOnline", "data": "alice"}
//! {"event": "UserIsOffline", "data": "alice"}
//! {"event": "GetOnlineUsers", "data": ["alice", "bob"]}
//! {"event": "NewMessageReceived", "data": {"username": "alice", "known_as": "Alice"}}
//! ```
//!
//! The channel carries no client-to-server operations; clients hold it open
//! to be counted online and to receive events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use amora_core::{ConnectionId, ServerEvent, UserProfile, Username};

use crate::auth;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct PresenceParams {
    token: String,
}

/// WebSocket upgrade handler for `/ws/presence`.
///
/// Identity is resolved from the token before the upgrade; a bad token
/// rejects the handshake with 401.
pub async fn presence_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<PresenceParams>,
    State(state): State<GatewayState>,
) -> Response {
    let claims = match auth::verify_token(&state.auth.token_secret, &params.token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "presence handshake rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    let username = Username::new(&claims.username);
    let known_as = claims.known_as.unwrap_or_else(|| claims.username.clone());
    ws.on_upgrade(move |socket| handle_presence_socket(socket, state, username, known_as))
}

async fn handle_presence_socket(
    socket: WebSocket,
    state: GatewayState,
    username: Username,
    known_as: String,
) {
    let connection_id = ConnectionId::generate();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    state.hub.register_presence(connection_id.clone(), tx.clone());

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Keep the display name fresh; fallback alerts carry it.
    if let Err(e) = state
        .store
        .upsert_user(&UserProfile {
            username: username.clone(),
            known_as,
        })
        .await
    {
        tracing::warn!(%username, error = %e, "profile upsert failed");
    }

    // Ordering matters: apply the connect mutation, then snapshot, then
    // dispatch, so the caller never sees a snapshot older than the event
    // others were told about.
    let came_online = state
        .presence
        .user_connected(&username, connection_id.clone());
    if came_online {
        state
            .hub
            .broadcast_presence_except(&connection_id, &ServerEvent::UserIsOnline(username.clone()))
            .await;
    }
    let snapshot = state.presence.online_users();
    let _ = tx.send(ServerEvent::GetOnlineUsers(snapshot).to_frame()).await;

    while let Some(Ok(frame)) = ws_receiver.next().await {
        match frame {
            Message::Close(_) => break,
            // No inbound operations on this channel; ping/pong is handled by
            // the protocol layer.
            _ => {}
        }
    }

    // Cleanup runs unconditionally on the way out, even for abrupt closes.
    state.hub.unregister_presence(&connection_id);
    sender_task.abort();
    let went_offline = state.presence.user_disconnected(&username, &connection_id);
    if went_offline {
        state
            .hub
            .broadcast_presence_except(&connection_id, &ServerEvent::UserIsOffline(username))
            .await;
    }
}
