// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging channel WebSocket handler.
//!
//! Client -> Server (JSON):
//! ```json
//! {"recipient_username": "bob", "content": "hello"}
//! ```
//!
//! Server -> Client (JSON):
//! ```json
//! {"event": "UpdatedGroup", "data": {...}}
//! {"event": "ReceiveMessageThread", "data": [...]}
//! {"event": "NewMessage", "data": {...}}
//! {"event": "Error", "data": "reason"}
//! ```
//!
//! One socket views exactly one two-party conversation, named by the `user`
//! query parameter (the counterpart's username).

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

use amora_core::{Connection, ConnectionId, EventSink, ServerEvent, Username};
use amora_groups::group_name_for;

use crate::auth;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
pub struct MessageParams {
    token: String,
    /// The counterpart's username.
    user: String,
}

/// Inbound send-message frame.
#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    recipient_username: String,
    content: String,
}

/// WebSocket upgrade handler for `/ws/messages`.
pub async fn messages_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<MessageParams>,
    State(state): State<GatewayState>,
) -> Response {
    let claims = match auth::verify_token(&state.auth.token_secret, &params.token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "messages handshake rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    let username = Username::new(&claims.username);
    let counterpart = Username::new(&params.user);
    // A conversation needs a distinct counterpart; anything else is a
    // malformed group join.
    if counterpart.is_empty() || counterpart == username {
        return StatusCode::BAD_REQUEST.into_response();
    }
    ws.on_upgrade(move |socket| handle_message_socket(socket, state, username, counterpart))
}

async fn handle_message_socket(
    socket: WebSocket,
    state: GatewayState,
    username: Username,
    counterpart: Username,
) {
    let connection_id = ConnectionId::generate();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    state.hub.register_message(connection_id.clone(), tx.clone());

    let group_name = group_name_for(&username, &counterpart);
    let group = match state
        .groups
        .join(
            &group_name,
            Connection {
                connection_id: connection_id.clone(),
                username: username.clone(),
            },
        )
        .await
    {
        Ok(group) => group,
        Err(e) => {
            // The join did not complete; the client must not believe it is
            // in the group. Report and close.
            tracing::warn!(group = %group_name, error = %e, "group join failed");
            state.hub.unregister_message(&connection_id);
            let _ = ws_sender
                .send(Message::Text(ServerEvent::Error(e.to_string()).to_frame().into()))
                .await;
            return;
        }
    };

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Everyone in the group (including the caller) learns the new membership.
    state
        .hub
        .send_to_group(&group.connection_ids(), &ServerEvent::UpdatedGroup(group))
        .await;

    // Opening the thread reads it: mark the caller's unread incoming
    // messages in one batched write, then deliver the snapshot.
    if let Err(e) = state.store.mark_thread_read(&username, &counterpart).await {
        tracing::warn!(group = %group_name, error = %e, "thread read-mark failed");
    }
    match state.store.message_thread(&username, &counterpart).await {
        Ok(thread) => {
            let _ = tx
                .send(ServerEvent::ReceiveMessageThread(thread).to_frame())
                .await;
        }
        Err(e) => {
            let _ = tx.send(ServerEvent::Error(e.to_string()).to_frame()).await;
        }
    }

    while let Some(Ok(frame)) = ws_receiver.next().await {
        match frame {
            Message::Text(text) => {
                let request: SendMessageRequest = match serde_json::from_str(&text) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::debug!(error = %e, "malformed send-message frame");
                        let _ = tx
                            .send(ServerEvent::Error("malformed message payload".into()).to_frame())
                            .await;
                        continue;
                    }
                };
                // The router broadcasts NewMessage itself on success; errors
                // become a visible notice without closing the socket.
                if let Err(e) = state
                    .router
                    .submit_message(&username, &request.recipient_username, &request.content)
                    .await
                {
                    let _ = tx.send(ServerEvent::Error(e.to_string()).to_frame()).await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Unconditional cleanup: the connection leaves its group even if an
    // in-flight submit was abandoned by the disconnect.
    state.hub.unregister_message(&connection_id);
    sender_task.abort();
    match state.groups.leave(&connection_id).await {
        Ok(group) => {
            state
                .hub
                .send_to_group(&group.connection_ids(), &ServerEvent::UpdatedGroup(group))
                .await;
        }
        // The connection never joined a group; benign.
        Err(e) if e.is_not_found() => {}
        Err(e) => tracing::warn!(connection_id = %connection_id, error = %e, "group leave failed"),
    }
}
