// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use amora_core::{AmoraError, ChatStore};
use amora_groups::GroupCoordinator;
use amora_presence::PresenceTracker;
use amora_router::MessageRouter;

use crate::auth::AuthConfig;
use crate::handlers;
use crate::hub::SocketHub;
use crate::message_ws;
use crate::presence_ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub presence: Arc<PresenceTracker>,
    pub groups: Arc<GroupCoordinator>,
    pub router: Arc<MessageRouter>,
    pub store: Arc<dyn ChatStore>,
    pub hub: Arc<SocketHub>,
    pub auth: AuthConfig,
    /// Process start time for the health endpoint's uptime.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    /// Wire up the full realtime stack over a store and auth config.
    pub fn new(store: Arc<dyn ChatStore>, auth: AuthConfig) -> Self {
        let presence = Arc::new(PresenceTracker::new());
        let groups = Arc::new(GroupCoordinator::new(store.clone()));
        let hub = Arc::new(SocketHub::new());
        let router = Arc::new(MessageRouter::new(
            store.clone(),
            groups.clone(),
            presence.clone(),
            hub.clone(),
        ));
        Self {
            presence,
            groups,
            router,
            store,
            hub,
            auth,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Gateway server configuration (mirrors `ServerConfig` from `amora-config`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind. 0 binds an ephemeral port.
    pub port: u16,
}

/// Build the gateway router.
///
/// WebSocket routes authenticate during the handshake via the `token` query
/// parameter, not middleware; `/health` is public for process supervision.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/ws/presence", get(presence_ws::presence_handler))
        .route("/ws/messages", get(message_ws::messages_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and return the listener.
///
/// Split from [`serve`] so tests (and the health endpoint) can learn the
/// actual address when binding port 0.
pub async fn bind(config: &ServerConfig) -> Result<tokio::net::TcpListener, AmoraError> {
    let addr = format!("{}:{}", config.host, config.port);
    tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AmoraError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Serve the gateway on an already-bound listener until the task is aborted.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: GatewayState,
) -> Result<(), AmoraError> {
    let app = build_router(state);
    axum::serve(listener, app)
        .await
        .map_err(|e| AmoraError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Bind and serve in one step.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), AmoraError> {
    let listener = bind(config).await?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("gateway listening on {addr}");
    }
    serve(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use amora_storage::SqliteChatStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn state_wires_shared_components() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.db");
        let store: Arc<SqliteChatStore> = Arc::new(
            SqliteChatStore::open(path.to_str().unwrap(), true)
                .await
                .unwrap(),
        );
        let state = GatewayState::new(
            store,
            AuthConfig {
                token_secret: "secret".to_string(),
            },
        );
        let _cloned = state.clone();
        assert_eq!(state.hub.presence_socket_count(), 0);
    }

    #[tokio::test]
    async fn bind_ephemeral_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_failure_maps_to_channel_error() {
        let config = ServerConfig {
            host: "256.0.0.1".to_string(), // not an address
            port: 0,
        };
        let err = bind(&config).await.unwrap_err();
        assert!(matches!(err, AmoraError::Channel { .. }));
    }
}
