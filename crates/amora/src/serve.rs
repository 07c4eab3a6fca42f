// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `amora serve` command: wire storage to the gateway and run until
//! interrupted.

use std::sync::Arc;

use amora_config::AmoraConfig;
use amora_core::AmoraError;
use amora_gateway::auth::AuthConfig;
use amora_gateway::server::{self, GatewayState, ServerConfig};
use amora_storage::SqliteChatStore;

/// Run the gateway until ctrl-c, then checkpoint storage.
pub async fn run(config: AmoraConfig) -> Result<(), AmoraError> {
    // Fail closed: without a token secret every handshake would be rejected
    // anyway, so refuse to start.
    let Some(token_secret) = config
        .auth
        .token_secret
        .clone()
        .filter(|secret| !secret.trim().is_empty())
    else {
        return Err(AmoraError::Config(
            "auth.token_secret must be set to serve".to_string(),
        ));
    };

    let store = Arc::new(
        SqliteChatStore::open(&config.storage.database_path, config.storage.wal_mode).await?,
    );
    tracing::info!(path = %config.storage.database_path, "storage ready");

    let state = GatewayState::new(store.clone(), AuthConfig { token_secret });
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let listener = server::bind(&server_config).await?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "gateway listening");
    }

    tokio::select! {
        result = server::serve(listener, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    store.close().await?;
    Ok(())
}
