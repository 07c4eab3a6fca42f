// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain HTTP handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::GatewayState;

/// Health endpoint payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub online_users: usize,
    pub presence_sockets: usize,
}

/// `GET /health` -- unauthenticated liveness probe for process supervision.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.start_time.elapsed().as_secs(),
        online_users: state.presence.online_users().len(),
        presence_sockets: state.hub.presence_socket_count(),
    })
}
