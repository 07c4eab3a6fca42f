// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket gateway for the Amora realtime backend.
//!
//! Two logical endpoints:
//! - `/ws/presence` -- online-status events. No extra parameters.
//! - `/ws/messages?user=<counterpart>` -- one two-party conversation per
//!   socket.
//!
//! Both authenticate with a signed `token` query parameter at connect time
//! (WebSocket clients cannot set an Authorization header). The caller's
//! identity is resolved before any socket callback runs.

pub mod auth;
pub mod handlers;
pub mod hub;
pub mod message_ws;
pub mod presence_ws;
pub mod server;

pub use hub::SocketHub;
pub use server::{start_server, GatewayState, ServerConfig};
