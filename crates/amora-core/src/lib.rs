// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Amora realtime backend.
//!
//! This crate provides the domain types, the error taxonomy, the client-facing
//! event contract, and the collaborator traits (persistence, event delivery)
//! shared by the presence, group, router, and gateway crates.

pub mod error;
pub mod events;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AmoraError;
pub use events::{NewMessageAlert, ServerEvent};
pub use traits::{ChatStore, EventSink};
pub use types::{ChatMessage, Connection, ConnectionId, Group, UserProfile, Username};
