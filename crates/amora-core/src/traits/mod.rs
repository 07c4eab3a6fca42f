// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The presence, group, and router crates depend only on these traits; the
//! SQLite store and the gateway's socket hub are the production implementations.

pub mod sink;
pub mod store;

pub use sink::EventSink;
pub use store::ChatStore;
