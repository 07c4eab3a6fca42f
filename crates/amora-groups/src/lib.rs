// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation-group coordination.
//!
//! Every unordered pair of participants maps to one deterministic group
//! name; the set of connections currently viewing that conversation is the
//! group's membership, persisted through the `ChatStore` collaborator so it
//! survives reconnects.

pub mod coordinator;

pub use coordinator::{group_name_for, GroupCoordinator};
