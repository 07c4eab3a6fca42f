// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence tracking for the Amora realtime backend.
//!
//! Maps each username to its set of live socket connections and detects the
//! online/offline *transitions*: the first connection that brings a user
//! online and the last disconnection that takes them offline.
//!
//! State is process-local and in-memory. Running more than one gateway
//! process splits the online set; scaling out requires moving this registry
//! into a shared store, which is an explicit non-goal for now.

pub mod registry;
pub mod tracker;

pub use registry::ConnectionRegistry;
pub use tracker::PresenceTracker;
