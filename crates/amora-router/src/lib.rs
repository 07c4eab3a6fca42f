// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message routing for the Amora realtime backend.
//!
//! On submission, a message is either delivered live into the open
//! conversation (and stamped read, because the recipient is looking at it)
//! or persisted unread with a lightweight fallback notification pushed to
//! whatever other sockets the recipient holds.

pub mod router;

pub use router::MessageRouter;
