// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Amora realtime backend.

use thiserror::Error;

/// The primary error type used across all Amora crates.
///
/// Registry-level no-ops (disconnecting an absent connection, leaving a group
/// that was never joined) are not errors at all -- they are swallowed by the
/// callers as benign idempotent outcomes and never constructed here.
#[derive(Debug, Error)]
pub enum AmoraError {
    /// The caller requested something the protocol forbids (self-messaging,
    /// malformed group join).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A named entity does not exist (unknown recipient, untracked connection).
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// Storage collaborator failure. Always aborts the triggering operation;
    /// never leaves a partial mutation behind.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport/channel-level failure (bind error, closed socket channel,
    /// rejected credentials).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AmoraError {
    /// True for the `NotFound` variant. Callers on cleanup paths use this to
    /// distinguish the benign "connection never joined a group" case from
    /// real failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AmoraError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        let err = AmoraError::NotFound {
            kind: "user",
            name: "ghost".into(),
        };
        assert!(err.is_not_found());
        assert!(!AmoraError::Internal("x".into()).is_not_found());
    }

    #[test]
    fn display_includes_context() {
        let err = AmoraError::NotFound {
            kind: "user",
            name: "ghost".into(),
        };
        assert_eq!(err.to_string(), "user not found: ghost");

        let err = AmoraError::InvalidOperation("you cannot send messages to yourself".into());
        assert!(err.to_string().contains("yourself"));
    }
}
