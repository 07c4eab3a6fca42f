// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Figment guarantees shape and types; this pass checks the values.

use crate::diagnostic::ConfigError;
use crate::model::AmoraConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized config. Collects every problem instead of failing
/// on the first one.
pub fn validate_config(config: &AmoraConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::for_key(
            "server.log_level",
            format!("unknown log level `{}`", config.server.log_level),
            format!("use one of: {}", LOG_LEVELS.join(", ")),
        ));
    }

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::for_key(
            "server.host",
            "host must not be empty",
            "use `127.0.0.1` for local-only or `0.0.0.0` to listen on all interfaces",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::for_key(
            "storage.database_path",
            "database path must not be empty",
            "point this at a writable file path, e.g. `/var/lib/amora/amora.db`",
        ));
    }

    if let Some(secret) = &config.auth.token_secret {
        if secret.trim().is_empty() {
            errors.push(ConfigError::for_key(
                "auth.token_secret",
                "token secret is set but empty",
                "provide a non-empty secret or remove the key entirely",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
