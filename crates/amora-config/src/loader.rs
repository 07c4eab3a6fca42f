// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./amora.toml` > `~/.config/amora/amora.toml` >
//! `/etc/amora/amora.toml` with environment variable overrides via the
//! `AMORA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AmoraConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/amora/amora.toml` (system-wide)
/// 3. `~/.config/amora/amora.toml` (user XDG config)
/// 4. `./amora.toml` (local directory)
/// 5. `AMORA_*` environment variables
pub fn load_config() -> Result<AmoraConfig, figment::Error> {
    defaults_figment()
        .merge(Toml::file("/etc/amora/amora.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("amora/amora.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("amora.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<AmoraConfig, figment::Error> {
    defaults_figment().merge(Toml::string(toml_content)).extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AmoraConfig, figment::Error> {
    defaults_figment()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The base layer every loader starts from: compiled defaults.
fn defaults_figment() -> Figment {
    Figment::new().merge(Serialized::defaults(AmoraConfig::default()))
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay unambiguous: `AMORA_AUTH_TOKEN_SECRET` must map to
/// `auth.token_secret`, not `auth.token.secret`.
fn env_provider() -> Env {
    Env::prefixed("AMORA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("auth_", "auth.", 1);
        mapped.into()
    })
}
