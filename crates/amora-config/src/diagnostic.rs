// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic rendering for configuration errors.
//!
//! Figment errors are flattened into [`ConfigError`] values carrying the
//! offending key path, then rendered through miette so startup failures read
//! like compiler diagnostics instead of a serde backtrace.

use miette::Diagnostic;
use thiserror::Error;

/// A single configuration problem, keyed to the config path that caused it.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(amora::config))]
pub struct ConfigError {
    /// Human-readable description of the problem.
    pub message: String,

    /// Dotted key path (`server.port`) when known.
    pub key: Option<String>,

    /// Actionable hint, shown as miette help text.
    #[help]
    pub help: Option<String>,
}

impl ConfigError {
    /// A validation error for a specific key.
    pub fn for_key(key: &str, message: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: Some(key.to_string()),
            help: Some(help.into()),
        }
    }
}

/// Flatten a figment error (which may aggregate several failures) into
/// individual diagnostics.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| {
            let key = if e.path.is_empty() {
                None
            } else {
                Some(e.path.join("."))
            };
            let help = key
                .as_deref()
                .map(|k| format!("check the `{k}` entry in your amora.toml or AMORA_* environment"));
            ConfigError {
                message: e.kind.to_string(),
                key,
                help,
            }
        })
        .collect()
}

/// Render all errors to stderr through miette's fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::new(ConfigError {
            message: match &error.key {
                Some(key) => format!("{} (at `{key}`)", error.message),
                None => error.message.clone(),
            },
            key: error.key.clone(),
            help: error.help.clone(),
        });
        eprintln!("{report:?}");
    }
}
