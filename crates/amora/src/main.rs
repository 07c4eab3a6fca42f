// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Amora - realtime presence and messaging backend.
//!
//! This is the binary entry point for the Amora gateway.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Amora - realtime presence and messaging backend.
#[derive(Parser, Debug)]
#[command(name = "amora", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway server.
    Serve,
    /// Mint a connection token for a user (development helper).
    Token {
        /// Username the token identifies.
        #[arg(long)]
        username: String,
        /// Display name carried in fallback notifications.
        #[arg(long)]
        known_as: Option<String>,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match amora_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            amora_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            init_tracing(&config.server.log_level);
            if let Err(e) = serve::run(config).await {
                tracing::error!("fatal: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Token { username, known_as }) => {
            let Some(secret) = config.auth.token_secret.as_deref() else {
                eprintln!("amora token: auth.token_secret is not configured");
                std::process::exit(1);
            };
            let claims = amora_gateway::auth::TokenClaims { username, known_as };
            match amora_gateway::auth::mint_token(secret, &claims) {
                Ok(token) => println!("{token}"),
                Err(e) => {
                    eprintln!("amora token: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("amora config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("amora: use --help for available commands");
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = amora_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 5001);
    }
}
