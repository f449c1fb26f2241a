//! Hubbub real-time delivery server.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=secret cargo run --bin hubbub-server -- serve --channels-file channels.json
//! ```
//!
//! Issue a token for local testing:
//! ```not_rust
//! JWT_SECRET=secret cargo run --bin hubbub-server -- issue-token --user-id 42
//! ```

use std::time::Duration;

use clap::{Parser, Subcommand};
use hubbub_server::{config::ServerConfig, domain::UserId, infrastructure::JwtVerifier};
use hubbub_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "hubbub-server", version, about = "Hubbub real-time delivery server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP and WebSocket server
    Serve(ServerConfig),

    /// Print a signed bearer token for a user
    IssueToken {
        /// Numeric user id placed in the token
        #[arg(long)]
        user_id: u64,

        /// Token lifetime in seconds
        #[arg(long, default_value_t = 24 * 60 * 60)]
        ttl_secs: u64,

        /// HS256 signing secret
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    match cli.command {
        Command::Serve(config) => {
            if let Err(e) = hubbub_server::run(config).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::IssueToken {
            user_id,
            ttl_secs,
            jwt_secret,
        } => {
            let verifier = JwtVerifier::new(jwt_secret.as_bytes());
            match verifier.issue(&UserId::from(user_id), Duration::from_secs(ttl_secs)) {
                Ok(token) => println!("{token}"),
                Err(e) => {
                    tracing::error!("Failed to issue token: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
