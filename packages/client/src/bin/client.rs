//! Terminal chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hubbub-client -- --team-id 7 --token <jwt>
//! ```

use clap::Parser;
use hubbub_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "hubbub-client", version, about = "Hubbub terminal chat client")]
struct Args {
    /// WebSocket endpoint of the server
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Team to join
    #[arg(long)]
    team_id: u64,

    /// Bearer token (see `hubbub-server issue-token`)
    #[arg(long, env = "HUBBUB_TOKEN", hide_env_values = true)]
    token: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let connection = match hubbub_client::connect(&args.url, args.team_id, &args.token).await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", args.url, e);
            std::process::exit(1);
        }
    };
    println!("Connected to team {}. Type /quit to exit.", args.team_id);

    if let Err(e) = hubbub_client::run(connection).await {
        tracing::error!("Session error: {}", e);
        std::process::exit(1);
    }
}
