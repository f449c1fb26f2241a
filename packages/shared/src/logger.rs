//! Logger setup shared by the server and client binaries.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `<crate>=<default_level>` is used
/// together with `tower_http=<default_level>` for request spans.
pub fn setup_logger(name: &str, default_level: &str) {
    let crate_target = name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{crate_target}={default_level},hubbub_server={default_level},tower_http={default_level}"
        ))
    });

    // 二重初期化（テストなど）ではエラーを無視する
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
