//! Server bootstrap.

use std::{future::Future, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::{
    config::{ConfigError, ServerConfig},
    domain::MessageRepository,
    infrastructure::{
        InMemoryMessageRepository, JwtVerifier, LoggingOfflineNotifier, repository::SeedError,
    },
    ui::{router, signal::shutdown_signal, state::AppState},
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("seed error: {0}")]
    Seed(#[from] SeedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the state, bind and serve until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let connection = config.connection_config()?;
    let addr = config.listen_addr()?;

    let repository: Arc<dyn MessageRepository> = match &config.channels_file {
        Some(path) => Arc::new(InMemoryMessageRepository::from_seed_file(path)?),
        None => {
            tracing::warn!("No channels file given, starting with an empty channel directory");
            Arc::new(InMemoryMessageRepository::new())
        }
    };

    let state = Arc::new(AppState::new(
        repository,
        Arc::new(JwtVerifier::new(config.jwt_secret.as_bytes())),
        Arc::new(LoggingOfflineNotifier),
        connection,
    ));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    serve(listener, state, shutdown_signal()).await
}

/// Serve on an already bound listener.
///
/// When `shutdown` resolves the registry is drained, which closes every
/// outbound buffer so each connection sends a close frame.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let hub = state.hub.clone();
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            hub.shutdown().await;
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
