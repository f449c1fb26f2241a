//! Shared application state.

use std::sync::Arc;

use crate::{
    config::ConnectionConfig,
    domain::{IdentityVerifier, MessageRepository, OfflineNotifier},
    infrastructure::Hub,
    usecase::{AdmitConnectionUseCase, RelayFrameUseCase, SendMessageUseCase},
};

/// Shared application state
///
/// Built once per process; the single [`Hub`] inside is the registry every
/// handler and connection talks to.
pub struct AppState {
    /// Live connection registry
    pub hub: Arc<Hub>,
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn MessageRepository>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub notifier: Arc<dyn OfflineNotifier>,
    pub connection: ConnectionConfig,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn OfflineNotifier>,
        connection: ConnectionConfig,
    ) -> Self {
        Self {
            hub: Arc::new(Hub::new()),
            repository,
            verifier,
            notifier,
            connection,
        }
    }

    pub fn admit_connection_usecase(&self) -> AdmitConnectionUseCase {
        AdmitConnectionUseCase::new(self.verifier.clone())
    }

    pub fn relay_frame_usecase(&self) -> RelayFrameUseCase {
        RelayFrameUseCase::new(self.hub.clone(), self.connection.echo_to_sender)
    }

    pub fn send_message_usecase(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.repository.clone(),
            self.hub.clone(),
            self.notifier.clone(),
        )
    }
}
