//! Test server and WebSocket helpers shared by the integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hubbub_server::{
    config::ConnectionConfig,
    domain::{TeamId, UserId},
    infrastructure::{
        InMemoryMessageRepository, JwtVerifier, LoggingOfflineNotifier, repository::ChannelSeed,
    },
    ui::AppState,
};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const SECRET: &[u8] = b"integration-test-secret";

/// Team of the seeded channel
pub const TEAM: u64 = 7;
/// Seeded channel with members 42, 99 and 123
pub const CHANNEL: u64 = 1;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const PRESENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// In-process server bound to an ephemeral port
pub struct TestServer {
    addr: SocketAddr,
    pub state: Arc<AppState>,
    pub repository: Arc<InMemoryMessageRepository>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ConnectionConfig::default()).await
    }

    pub async fn start_with(connection: ConnectionConfig) -> Self {
        let repository = Arc::new(InMemoryMessageRepository::with_channels([ChannelSeed {
            channel_id: CHANNEL,
            team_id: TEAM,
            members: vec![42, 99, 123],
        }]));
        let state = Arc::new(AppState::new(
            repository.clone(),
            Arc::new(JwtVerifier::new(SECRET)),
            Arc::new(LoggingOfflineNotifier),
            connection,
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn({
            let state = state.clone();
            async move {
                hubbub_server::serve(listener, state, async move {
                    let _ = rx.await;
                })
                .await
                .expect("Server failed");
            }
        });

        Self {
            addr,
            state,
            repository,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, team_id: &str) -> String {
        format!("ws://{}/ws?team_id={}", self.addr, team_id)
    }

    /// Open a socket for `user_id` in `team_id` and wait until it is registered.
    pub async fn connect(&self, user_id: u64, team_id: u64) -> Client {
        let client = self
            .try_connect(Some(&token(user_id)), Some(&team_id.to_string()))
            .await
            .expect("Failed to connect");
        self.wait_for_presence(team_id, user_id, true).await;
        client
    }

    pub async fn try_connect(
        &self,
        token: Option<&str>,
        team_id: Option<&str>,
    ) -> Result<Client, tungstenite::Error> {
        let url = match team_id {
            Some(team_id) => self.ws_url(team_id),
            None => format!("ws://{}/ws", self.addr),
        };
        let mut request = url.into_client_request()?;
        if let Some(token) = token {
            request.headers_mut().insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid header"),
            );
        }
        connect_async(request).await.map(|(client, _)| client)
    }

    /// Poll the registry until the user's presence matches `online`.
    pub async fn wait_for_presence(&self, team_id: u64, user_id: u64, online: bool) {
        let team_id = TeamId::from(team_id);
        let user_id = UserId::from(user_id);
        let deadline = tokio::time::Instant::now() + PRESENCE_TIMEOUT;
        while self.state.hub.is_user_connected(&team_id, &user_id).await != online {
            assert!(
                tokio::time::Instant::now() < deadline,
                "presence of {user_id} in {team_id} never became {online}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn token(user_id: u64) -> String {
    JwtVerifier::new(SECRET)
        .issue(&UserId::from(user_id), Duration::from_secs(3600))
        .expect("Failed to issue token")
}

pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::text(text.to_string()))
        .await
        .expect("Failed to send");
}

/// Next text frame as JSON, skipping control frames.
pub async fn recv_json(client: &mut Client) -> serde_json::Value {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).expect("Invalid JSON frame");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => panic!("Unexpected frame: {other:?}"),
            }
        }
    })
    .await
    .expect("Timed out waiting for a frame")
}

/// Assert that no text frame arrives within `wait`.
pub async fn assert_silent(client: &mut Client, wait: Duration) {
    let result = tokio::time::timeout(wait, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => return other,
            }
        }
    })
    .await;
    if let Ok(frame) = result {
        panic!("Expected silence, got {frame:?}");
    }
}
