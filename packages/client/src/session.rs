//! Interactive chat session over one WebSocket.

use futures_util::{SinkExt, StreamExt};
use hubbub_server::infrastructure::dto::websocket::Envelope;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};

use crate::{error::ClientError, formatter::format_envelope};

pub type Connection = WebSocketStream<MaybeTlsStream<TcpStream>>;

const QUIT_COMMAND: &str = "/quit";

/// Open the socket for `team_id`, authenticating with a bearer token.
pub async fn connect(url: &str, team_id: u64, token: &str) -> Result<Connection, ClientError> {
    let mut request = endpoint_url(url, team_id).into_client_request()?;
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, value);

    let (connection, response) = connect_async(request).await?;
    tracing::debug!(status = %response.status(), "WebSocket handshake completed");
    Ok(connection)
}

/// `url` with the `team_id` query parameter appended to any existing query.
fn endpoint_url(url: &str, team_id: u64) -> String {
    let separator = if !url.contains('?') {
        "?"
    } else if url.ends_with('?') || url.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!("{url}{separator}team_id={team_id}")
}

/// Relay stdin lines to the server and print incoming messages until
/// `/quit`, end of input or the server closes the connection.
pub async fn run(connection: Connection) -> Result<(), ClientError> {
    let (mut sink, mut stream) = connection.split();
    let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

    // rustyline blocks, so it lives on a blocking thread
    let editor = tokio::task::spawn_blocking(move || -> Result<(), ReadlineError> {
        let mut editor = DefaultEditor::new()?;
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.blocking_send(line).is_err() {
                        return Ok(());
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    });

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                let line = line.trim();
                if line == QUIT_COMMAND {
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                let payload = Envelope::chat(line).encode()?;
                sink.send(Message::text(payload.to_string())).await?;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match Envelope::decode(text.as_str()) {
                    Ok(envelope) => println!("{}", format_envelope(&envelope)),
                    Err(e) => tracing::warn!("Ignoring unreadable frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    println!("Connection closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
        }
    }

    let _ = sink.close().await;

    if editor.is_finished() {
        if let Ok(Err(e)) = editor.await {
            return Err(e.into());
        }
    }
    Ok(())
}
