//! Per-connection pumps.
//!
//! Each admitted socket runs two tasks:
//!
//! - the **inbound pump** reads frames, relays valid envelopes to the team and
//!   unregisters the connection when the socket errors, closes or misses the
//!   pong deadline;
//! - the **outbound pump** drains the bounded outbound buffer into the socket
//!   and sends keepalive pings. When the buffer is closed by the registry it
//!   sends a close frame and exits.
//!
//! The two tasks share nothing but the outbound buffer and the registry.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    config::KeepaliveConfig,
    domain::{ConnectionId, ConnectionIdentity, Payload},
    infrastructure::ConnectionHandle,
    ui::state::AppState,
};

#[derive(Debug, Error)]
enum WriteError {
    #[error("write deadline exceeded")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),
}

/// Register an upgraded socket and run its pumps until it is torn down.
pub async fn serve(mut socket: WebSocket, state: Arc<AppState>, identity: ConnectionIdentity) {
    let config = state.connection;
    let (handle, outbound) = ConnectionHandle::new(identity.clone(), config.outbound_capacity);
    let id = handle.id();
    if !state.hub.register(handle).await {
        tracing::info!(connection_id = %id, "Server shutting down, closing new connection");
        let _ = tokio::time::timeout(
            config.keepalive.write_wait,
            socket.send(Message::Close(None)),
        )
        .await;
        return;
    }
    tracing::info!(
        connection_id = %id,
        team_id = %identity.team_id,
        user_id = %identity.user_id,
        "Client connected"
    );

    let (sink, stream) = socket.split();
    let mut write_task = tokio::spawn(write_pump(sink, outbound, config.keepalive, id));
    let mut read_task = tokio::spawn(read_pump(stream, state.clone(), identity.clone(), id));

    tokio::select! {
        _ = &mut read_task => {
            // the buffer is closed by now; let the writer flush and send close
            if tokio::time::timeout(config.keepalive.write_wait, &mut write_task)
                .await
                .is_err()
            {
                write_task.abort();
            }
        }
        _ = &mut write_task => {
            read_task.abort();
            state.hub.unregister(id).await;
        }
    }

    tracing::info!(
        connection_id = %id,
        team_id = %identity.team_id,
        user_id = %identity.user_id,
        "Client disconnected"
    );
}

/// Read frames until the socket fails; then unregister.
async fn read_pump(
    mut stream: SplitStream<WebSocket>,
    state: Arc<AppState>,
    identity: ConnectionIdentity,
    id: ConnectionId,
) {
    let pong_wait = state.connection.keepalive.pong_wait;
    let relay = state.relay_frame_usecase();
    let mut deadline = Instant::now() + pong_wait;

    loop {
        let next = match tokio::time::timeout_at(deadline, stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!(connection_id = %id, "Pong deadline exceeded");
                break;
            }
        };
        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::debug!(connection_id = %id, "WebSocket read error: {}", e);
                break;
            }
            None => break,
        };

        let text = match &msg {
            Message::Text(text) => Some(text.as_str()),
            Message::Binary(bytes) => std::str::from_utf8(bytes).ok(),
            Message::Pong(_) => {
                deadline = Instant::now() + pong_wait;
                None
            }
            // pings are answered by the protocol layer
            Message::Ping(_) => None,
            Message::Close(_) => {
                tracing::debug!(connection_id = %id, "Client requested close");
                break;
            }
        };

        if let Some(text) = text {
            match relay.execute(&identity, id, text).await {
                Ok(delivered) => {
                    tracing::trace!(connection_id = %id, delivered, "Frame relayed");
                }
                Err(e) => {
                    tracing::debug!(connection_id = %id, "Discarding frame: {}", e);
                }
            }
        }
    }

    state.hub.unregister(id).await;
}

/// Drain the outbound buffer into the socket and keep the peer alive.
async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Payload>,
    keepalive: KeepaliveConfig,
    id: ConnectionId,
) {
    let mut ticker = tokio::time::interval_at(
        Instant::now() + keepalive.ping_period,
        keepalive.ping_period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            item = outbound.recv() => match item {
                Some(payload) => {
                    let message = Message::Text(payload.to_string().into());
                    if let Err(e) = send_with_deadline(&mut sink, message, keepalive.write_wait).await {
                        tracing::debug!(connection_id = %id, "WebSocket write failed: {}", e);
                        return;
                    }
                }
                None => {
                    // closed by the registry
                    let _ = send_with_deadline(&mut sink, Message::Close(None), keepalive.write_wait).await;
                    return;
                }
            },
            _ = ticker.tick() => {
                if let Err(e) = send_with_deadline(&mut sink, Message::Ping(Bytes::new()), keepalive.write_wait).await {
                    tracing::debug!(connection_id = %id, "Ping failed: {}", e);
                    return;
                }
            }
        }
    }
}

async fn send_with_deadline(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    deadline: Duration,
) -> Result<(), WriteError> {
    match tokio::time::timeout(deadline, sink.send(message)).await {
        Ok(result) => result.map_err(WriteError::from),
        Err(_) => Err(WriteError::Timeout),
    }
}
