//! UseCase: クライアントから受信したフレームのチーム中継
//!
//! フレームをデコードし、`team_id` / `user_id` を接続に束縛された値で上書きして
//! 再エンコードし、チーム全体にブロードキャストします。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, ConnectionIdentity},
    infrastructure::{Hub, dto::websocket::Envelope},
};

use super::error::RelayError;

/// フレーム中継のユースケース
pub struct RelayFrameUseCase {
    hub: Arc<Hub>,
    /// 送信元の接続にもエコーするか
    echo_to_sender: bool,
}

impl RelayFrameUseCase {
    pub fn new(hub: Arc<Hub>, echo_to_sender: bool) -> Self {
        Self {
            hub,
            echo_to_sender,
        }
    }

    /// フレームを中継する
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - フレームを受け取った接続数
    /// * `Err(RelayError)` - デコード不能なフレーム（接続は維持される）
    pub async fn execute(
        &self,
        identity: &ConnectionIdentity,
        connection_id: ConnectionId,
        text: &str,
    ) -> Result<usize, RelayError> {
        let envelope = Envelope::decode(text)
            .map_err(|e| RelayError::Malformed(e.to_string()))?
            .stamp(identity);
        let payload = envelope
            .encode()
            .map_err(|e| RelayError::Encode(e.to_string()))?;

        let delivered = if self.echo_to_sender {
            self.hub.broadcast_to_team(&identity.team_id, payload).await
        } else {
            self.hub
                .broadcast_to_team_except(&identity.team_id, payload, connection_id)
                .await
        };
        Ok(delivered)
    }
}
