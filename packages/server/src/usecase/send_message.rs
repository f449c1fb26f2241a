//! UseCase: メッセージ送信処理（永続化とライブ配信）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 保存 → メンバー解決 → オンライン判定 → 配信 / オフライン通知 の流れ
//!
//! ### なぜこのテストが必要か
//! - 保存前にライブ配信されてはならない（保存してから配信する順序の保証）
//! - 配信失敗は送信者へのエラーにならない（ベストエフォート）ことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：オンラインとオフラインが混在するメンバー
//! - 異常系：メンバーでない送信者、存在しないチャンネル
//! - エッジケース：全バッファが満杯で配信に失敗するユーザー

use std::sync::Arc;

use hubbub_shared::time::now_millis;

use crate::{
    domain::{
        ChannelId, ConnectionRegistry, MessageContent, MessageRepository, NewMessage,
        OfflineNotifier, StoredMessage, Timestamp, UserId,
    },
    infrastructure::dto::websocket::Envelope,
};

use super::error::SendMessageError;

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Members reached on at least one connection
    pub delivered: usize,
    /// Members online whose every buffer was full
    pub failed: usize,
    /// Members handed to the offline notifier
    pub offline: usize,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn MessageRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    notifier: Arc<dyn OfflineNotifier>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        notifier: Arc<dyn OfflineNotifier>,
    ) -> Self {
        Self {
            repository,
            registry,
            notifier,
        }
    }

    /// メッセージ送信を実行
    ///
    /// メッセージは必ず保存されてから配信されます。配信結果は戻り値に影響しません。
    ///
    /// # Returns
    ///
    /// * `Ok(StoredMessage)` - 保存されたメッセージ
    /// * `Err(SendMessageError)` - 送信者がメンバーでない、または保存に失敗
    pub async fn execute(
        &self,
        sender: UserId,
        channel_id: ChannelId,
        content: MessageContent,
    ) -> Result<StoredMessage, SendMessageError> {
        // 1. 送信者がチャンネルのメンバーか確認し、チームを解決
        let membership = self
            .repository
            .find_membership(channel_id, &sender)
            .await?
            .ok_or(SendMessageError::NotMember)?;

        // 2. 保存
        let stored = self
            .repository
            .save_message(NewMessage {
                channel_id,
                team_id: membership.team_id,
                user_id: sender,
                content,
                created_at: Timestamp::new(now_millis()),
            })
            .await?;

        // 3. メンバーへ配信
        let report = self.fan_out(&stored).await;
        tracing::debug!(
            message_id = stored.id,
            channel_id = %stored.channel_id,
            delivered = report.delivered,
            failed = report.failed,
            offline = report.offline,
            "Fan-out finished"
        );

        Ok(stored)
    }

    /// 保存済みメッセージをチャンネルの全メンバーへ配信する
    ///
    /// 送信者自身も対象（他デバイスへの同期）。失敗はログのみでリトライしない。
    pub async fn fan_out(&self, message: &StoredMessage) -> FanOutReport {
        let mut report = FanOutReport::default();

        let members = match self.repository.list_channel_members(message.channel_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::error!(channel_id = %message.channel_id, "Failed to list members: {}", e);
                return report;
            }
        };

        let payload = match Envelope::from_stored(message).encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(message_id = message.id, "Failed to encode message: {}", e);
                return report;
            }
        };

        for member in members {
            if self
                .registry
                .is_user_connected(&message.team_id, &member)
                .await
            {
                if self
                    .registry
                    .send_message_to_user(&message.team_id, &member, payload.clone())
                    .await
                {
                    report.delivered += 1;
                } else {
                    report.failed += 1;
                    tracing::warn!(
                        user_id = %member,
                        team_id = %message.team_id,
                        "Failed to send message to connected user"
                    );
                }
            } else {
                report.offline += 1;
                self.notifier.notify_offline(&member, message).await;
            }
        }

        report
    }
}
