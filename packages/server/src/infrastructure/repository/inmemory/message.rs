//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! チャンネル（所属チームとメンバー）とメッセージログを HashMap / Vec で保持します。
//! 本番ではリレーショナル DB に置き換わる前提の実装です。

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{
    ChannelId, ChannelMembership, MessageRepository, NewMessage, RepositoryError, StoredMessage,
    TeamId, UserId,
};

/// One channel entry of the JSON seed file
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSeed {
    pub channel_id: u64,
    pub team_id: u64,
    pub members: Vec<u64>,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
struct ChannelRecord {
    team_id: TeamId,
    members: BTreeSet<UserId>,
}

#[derive(Debug, Default)]
struct Store {
    channels: HashMap<ChannelId, ChannelRecord>,
    messages: Vec<StoredMessage>,
}

/// インメモリ Message Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    store: Mutex<Store>,
}

impl InMemoryMessageRepository {
    /// 空の InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// シードからチャンネルを登録した InMemoryMessageRepository を作成
    pub fn with_channels(seeds: impl IntoIterator<Item = ChannelSeed>) -> Self {
        let channels = seeds
            .into_iter()
            .map(|seed| {
                (
                    ChannelId::new(seed.channel_id),
                    ChannelRecord {
                        team_id: TeamId::from(seed.team_id),
                        members: seed.members.into_iter().map(UserId::from).collect(),
                    },
                )
            })
            .collect();
        Self {
            store: Mutex::new(Store {
                channels,
                messages: Vec::new(),
            }),
        }
    }

    /// JSON シードファイルから作成
    pub fn from_seed_file(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        let seeds: Vec<ChannelSeed> = serde_json::from_str(&raw)?;
        tracing::info!(channels = seeds.len(), path = %path.display(), "Loaded channel seed");
        Ok(Self::with_channels(seeds))
    }

    /// 保存済みメッセージ数
    pub async fn message_count(&self) -> usize {
        self.store.lock().await.messages.len()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn find_membership(
        &self,
        channel_id: ChannelId,
        user_id: &UserId,
    ) -> Result<Option<ChannelMembership>, RepositoryError> {
        let store = self.store.lock().await;
        let channel = store
            .channels
            .get(&channel_id)
            .ok_or(RepositoryError::ChannelNotFound(channel_id.value()))?;

        Ok(channel
            .members
            .contains(user_id)
            .then(|| ChannelMembership {
                channel_id,
                team_id: channel.team_id.clone(),
                user_id: user_id.clone(),
            }))
    }

    async fn save_message(&self, message: NewMessage) -> Result<StoredMessage, RepositoryError> {
        let mut store = self.store.lock().await;
        if !store.channels.contains_key(&message.channel_id) {
            return Err(RepositoryError::ChannelNotFound(message.channel_id.value()));
        }
        let id = store.messages.len() as u64 + 1;
        let stored = StoredMessage::from_new(id, message);
        store.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_channel_members(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, RepositoryError> {
        let store = self.store.lock().await;
        store
            .channels
            .get(&channel_id)
            .map(|channel| channel.members.iter().cloned().collect())
            .ok_or(RepositoryError::ChannelNotFound(channel_id.value()))
    }
}
