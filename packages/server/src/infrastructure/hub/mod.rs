//! Live connection registry.
//!
//! [`Hub`] is the only component allowed to mutate the presence index. All
//! traversal and mutation happens under one reader/writer lock; every enqueue
//! performed under that lock is a non-blocking `try_send`, so a slow client
//! can never stall other registry operations.

mod index;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc::error::TrySendError};

pub use index::{ConnectionHandle, PresenceIndex};

use crate::domain::{ConnectionId, ConnectionRegistry, Payload, TeamId, UserId};

/// Process-wide directory of online connections
#[derive(Debug, Default)]
pub struct Hub {
    index: RwLock<PresenceIndex>,
    /// Set by [`Hub::shutdown`]; only read or written under the index write lock
    closed: AtomicBool,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection whose identity is already bound.
    ///
    /// A second connection for the same (team, user) is added next to the
    /// first one, never in place of it. Once the hub is shut down the handle
    /// is dropped instead, closing its buffer, and `false` is returned.
    pub async fn register(&self, handle: ConnectionHandle) -> bool {
        let id = handle.id();
        let identity = handle.identity().clone();
        {
            let mut index = self.index.write().await;
            if self.closed.load(Ordering::Acquire) {
                tracing::debug!(connection_id = %id, "Registry closed, connection rejected");
                return false;
            }
            index.insert(handle);
        }
        tracing::debug!(
            connection_id = %id,
            team_id = %identity.team_id,
            user_id = %identity.user_id,
            "Connection registered"
        );
        true
    }

    /// Remove a connection from every index and close its outbound buffer.
    ///
    /// Unregistering a connection that is not present is a no-op; the return
    /// value tells whether anything was removed.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.index.write().await.remove(id);
        match removed {
            Some(handle) => {
                let identity = handle.identity();
                tracing::debug!(
                    connection_id = %id,
                    team_id = %identity.team_id,
                    user_id = %identity.user_id,
                    "Connection unregistered"
                );
                // dropping the handle drops the last sender, closing the buffer
                drop(handle);
                true
            }
            None => false,
        }
    }

    /// Enqueue `payload` on every live connection.
    ///
    /// A connection whose buffer is full is dropped. Returns the number of
    /// connections that accepted the payload.
    pub async fn broadcast_to_all(&self, payload: Payload) -> usize {
        let (delivered, dead) = {
            let index = self.index.read().await;
            Self::deliver_or_collect_dead(index.all(), &payload, None)
        };
        self.evict(dead).await;
        delivered
    }

    /// Enqueue `payload` on every connection indexed under `team_id`.
    ///
    /// Same drop-if-full policy as [`Hub::broadcast_to_all`].
    pub async fn broadcast_to_team(&self, team_id: &TeamId, payload: Payload) -> usize {
        self.broadcast_to_team_inner(team_id, payload, None).await
    }

    /// Like [`Hub::broadcast_to_team`] but skips one connection (no local echo).
    pub async fn broadcast_to_team_except(
        &self,
        team_id: &TeamId,
        payload: Payload,
        skip: ConnectionId,
    ) -> usize {
        self.broadcast_to_team_inner(team_id, payload, Some(skip))
            .await
    }

    async fn broadcast_to_team_inner(
        &self,
        team_id: &TeamId,
        payload: Payload,
        skip: Option<ConnectionId>,
    ) -> usize {
        let (delivered, dead) = {
            let index = self.index.read().await;
            Self::deliver_or_collect_dead(index.team_connections(team_id), &payload, skip)
        };
        self.evict(dead).await;
        delivered
    }

    /// True iff at least one live connection is indexed for (team, user).
    pub async fn is_user_connected(&self, team_id: &TeamId, user_id: &UserId) -> bool {
        self.index.read().await.is_user_connected(team_id, user_id)
    }

    /// Enqueue `payload` on every connection of (team, user).
    ///
    /// A full buffer only skips that connection; nothing is dropped. Returns
    /// true iff at least one connection accepted the payload.
    pub async fn send_message_to_user(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        payload: Payload,
    ) -> bool {
        let index = self.index.read().await;
        let mut delivered = false;
        for handle in index.user_connections(team_id, user_id) {
            match handle.try_enqueue(payload.clone()) {
                Ok(()) => delivered = true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %handle.id(),
                        team_id = %team_id,
                        user_id = %user_id,
                        "Outbound buffer full, message skipped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(connection_id = %handle.id(), "Outbound buffer closed");
                }
            }
        }
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn team_count(&self) -> usize {
        self.index.read().await.team_count()
    }

    /// Whether both indexes agree; used by diagnostics and tests.
    pub async fn is_consistent(&self) -> bool {
        self.index.read().await.is_consistent()
    }

    /// Remove every connection, closing every outbound buffer, and refuse
    /// later registrations.
    ///
    /// Each outbound pump then writes a close frame and exits.
    pub async fn shutdown(&self) -> usize {
        let drained = {
            let mut index = self.index.write().await;
            self.closed.store(true, Ordering::Release);
            index.drain()
        };
        let count = drained.len();
        drop(drained);
        tracing::info!(connections = count, "Registry drained");
        count
    }

    fn deliver_or_collect_dead<'a>(
        handles: impl Iterator<Item = &'a ConnectionHandle>,
        payload: &Payload,
        skip: Option<ConnectionId>,
    ) -> (usize, Vec<ConnectionId>) {
        let mut delivered = 0;
        let mut dead = Vec::new();
        for handle in handles {
            if Some(handle.id()) == skip {
                continue;
            }
            match handle.try_enqueue(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    if matches!(err, TrySendError::Full(_)) {
                        tracing::warn!(
                            connection_id = %handle.id(),
                            team_id = %handle.identity().team_id,
                            user_id = %handle.identity().user_id,
                            "Outbound buffer full, dropping connection"
                        );
                    }
                    dead.push(handle.id());
                }
            }
        }
        (delivered, dead)
    }

    async fn evict(&self, dead: Vec<ConnectionId>) {
        if dead.is_empty() {
            return;
        }
        let mut index = self.index.write().await;
        for id in dead {
            // may already be gone if its own pump unregistered in between
            index.remove(id);
        }
    }
}

#[async_trait]
impl ConnectionRegistry for Hub {
    async fn is_user_connected(&self, team_id: &TeamId, user_id: &UserId) -> bool {
        Hub::is_user_connected(self, team_id, user_id).await
    }

    async fn send_message_to_user(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
        payload: Payload,
    ) -> bool {
        Hub::send_message_to_user(self, team_id, user_id, payload).await
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::ConnectionIdentity;

    fn identity(team: &str, user: &str) -> ConnectionIdentity {
        ConnectionIdentity::new(
            UserId::new(user.to_string()).unwrap(),
            TeamId::new(team.to_string()).unwrap(),
        )
    }

    async fn connect(
        hub: &Hub,
        team: &str,
        user: &str,
        capacity: usize,
    ) -> (ConnectionId, mpsc::Receiver<Payload>) {
        let (handle, rx) = ConnectionHandle::new(identity(team, user), capacity);
        let id = handle.id();
        hub.register(handle).await;
        (id, rx)
    }

    fn payload(text: &str) -> Payload {
        Payload::from(text)
    }

    #[tokio::test]
    async fn test_presence_follows_lifecycle() {
        // テスト項目: 登録前は false、登録後は true、全接続の登録解除後は false
        // given (前提条件):
        let hub = Hub::new();
        let team = TeamId::from(7);
        let user = UserId::from(42);
        assert!(!hub.is_user_connected(&team, &user).await);

        // when (操作):
        let (first, _rx1) = connect(&hub, "7", "42", 8).await;
        let (second, _rx2) = connect(&hub, "7", "42", 8).await;

        // then (期待する結果):
        assert!(hub.is_user_connected(&team, &user).await);
        hub.unregister(first).await;
        assert!(hub.is_user_connected(&team, &user).await);
        hub.unregister(second).await;
        assert!(!hub.is_user_connected(&team, &user).await);
        assert_eq!(hub.team_count().await, 0);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: 二重の登録解除はパニックもエラーも起こさない
        // given (前提条件):
        let hub = Hub::new();
        let (id, mut rx) = connect(&hub, "7", "42", 8).await;

        // when (操作):
        let first = hub.unregister(id).await;
        let second = hub.unregister(id).await;

        // then (期待する結果): 二回目は何もしない。バッファは閉じている
        assert!(first);
        assert!(!second);
        assert_eq!(rx.recv().await, None);
        assert!(hub.is_consistent().await);
    }

    #[tokio::test]
    async fn test_send_message_to_user_reaches_every_device() {
        // テスト項目: 同一ユーザーの全デバイスにメッセージが届き true が返る
        // given (前提条件):
        let hub = Hub::new();
        let (_a, mut rx_a) = connect(&hub, "7", "42", 8).await;
        let (_b, mut rx_b) = connect(&hub, "7", "42", 8).await;

        // when (操作):
        let delivered = hub
            .send_message_to_user(&TeamId::from(7), &UserId::from(42), payload("hello"))
            .await;

        // then (期待する結果):
        assert!(delivered);
        assert_eq!(rx_a.recv().await.as_deref(), Some("hello"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_send_message_to_unknown_user_returns_false() {
        // テスト項目: 接続のないユーザーへの送信は false
        let hub = Hub::new();
        let delivered = hub
            .send_message_to_user(&TeamId::from(7), &UserId::from(1), payload("x"))
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_full_buffer_does_not_block_directed_send() {
        // テスト項目: バッファ満杯でも送信はブロックせず、唯一の接続なら false を返す
        // given (前提条件):
        let hub = Hub::new();
        let (id, _rx) = connect(&hub, "7", "42", 1).await;
        assert!(
            hub.send_message_to_user(&TeamId::from(7), &UserId::from(42), payload("first"))
                .await
        );

        // when (操作):
        let result = tokio::time::timeout(
            Duration::from_secs(1),
            hub.send_message_to_user(&TeamId::from(7), &UserId::from(42), payload("second")),
        )
        .await;

        // then (期待する結果): タイムアウトせず false。接続は残る
        assert_eq!(result, Ok(false));
        assert_eq!(hub.connection_count().await, 1);
        assert!(hub.unregister(id).await);
    }

    #[tokio::test]
    async fn test_team_broadcast_is_isolated() {
        // テスト項目: チーム T1 へのブロードキャストは T2 の接続に届かない
        // given (前提条件):
        let hub = Hub::new();
        let (_a, mut rx_a) = connect(&hub, "1", "10", 8).await;
        let (_b, mut rx_b) = connect(&hub, "1", "11", 8).await;
        let (_c, mut rx_c) = connect(&hub, "2", "10", 8).await;

        // when (操作):
        let delivered = hub.broadcast_to_team(&TeamId::from(1), payload("t1")).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert_eq!(rx_a.recv().await.as_deref(), Some("t1"));
        assert_eq!(rx_b.recv().await.as_deref(), Some("t1"));
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_team_broadcast_except_skips_sender() {
        // テスト項目: エコー無効時は送信元の接続を除いてブロードキャストする
        let hub = Hub::new();
        let (sender, mut rx_sender) = connect(&hub, "1", "10", 8).await;
        let (_other, mut rx_other) = connect(&hub, "1", "11", 8).await;

        let delivered = hub
            .broadcast_to_team_except(&TeamId::from(1), payload("hi"), sender)
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(rx_other.recv().await.as_deref(), Some("hi"));
        assert!(rx_sender.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_drops_saturated_connection_from_both_indexes() {
        // テスト項目: 全体ブロードキャストでバッファ満杯の接続は両方の索引から削除される
        // given (前提条件):
        let hub = Hub::new();
        let (_slow, mut rx_slow) = connect(&hub, "7", "42", 1).await;
        let (_fast, mut rx_fast) = connect(&hub, "7", "99", 8).await;
        hub.broadcast_to_all(payload("one")).await;

        // when (操作):
        let delivered = hub.broadcast_to_all(payload("two")).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert!(!hub.is_user_connected(&TeamId::from(7), &UserId::from(42)).await);
        assert!(hub.is_user_connected(&TeamId::from(7), &UserId::from(99)).await);
        assert!(hub.is_consistent().await);

        // 満杯だった接続は残りを読み切った後に閉じられる
        assert_eq!(rx_slow.recv().await.as_deref(), Some("one"));
        assert_eq!(rx_slow.recv().await, None);
        assert_eq!(rx_fast.recv().await.as_deref(), Some("one"));
        assert_eq!(rx_fast.recv().await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_team_broadcast_drops_saturated_connection() {
        // テスト項目: チームブロードキャストでも満杯の接続は切断扱い
        let hub = Hub::new();
        let (_slow, _rx_slow) = connect(&hub, "7", "42", 1).await;
        hub.broadcast_to_team(&TeamId::from(7), payload("one")).await;

        let delivered = hub.broadcast_to_team(&TeamId::from(7), payload("two")).await;

        assert_eq!(delivered, 0);
        assert_eq!(hub.connection_count().await, 0);
        assert!(hub.is_consistent().await);
    }

    #[tokio::test]
    async fn test_broadcast_evicts_connection_whose_pump_is_gone() {
        // テスト項目: 受信側が既に破棄された接続はブロードキャスト時に削除される
        let hub = Hub::new();
        let (_id, rx) = connect(&hub, "7", "42", 8).await;
        drop(rx);

        let delivered = hub.broadcast_to_all(payload("ping")).await;

        assert_eq!(delivered, 0);
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_buffer() {
        // テスト項目: shutdown で全接続が削除され、全バッファが閉じられる
        let hub = Hub::new();
        let (_a, mut rx_a) = connect(&hub, "1", "10", 8).await;
        let (_b, mut rx_b) = connect(&hub, "2", "20", 8).await;

        let drained = hub.shutdown().await;

        assert_eq!(drained, 2);
        assert_eq!(rx_a.recv().await, None);
        assert_eq!(rx_b.recv().await, None);
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_register_after_shutdown_is_rejected() {
        // テスト項目: shutdown 後に登録しようとした接続は拒否され、バッファが閉じる
        // given (前提条件):
        let hub = Hub::new();
        hub.shutdown().await;

        // when (操作): アップグレード処理中だった接続が遅れて登録される
        let (handle, mut rx) = ConnectionHandle::new(identity("7", "42"), 8);
        let registered = hub.register(handle).await;

        // then (期待する結果):
        assert!(!registered);
        assert_eq!(rx.recv().await, None);
        assert_eq!(hub.connection_count().await, 0);
        assert!(
            !hub.is_user_connected(&TeamId::from(7), &UserId::from(42))
                .await
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_indexes_stay_consistent_under_concurrency() {
        // テスト項目: 並行な登録・登録解除・配信の後でも両索引が一致する
        // given (前提条件):
        let hub = Arc::new(Hub::new());
        let mut tasks = Vec::new();

        // when (操作): 64 タスクが登録し、半数は登録解除する
        for i in 0..64u64 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                let team = (i % 4).to_string();
                let user = (i % 8).to_string();
                let (handle, rx) = ConnectionHandle::new(identity(&team, &user), 2);
                let id = handle.id();
                hub.register(handle).await;
                hub.broadcast_to_team(&TeamId::from(i % 4), Payload::from("x"))
                    .await;
                if i % 2 == 0 {
                    hub.unregister(id).await;
                    hub.unregister(id).await;
                }
                rx
            }));
        }
        let mut receivers = Vec::new();
        for task in tasks {
            receivers.push(task.await.unwrap());
        }

        // then (期待する結果):
        assert!(hub.is_consistent().await);
        assert!(hub.connection_count().await <= 32);
        drop(receivers);
    }
}
