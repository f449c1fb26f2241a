//! Offline delivery path.

use async_trait::async_trait;

use crate::domain::{OfflineNotifier, StoredMessage, UserId};

/// Logs the push notification that would be sent to an offline recipient.
///
/// Push delivery itself is not implemented.
#[derive(Debug, Default)]
pub struct LoggingOfflineNotifier;

#[async_trait]
impl OfflineNotifier for LoggingOfflineNotifier {
    async fn notify_offline(&self, user_id: &UserId, message: &StoredMessage) {
        tracing::info!(
            user_id = %user_id,
            team_id = %message.team_id,
            message_id = message.id,
            "User is offline, would send push notification"
        );
    }
}
