//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use super::error::ValueObjectError;

/// Maximum message content length in bytes.
pub const MAX_MESSAGE_CONTENT_BYTES: usize = 4000;

/// Normalize a decimal identifier ("007" -> "7").
///
/// Identifiers travel as strings so that 64-bit values never lose precision
/// when a JSON consumer decodes numbers as doubles.
fn normalize_numeric(raw: &str) -> Option<String> {
    raw.trim().parse::<u64>().ok().map(|n| n.to_string())
}

/// User identifier value object.
///
/// String-normalized numeric identifier of a user, as verified out-of-band.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId from its decimal representation.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is empty or not a non-negative integer.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.trim().is_empty() {
            return Err(ValueObjectError::UserIdEmpty);
        }
        normalize_numeric(&id)
            .map(Self)
            .ok_or(ValueObjectError::UserIdNotNumeric(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team identifier value object.
///
/// The organizational scope a connection is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId from its decimal representation.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is empty or not a non-negative integer.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.trim().is_empty() {
            return Err(ValueObjectError::TeamIdEmpty);
        }
        normalize_numeric(&id)
            .map(Self)
            .ok_or(ValueObjectError::TeamIdNotNumeric(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TeamId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for TeamId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel identifier value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message content value object.
///
/// Represents the content of a chat message with validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// Create a new MessageContent.
    ///
    /// # Errors
    ///
    /// Returns an error when the content is empty (after trimming) or longer
    /// than [`MAX_MESSAGE_CONTENT_BYTES`].
    pub fn new(content: String) -> Result<Self, ValueObjectError> {
        if content.trim().is_empty() {
            return Err(ValueObjectError::MessageContentEmpty);
        }
        let len = content.len();
        if len > MAX_MESSAGE_CONTENT_BYTES {
            return Err(ValueObjectError::MessageContentTooLong {
                max: MAX_MESSAGE_CONTENT_BYTES,
                actual: len,
            });
        }
        Ok(Self(content))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle of one live connection.
///
/// Handles are allocated from a process-wide counter, so they are unique and
/// increase in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh handle.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_new_success() {
        // テスト項目: 数値文字列からユーザー ID を作成できる
        // given (前提条件):
        let id = "42".to_string();

        // when (操作):
        let result = UserId::new(id);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "42");
    }

    #[test]
    fn test_user_id_is_normalized() {
        // テスト項目: 先頭のゼロや空白は正規化される
        // given (前提条件):
        let id = " 0042 ".to_string();

        // when (操作):
        let result = UserId::new(id);

        // then (期待する結果):
        assert_eq!(result.unwrap(), UserId::from(42));
    }

    #[test]
    fn test_user_id_new_empty_fails() {
        // テスト項目: 空のユーザー ID は作成できない
        let result = UserId::new("".to_string());
        assert_eq!(result.unwrap_err(), ValueObjectError::UserIdEmpty);
    }

    #[test]
    fn test_team_id_new_not_numeric_fails() {
        // テスト項目: 数値でないチーム ID は作成できない
        // given (前提条件):
        let id = "team-7".to_string();

        // when (操作):
        let result = TeamId::new(id);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::TeamIdNotNumeric("team-7".to_string())
        );
    }

    #[test]
    fn test_team_id_negative_fails() {
        // テスト項目: 負数のチーム ID は作成できない
        let result = TeamId::new("-7".to_string());
        assert!(matches!(
            result.unwrap_err(),
            ValueObjectError::TeamIdNotNumeric(_)
        ));
    }

    #[test]
    fn test_message_content_new_too_long_fails() {
        // テスト項目: 上限を超えるメッセージ内容は作成できない
        // given (前提条件):
        let content = "a".repeat(MAX_MESSAGE_CONTENT_BYTES + 1);

        // when (操作):
        let result = MessageContent::new(content);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::MessageContentTooLong {
                max: MAX_MESSAGE_CONTENT_BYTES,
                actual: MAX_MESSAGE_CONTENT_BYTES + 1
            }
        );
    }

    #[test]
    fn test_message_content_whitespace_only_fails() {
        // テスト項目: 空白のみのメッセージ内容は作成できない
        let result = MessageContent::new("   ".to_string());
        assert_eq!(result.unwrap_err(), ValueObjectError::MessageContentEmpty);
    }

    #[test]
    fn test_connection_id_is_monotonic() {
        // テスト項目: 接続ハンドルは一意で、払い出し順に増加する
        // when (操作):
        let first = ConnectionId::next();
        let second = ConnectionId::next();

        // then (期待する結果):
        assert_ne!(first, second);
        assert!(first < second);
    }
}
