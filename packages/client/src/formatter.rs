//! Rendering of received envelopes.

use hubbub_server::infrastructure::dto::websocket::Envelope;
use hubbub_shared::time::millis_to_rfc3339;

/// `[team/user] content`, prefixed with the channel and time for stored messages.
pub fn format_envelope(envelope: &Envelope) -> String {
    let scope = format!("[{}/{}]", envelope.team_id, envelope.user_id);
    match (&envelope.channel_id, envelope.created_at) {
        (Some(channel_id), Some(created_at)) => format!(
            "{} #{} {} {}",
            millis_to_rfc3339(created_at),
            channel_id,
            scope,
            envelope.content
        ),
        _ => format!("{} {}", scope, envelope.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_relayed_frame() {
        // テスト項目: リレーされたフレームは [team/user] content 形式
        // given (前提条件):
        let envelope =
            Envelope::decode(r#"{"type":"message","content":"hi","team_id":"7","user_id":"42"}"#)
                .unwrap();

        // when (操作):
        let line = format_envelope(&envelope);

        // then (期待する結果):
        assert_eq!(line, "[7/42] hi");
    }

    #[test]
    fn test_format_stored_message() {
        // テスト項目: 保存済みメッセージはチャンネルと時刻付きで表示される
        // given (前提条件):
        let envelope = Envelope::decode(
            r#"{"type":"message","content":"hi","team_id":"7","user_id":"42","channel_id":"1","message_id":"3","created_at":0}"#,
        )
        .unwrap();

        // when (操作):
        let line = format_envelope(&envelope);

        // then (期待する結果):
        assert_eq!(line, "1970-01-01T00:00:00+00:00 #1 [7/42] hi");
    }
}
