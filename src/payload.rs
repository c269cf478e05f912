//! Plaintext payload classification.
//!
//! After AEAD success the plaintext is one of three shapes:
//! plain UTF-8 text, a JSON object with a `text` field and optional
//! `replyTo` context, or the `{"type":"key-publish"}` marker a client
//! self-sends when publishing its encryption key. The marker is not a user
//! message and collapses to `None`.

use serde_json::{json, Value};

use crate::error::{AlgoChatError, Result};
use crate::types::DecryptedContent;

/// Payload a client self-encrypts when publishing its encryption key.
pub const KEY_PUBLISH_PAYLOAD: &str = r#"{"type":"key-publish"}"#;

/// Maximum encoded size of a reply preview in bytes.
pub const REPLY_PREVIEW_MAX_BYTES: usize = 80;

/// Byte budget for the preview text when the ellipsis is appended.
const REPLY_PREVIEW_TRUNCATED_BYTES: usize = 77;

/// Whether decrypted bytes are a key-publish marker.
pub fn is_key_publish(data: &[u8]) -> bool {
    if data.first() != Some(&b'{') {
        return false;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return false;
    };
    value.get("type").and_then(Value::as_str) == Some("key-publish")
}

/// Classify decrypted plaintext.
///
/// Returns `None` for a key-publish marker. JSON objects carrying a string
/// `text` field yield structured content with any `replyTo` context; all
/// other inputs are treated as plain text. Non-UTF-8 plaintext cannot come
/// out of a correct sender and maps to [`AlgoChatError::DecryptionFailed`].
pub fn parse_payload(data: &[u8]) -> Result<Option<DecryptedContent>> {
    let text = std::str::from_utf8(data).map_err(|_| AlgoChatError::DecryptionFailed)?;

    if !text.starts_with('{') {
        return Ok(Some(DecryptedContent::new(text)));
    }

    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return Ok(Some(DecryptedContent::new(text)));
    };

    if value.get("type").and_then(Value::as_str) == Some("key-publish") {
        return Ok(None);
    }

    let Some(message_text) = value.get("text").and_then(Value::as_str) else {
        return Ok(Some(DecryptedContent::new(text)));
    };

    let reply_to = value.get("replyTo");
    Ok(Some(DecryptedContent {
        text: message_text.to_string(),
        reply_to_id: reply_to
            .and_then(|r| r.get("txid"))
            .and_then(Value::as_str)
            .map(str::to_string),
        reply_to_preview: reply_to
            .and_then(|r| r.get("preview"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }))
}

/// Build the outbound payload for a message.
///
/// Plain text goes out as-is. With a reply context the payload becomes a
/// JSON object; the preview is truncated before embedding so the receiver
/// never has to.
pub fn build_payload(text: &str, reply_to: Option<(&str, &str)>) -> String {
    match reply_to {
        None => text.to_string(),
        Some((txid, preview)) => json!({
            "text": text,
            "replyTo": {
                "txid": txid,
                "preview": truncate_preview(preview),
            },
        })
        .to_string(),
    }
}

/// Truncate a reply preview to at most [`REPLY_PREVIEW_MAX_BYTES`] bytes.
///
/// Long previews keep at most 77 bytes, cut back to a char boundary, with a
/// trailing ellipsis.
pub fn truncate_preview(text: &str) -> String {
    if text.len() <= REPLY_PREVIEW_MAX_BYTES {
        return text.to_string();
    }

    let mut cut = REPLY_PREVIEW_TRUNCATED_BYTES;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_publish_detection() {
        assert!(is_key_publish(KEY_PUBLISH_PAYLOAD.as_bytes()));
        assert!(is_key_publish(br#"{"type":"key-publish","extra":1}"#));
        assert!(!is_key_publish(br#"{"type":"other"}"#));
        assert!(!is_key_publish(b"plain text"));
        assert!(!is_key_publish(b""));
        assert!(!is_key_publish(&[0xff, 0xfe]));
    }

    #[test]
    fn test_parse_key_publish_is_no_message() {
        let result = parse_payload(KEY_PUBLISH_PAYLOAD.as_bytes()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parse_plain_text() {
        let content = parse_payload(b"Hello there").unwrap().unwrap();
        assert_eq!(content.text, "Hello there");
        assert!(content.reply_to_id.is_none());
    }

    #[test]
    fn test_parse_structured_reply() {
        let payload = br#"{"text":"sure!","replyTo":{"txid":"TX123","preview":"lunch?"}}"#;
        let content = parse_payload(payload).unwrap().unwrap();
        assert_eq!(content.text, "sure!");
        assert_eq!(content.reply_to_id.as_deref(), Some("TX123"));
        assert_eq!(content.reply_to_preview.as_deref(), Some("lunch?"));
    }

    #[test]
    fn test_parse_json_without_text_field_is_literal() {
        let payload = br#"{"key": "value", "num": 42}"#;
        let content = parse_payload(payload).unwrap().unwrap();
        assert_eq!(content.text, r#"{"key": "value", "num": 42}"#);
    }

    #[test]
    fn test_parse_malformed_json_is_literal() {
        let content = parse_payload(b"{not json").unwrap().unwrap();
        assert_eq!(content.text, "{not json");
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let result = parse_payload(&[0x01, 0xff, 0xfe]);
        assert!(matches!(result, Err(AlgoChatError::DecryptionFailed)));
    }

    #[test]
    fn test_build_plain_payload() {
        assert_eq!(build_payload("hi", None), "hi");
    }

    #[test]
    fn test_build_reply_roundtrip() {
        let payload = build_payload("sounds good", Some(("TXABC", "want to meet at noon?")));
        let content = parse_payload(payload.as_bytes()).unwrap().unwrap();
        assert_eq!(content.text, "sounds good");
        assert_eq!(content.reply_to_id.as_deref(), Some("TXABC"));
        assert_eq!(content.reply_to_preview.as_deref(), Some("want to meet at noon?"));
    }

    #[test]
    fn test_preview_short_untouched() {
        assert_eq!(truncate_preview("short"), "short");
        let exactly_80 = "a".repeat(80);
        assert_eq!(truncate_preview(&exactly_80), exactly_80);
    }

    #[test]
    fn test_preview_truncated_to_budget() {
        let long = "a".repeat(200);
        let preview = truncate_preview(&long);
        assert_eq!(preview.len(), REPLY_PREVIEW_MAX_BYTES);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_preview_truncation_respects_char_boundaries() {
        // 100 three-byte chars; byte 77 falls mid-character.
        let long = "あ".repeat(100);
        let preview = truncate_preview(&long);
        assert!(preview.len() <= REPLY_PREVIEW_MAX_BYTES);
        assert!(preview.ends_with('…'));
        assert!(preview.chars().rev().skip(1).all(|c| c == 'あ'));
    }
}
