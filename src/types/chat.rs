//! Chat endpoint wire types
//!
//! Covers the message shape sent to the server and the per-line shape
//! streamed back from `/api/chat`.

use serde::{Deserialize, Serialize};

/// A single chat turn exchanged with the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Speaker role: "system", "user", or "assistant"
    pub role: String,

    /// Text content of the turn
    pub content: String,

    /// Base64-encoded images attached to the turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ChatMessage {
    /// Create a plain text message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            images: None,
        }
    }
}

/// One decoded line of the chat response stream
///
/// Timing and token-count fields only appear on the terminal line; they are
/// forwarded to stream observers untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseLine {
    /// Model that produced this fragment
    pub model: Option<String>,

    /// Server-side creation timestamp (RFC 3339)
    pub created_at: Option<String>,

    /// Message fragment; missing or null under heavy server load
    pub message: Option<ChatMessage>,

    /// True on the terminal line of the stream
    #[serde(default)]
    pub done: bool,

    pub total_duration: Option<u64>,
    pub load_duration: Option<u64>,
    pub prompt_eval_count: Option<u64>,
    pub prompt_eval_duration: Option<u64>,
    pub eval_count: Option<u64>,
    pub eval_duration: Option<u64>,
}

impl ChatResponseLine {
    /// Content text of the embedded message, if any
    pub fn content(&self) -> Option<&str> {
        self.message.as_ref().map(|message| message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_content_line() {
        let line: ChatResponseLine = serde_json::from_str(
            r#"{"model":"llama3","created_at":"2024-05-01T10:00:00Z","message":{"role":"assistant","content":"Hel"},"done":false}"#,
        )
        .unwrap();

        assert_eq!(line.content(), Some("Hel"));
        assert!(!line.done);
    }

    #[test]
    fn test_decode_terminal_line_with_stats() {
        let line: ChatResponseLine = serde_json::from_str(
            r#"{"message":{"role":"assistant","content":""},"done":true,"total_duration":5000,"eval_count":42}"#,
        )
        .unwrap();

        assert!(line.done);
        assert_eq!(line.eval_count, Some(42));
    }

    #[test]
    fn test_decode_null_message_tolerated() {
        let line: ChatResponseLine =
            serde_json::from_str(r#"{"message":null,"done":false}"#).unwrap();
        assert!(line.content().is_none());

        let line: ChatResponseLine = serde_json::from_str(r#"{"done":false}"#).unwrap();
        assert!(line.content().is_none());
    }

    #[test]
    fn test_serialize_message_skips_absent_images() {
        let json = serde_json::to_string(&ChatMessage::new("user", "hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
