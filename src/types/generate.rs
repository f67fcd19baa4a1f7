//! Generate endpoint wire types

use serde::Deserialize;

/// One decoded line of the `/api/generate` response stream
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponseLine {
    /// Model that produced this fragment
    pub model: Option<String>,

    /// Server-side creation timestamp (RFC 3339)
    pub created_at: Option<String>,

    /// Generated text fragment; empty on the terminal line
    #[serde(default)]
    pub response: String,

    /// True on the terminal line of the stream
    #[serde(default)]
    pub done: bool,

    /// Conversation context tokens, returned on the terminal line
    pub context: Option<Vec<i64>>,

    pub total_duration: Option<u64>,
    pub load_duration: Option<u64>,
    pub prompt_eval_count: Option<u64>,
    pub prompt_eval_duration: Option<u64>,
    pub eval_count: Option<u64>,
    pub eval_duration: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fragment_line() {
        let line: GenerateResponseLine =
            serde_json::from_str(r#"{"model":"llama3","response":"Hel","done":false}"#).unwrap();
        assert_eq!(line.response, "Hel");
        assert!(!line.done);
    }

    #[test]
    fn test_decode_terminal_line() {
        let line: GenerateResponseLine = serde_json::from_str(
            r#"{"response":"","done":true,"context":[1,2,3],"total_duration":9000}"#,
        )
        .unwrap();
        assert!(line.done);
        assert_eq!(line.context, Some(vec![1, 2, 3]));
    }
}
