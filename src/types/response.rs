//! Response types shared by every endpoint

use serde::Deserialize;

/// Error payload returned by the server on failed requests
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error detail
    pub error: String,
}

/// Final result of a synchronous call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    /// Trimmed concatenation of the streamed content fragments
    pub response: String,

    /// Wall time from request send to full stream consumption
    pub response_time_ms: u64,

    /// HTTP status code observed on the response
    pub http_status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_payload() {
        let err: ErrorResponse =
            serde_json::from_str(r#"{"error":"model \"llama9\" not found"}"#).unwrap();
        assert_eq!(err.error, "model \"llama9\" not found");
    }
}
