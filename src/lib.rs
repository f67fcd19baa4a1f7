//! Streaming HTTP client core for local Ollama model servers
//!
//! Issues POST requests against a model server and consumes its
//! newline-delimited streaming JSON responses, either blocking until the
//! full answer is assembled or delivering fragments live from a
//! background task.
//!
//! # Architecture
//!
//! - **Endpoint callers**: shared request loop with per-endpoint decode
//!   strategies (chat, generate)
//! - **Stream observer**: per-call notification sink for live chat fragments
//! - **Async result streamer**: background task publishing into a
//!   single-writer/multi-reader fragment stream

pub mod auth;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-export commonly used types
pub use auth::BasicAuth;
pub use errors::{OllamaError, Result};
pub use streaming::{
    AsyncResultStreamer, ChatEndpointCaller, GenerateEndpointCaller, ResultStreamReader,
    StreamHandler, DEFAULT_OLLAMA_URL,
};
pub use types::{
    CallResult, ChatMessage, ChatResponseLine, GenerateResponseLine, RequestBody,
    StreamableRequest,
};
