//! Streaming protocol handling
//!
//! Endpoint callers, line-level decoding strategies, stream observation,
//! and the background result streamer.

pub mod async_result;
pub mod client;
pub mod observer;
pub mod parser;

// Re-export commonly used types
pub use async_result::{AsyncResultStreamer, ResultStream, ResultStreamReader, FAILED_MARKER};
pub use client::{
    ChatEndpointCaller, EndpointCaller, GenerateEndpointCaller, DEFAULT_OLLAMA_URL,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};
pub use observer::{ChatStreamObserver, StreamHandler};
pub use parser::{
    ChatLineParser, GenerateLineParser, LineReader, ResponseLineParser, CHAT_ENDPOINT,
    GENERATE_ENDPOINT,
};
