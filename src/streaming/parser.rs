//! Incremental line extraction and per-line decoding for streaming responses
//!
//! The server streams newline-delimited JSON: every complete line is one
//! self-contained JSON document. [`LineReader`] reassembles lines from the
//! raw byte stream, buffering partial lines across chunk boundaries;
//! the [`ResponseLineParser`] strategies decode one line each and report
//! whether the stream reached its terminal state.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::error;

use crate::errors::Result;
use crate::streaming::observer::ChatStreamObserver;
use crate::types::{ChatResponseLine, GenerateResponseLine};

/// Chat endpoint path
pub const CHAT_ENDPOINT: &str = "/api/chat";

/// Generate endpoint path
pub const GENERATE_ENDPOINT: &str = "/api/generate";

/// Incremental newline splitter over an HTTP body byte stream
///
/// Chunk boundaries fall anywhere, including mid-line; partial lines are
/// buffered until their terminating newline arrives. A non-empty tail at
/// end-of-stream is yielded as a final line.
pub struct LineReader<S> {
    stream: S,
    buffer: String,
    exhausted: bool,
}

impl<S> LineReader<S>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    /// Wrap a response body byte stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: String::new(),
            exhausted: false,
        }
    }

    /// Next complete line without its trailing `\r`/`\n`, or `None` at
    /// end-of-stream. Transport failures mid-stream surface as errors.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(pos) = self.buffer.find('\n') {
                let mut line: String = self.buffer.drain(..=pos).collect();
                let trimmed = line.trim_end_matches(['\r', '\n']).len();
                line.truncate(trimmed);
                return Ok(Some(line));
            }

            if self.exhausted {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buffer)));
            }

            match self.stream.next().await {
                Some(chunk) => {
                    let chunk = chunk?;
                    self.buffer.push_str(&String::from_utf8_lossy(&chunk));
                }
                None => self.exhausted = true,
            }
        }
    }
}

/// Per-line decoding strategy, one implementation per endpoint
pub trait ResponseLineParser {
    /// Path appended to the host for this endpoint
    fn endpoint_suffix(&self) -> &'static str;

    /// Decode one response line, appending any content to `accumulator`.
    ///
    /// Returns true when the stream reached its terminal line.
    fn parse_line(&mut self, line: &str, accumulator: &mut String) -> bool;
}

/// Line decoder for the chat endpoint
///
/// Forwards every content-bearing line to the bound stream observer, in
/// arrival order, after appending the content to the accumulator.
pub struct ChatLineParser {
    observer: ChatStreamObserver,
}

impl ChatLineParser {
    /// Create a parser with a fresh per-call observer
    pub fn new(observer: ChatStreamObserver) -> Self {
        Self { observer }
    }
}

impl ResponseLineParser for ChatLineParser {
    fn endpoint_suffix(&self) -> &'static str {
        CHAT_ENDPOINT
    }

    fn parse_line(&mut self, line: &str, accumulator: &mut String) -> bool {
        match serde_json::from_str::<ChatResponseLine>(line) {
            Ok(decoded) => {
                // Under heavy load the server emits lines whose message part
                // is missing or empty; skip those and wait for the next line.
                if let Some(content) = decoded.content() {
                    if !content.is_empty() {
                        accumulator.push_str(content);
                        self.observer.notify(&decoded);
                    }
                }
                decoded.done
            }
            Err(err) => {
                // Stop reading instead of spinning on input that will never
                // decode; the call still completes with what was accumulated.
                error!("undecodable chat response line: {err}");
                true
            }
        }
    }
}

/// Line decoder for the generate endpoint
pub struct GenerateLineParser;

impl ResponseLineParser for GenerateLineParser {
    fn endpoint_suffix(&self) -> &'static str {
        GENERATE_ENDPOINT
    }

    fn parse_line(&mut self, line: &str, accumulator: &mut String) -> bool {
        match serde_json::from_str::<GenerateResponseLine>(line) {
            Ok(decoded) => {
                if !decoded.response.is_empty() {
                    accumulator.push_str(&decoded.response);
                }
                decoded.done
            }
            Err(err) => {
                error!("undecodable generate response line: {err}");
                true
            }
        }
    }
}
