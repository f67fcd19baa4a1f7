//! Request payload traits
//!
//! The payload schema is owned by callers of this crate; the protocol core
//! only needs a canonical JSON encoding of it, plus the ability to force
//! streaming mode for background calls.

use serde::Serialize;

use crate::errors::Result;

/// A serializable request payload posted to the model server
pub trait RequestBody: Serialize {
    /// Canonical JSON encoding used as the HTTP request body
    fn to_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A request payload whose streaming flag can be forced on
///
/// Implemented by payloads accepted by the async result streamer, which
/// always runs in streaming mode regardless of what the caller set.
pub trait StreamableRequest: RequestBody {
    /// Toggle line-by-line streaming of the response
    fn set_stream(&mut self, stream: bool);
}
