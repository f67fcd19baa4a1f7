//! Stream observer for live chat responses
//!
//! Wraps a caller-supplied handler invoked once per content-bearing line
//! while a chat call is in flight. A fresh observer is bound to every call,
//! so handlers never leak across calls.

use crate::types::ChatResponseLine;

/// Caller-supplied incremental handler for streamed chat fragments
pub type StreamHandler = Box<dyn FnMut(&ChatResponseLine) + Send>;

/// Notification sink bound to one in-flight chat call
pub struct ChatStreamObserver {
    handler: Option<StreamHandler>,
}

impl ChatStreamObserver {
    /// Bind an optional handler for the duration of one call
    pub fn new(handler: Option<StreamHandler>) -> Self {
        Self { handler }
    }

    /// Forward a decoded line to the bound handler; no-op when unbound
    pub fn notify(&mut self, part: &ChatResponseLine) {
        if let Some(handler) = self.handler.as_mut() {
            handler(part);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn part(content: &str) -> ChatResponseLine {
        serde_json::from_str(&format!(
            r#"{{"message":{{"role":"assistant","content":"{content}"}},"done":false}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_notify_forwards_to_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut observer = ChatStreamObserver::new(Some(Box::new(
            move |line: &ChatResponseLine| {
                sink.lock()
                    .unwrap()
                    .push(line.content().unwrap_or_default().to_string());
            },
        )));

        observer.notify(&part("Hel"));
        observer.notify(&part("lo"));

        assert_eq!(*seen.lock().unwrap(), vec!["Hel", "lo"]);
    }

    #[test]
    fn test_notify_without_handler_is_noop() {
        let mut observer = ChatStreamObserver::new(None);
        observer.notify(&part("ignored"));
    }
}
