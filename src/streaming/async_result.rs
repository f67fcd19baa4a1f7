//! Background streaming execution of generate calls
//!
//! [`AsyncResultStreamer`] runs the request/response loop on a spawned task
//! instead of blocking the caller. Fragments are published into a
//! [`ResultStream`] that any number of readers can iterate from the
//! beginning while the producer is still appending; completion state is
//! published through atomics so polling never observes a partial write.

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::{header, Client};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::auth::BasicAuth;
use crate::errors::{OllamaError, Result};
use crate::streaming::parser::{LineReader, GENERATE_ENDPOINT};
use crate::types::{ErrorResponse, GenerateResponseLine, RequestBody, StreamableRequest};

/// Prefix of `complete_response` when the background call failed
pub const FAILED_MARKER: &str = "[FAILED] ";

struct StreamInner {
    fragments: Mutex<Vec<String>>,
    closed: AtomicBool,
    notify: Notify,
}

/// Append-only fragment sequence with one writer and many readers
///
/// Readers iterate from the beginning and observe fragments in append
/// order; appending while readers iterate is safe.
#[derive(Clone)]
pub struct ResultStream {
    inner: Arc<StreamInner>,
}

impl ResultStream {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(StreamInner {
                fragments: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub(crate) fn push(&self, fragment: impl Into<String>) {
        self.inner.fragments.lock().unwrap().push(fragment.into());
        self.inner.notify.notify_waiters();
    }

    pub(crate) fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// New reader positioned at the first fragment
    pub fn reader(&self) -> ResultStreamReader {
        ResultStreamReader {
            inner: Arc::clone(&self.inner),
            cursor: 0,
        }
    }

    /// True once the producer has stopped appending
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of fragments appended so far
    pub fn len(&self) -> usize {
        self.inner.fragments.lock().unwrap().len()
    }

    /// True while no fragment has been appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cursor over a [`ResultStream`], independent of every other reader
pub struct ResultStreamReader {
    inner: Arc<StreamInner>,
    cursor: usize,
}

impl ResultStreamReader {
    fn take_available(&mut self) -> Option<String> {
        let fragments = self.inner.fragments.lock().unwrap();
        if self.cursor < fragments.len() {
            let fragment = fragments[self.cursor].clone();
            self.cursor += 1;
            Some(fragment)
        } else {
            None
        }
    }

    /// Next fragment in append order; waits while the producer is still
    /// running and returns `None` once the stream is closed and drained.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            if let Some(fragment) = self.take_available() {
                return Some(fragment);
            }

            let inner = Arc::clone(&self.inner);
            let notified = inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            // Re-check after registering so an append racing with the
            // first check is not lost.
            if let Some(fragment) = self.take_available() {
                return Some(fragment);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return self.take_available();
            }

            notified.await;
        }
    }
}

struct AsyncCallState {
    succeeded: AtomicBool,
    finished: AtomicBool,
    http_status_code: AtomicU16,
    response_time_ms: AtomicU64,
    complete_response: Mutex<String>,
}

/// Handle over a generate call running on a background task
///
/// The task is the sole writer of the published state; the handle's
/// accessors are safe to call from any thread at any time. `succeeded` and
/// `complete_response` are meaningful once `is_finished` reports true (or
/// the fragment stream has closed). There is no cancellation primitive:
/// abandoning the handle lets the task run to completion or timeout on
/// its own.
pub struct AsyncResultStreamer {
    stream: ResultStream,
    state: Arc<AsyncCallState>,
    handle: Option<JoinHandle<()>>,
}

impl AsyncResultStreamer {
    /// Force streaming mode on `request` and launch the call.
    ///
    /// Returns immediately; the spawned task owns the whole protocol run.
    pub fn start<R>(
        host: &str,
        basic_auth: Option<BasicAuth>,
        request_timeout_seconds: u64,
        mut request: R,
    ) -> Result<Self>
    where
        R: StreamableRequest + Send + Sync + 'static,
    {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds))
            .build()?;
        let url = format!("{}{}", host.trim_end_matches('/'), GENERATE_ENDPOINT);

        request.set_stream(true);

        let stream = ResultStream::new();
        let state = Arc::new(AsyncCallState {
            succeeded: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            http_status_code: AtomicU16::new(0),
            response_time_ms: AtomicU64::new(0),
            complete_response: Mutex::new(String::new()),
        });

        let task_stream = stream.clone();
        let task_state = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            run_call(client, url, basic_auth, request, task_stream, task_state).await;
        });

        Ok(Self {
            stream,
            state,
            handle: Some(handle),
        })
    }

    /// New reader over the live fragment sequence, from the beginning
    pub fn stream(&self) -> ResultStreamReader {
        self.stream.reader()
    }

    /// Whether the call succeeded; meaningful once finished
    pub fn succeeded(&self) -> bool {
        self.state.succeeded.load(Ordering::Acquire)
    }

    /// True once the background task has published its final state
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// HTTP status code of the response; 0 until headers arrive
    pub fn http_status_code(&self) -> u16 {
        self.state.http_status_code.load(Ordering::Acquire)
    }

    /// Elapsed wall time of the call in milliseconds
    pub fn response_time_millis(&self) -> u64 {
        self.state.response_time_ms.load(Ordering::Acquire)
    }

    /// Assembled response text; on failure it starts with [`FAILED_MARKER`]
    pub fn complete_response(&self) -> String {
        self.state.complete_response.lock().unwrap().clone()
    }

    /// Wait for the background task to exit. Idempotent.
    ///
    /// # Errors
    /// [`OllamaError::Task`] if the task was aborted or panicked.
    pub async fn join(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle
                .await
                .map_err(|err| OllamaError::Task(err.to_string()))?;
        }
        Ok(())
    }
}

async fn run_call<R>(
    client: Client,
    url: String,
    basic_auth: Option<BasicAuth>,
    request: R,
    stream: ResultStream,
    state: Arc<AsyncCallState>,
) where
    R: RequestBody,
{
    let start = Instant::now();
    let outcome = execute(&client, &url, basic_auth.as_ref(), &request, &stream, &state).await;

    match outcome {
        Ok(complete) => {
            state.succeeded.store(true, Ordering::Release);
            *state.complete_response.lock().unwrap() = complete;
        }
        Err(err) => {
            warn!("async generate call failed: {err}");
            state.succeeded.store(false, Ordering::Release);
            *state.complete_response.lock().unwrap() = format!("{FAILED_MARKER}{err}");
        }
    }

    state
        .response_time_ms
        .store(start.elapsed().as_millis() as u64, Ordering::Release);
    state.finished.store(true, Ordering::Release);
    stream.close();
}

/// One full protocol run: send, read lines, publish fragments.
///
/// Every decoded fragment goes to the live stream; the returned buffer
/// holds only non-terminal generation fragments (the terminal fragment is
/// streamed to readers but kept out of the assembled response) or, on the
/// error path, the accumulated error text.
async fn execute<R>(
    client: &Client,
    url: &str,
    basic_auth: Option<&BasicAuth>,
    request: &R,
    stream: &ResultStream,
    state: &AsyncCallState,
) -> Result<String>
where
    R: RequestBody,
{
    let payload = request.to_body()?;
    let mut builder = client
        .post(url)
        .header(header::ACCEPT, "application/json")
        .header(header::CONTENT_TYPE, "application/json")
        .body(payload);
    if let Some(auth) = basic_auth {
        builder = auth.apply(builder);
    }

    let response = builder.send().await?;
    let status_code = response.status().as_u16();
    state.http_status_code.store(status_code, Ordering::Release);

    let mut buffer = String::new();
    let mut lines = LineReader::new(response.bytes_stream());

    if status_code == 404 {
        while let Some(line) = lines.next_line().await? {
            let error: ErrorResponse = serde_json::from_str(&line)?;
            stream.push(error.error.clone());
            buffer.push_str(&error.error);
        }
    } else {
        while let Some(line) = lines.next_line().await? {
            let decoded: GenerateResponseLine = serde_json::from_str(&line)?;
            stream.push(decoded.response.clone());
            if !decoded.done {
                buffer.push_str(&decoded.response);
            }
        }
    }

    if status_code != 200 {
        return Err(OllamaError::Protocol(buffer));
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reader_sees_fragments_in_order() {
        let stream = ResultStream::new();
        stream.push("Hel");
        stream.push("lo");
        stream.close();

        let mut reader = stream.reader();
        assert_eq!(reader.next().await.as_deref(), Some("Hel"));
        assert_eq!(reader.next().await.as_deref(), Some("lo"));
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn test_independent_readers_start_from_beginning() {
        let stream = ResultStream::new();
        stream.push("a");

        let mut first = stream.reader();
        assert_eq!(first.next().await.as_deref(), Some("a"));

        stream.push("b");
        stream.close();

        let mut second = stream.reader();
        assert_eq!(second.next().await.as_deref(), Some("a"));
        assert_eq!(second.next().await.as_deref(), Some("b"));
        assert!(second.next().await.is_none());

        assert_eq!(first.next().await.as_deref(), Some("b"));
        assert!(first.next().await.is_none());
    }

    #[tokio::test]
    async fn test_reader_waits_for_live_appends() {
        let stream = ResultStream::new();
        let mut reader = stream.reader();

        let producer = stream.clone();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.push("late");
            producer.close();
        });

        assert_eq!(reader.next().await.as_deref(), Some("late"));
        assert!(reader.next().await.is_none());
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_fragments_appended_before_close_are_not_lost() {
        let stream = ResultStream::new();
        let mut reader = stream.reader();

        stream.push("x");
        stream.close();

        assert_eq!(reader.next().await.as_deref(), Some("x"));
        assert!(reader.next().await.is_none());
    }

    #[test]
    fn test_len_and_closed_flags() {
        let stream = ResultStream::new();
        assert!(stream.is_empty());
        assert!(!stream.is_closed());

        stream.push("one");
        stream.close();
        assert_eq!(stream.len(), 1);
        assert!(stream.is_closed());
    }
}
