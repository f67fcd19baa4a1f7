//! Endpoint callers for the model server API
//!
//! [`EndpointCaller`] owns the configured HTTP client and runs the shared
//! request/response loop: build the request, read the body line by line,
//! delegate decoding to a [`ResponseLineParser`], and classify the HTTP
//! status once per call. [`ChatEndpointCaller`] and
//! [`GenerateEndpointCaller`] bind the loop to their endpoint strategy.

use std::time::{Duration, Instant};

use reqwest::{header, Client};
use tracing::{error, info, warn};

use crate::auth::BasicAuth;
use crate::errors::{OllamaError, Result};
use crate::streaming::observer::{ChatStreamObserver, StreamHandler};
use crate::streaming::parser::{
    ChatLineParser, GenerateLineParser, LineReader, ResponseLineParser,
};
use crate::types::{CallResult, ErrorResponse, RequestBody};

/// Default model server endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Fixed error text for 401 responses; the body is never consulted
const UNAUTHORIZED_ERROR: &str = "Unauthorized";

/// Shared request/response loop for all endpoints
pub struct EndpointCaller {
    client: Client,
    host: String,
    basic_auth: Option<BasicAuth>,
    verbose: bool,
}

impl EndpointCaller {
    /// Create a caller against `host` with default settings
    pub fn new(host: &str) -> Result<Self> {
        Self::with_config(host, None, DEFAULT_REQUEST_TIMEOUT_SECONDS, false)
    }

    /// Create a caller with explicit credentials, timeout, and verbosity
    pub fn with_config(
        host: &str,
        basic_auth: Option<BasicAuth>,
        request_timeout_seconds: u64,
        verbose: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            basic_auth,
            verbose,
        })
    }

    /// Configured host, without trailing slash
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Execute one call and block until the full line stream is consumed.
    ///
    /// The status code is classified once, before the line loop:
    /// 401 reads no body lines and synthesizes a fixed error text;
    /// 404 and 400 decode each line as an error payload; everything else
    /// is delegated to `parser`, which stops the loop by reporting the
    /// stream's terminal line.
    ///
    /// # Errors
    /// [`OllamaError::Protocol`] when the status is not 200, carrying the
    /// accumulated error text; [`OllamaError::Http`] on transport failures.
    pub async fn call_sync<P>(
        &self,
        parser: &mut P,
        body: &impl RequestBody,
    ) -> Result<CallResult>
    where
        P: ResponseLineParser,
    {
        let start = Instant::now();
        let url = format!("{}{}", self.host, parser.endpoint_suffix());
        let payload = body.to_body()?;
        if self.verbose {
            info!(url = %url, "asking model: {payload}");
        }

        let mut request = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(auth) = &self.basic_auth {
            request = auth.apply(request);
        }

        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let mut accumulator = String::new();

        if status_code == 401 {
            warn!("status code: 401 (Unauthorized)");
            accumulator.push_str(UNAUTHORIZED_ERROR);
        } else if status_code == 404 || status_code == 400 {
            warn!(status = status_code, "error response from server");
            let mut lines = LineReader::new(response.bytes_stream());
            while let Some(line) = lines.next_line().await? {
                let error: ErrorResponse = serde_json::from_str(&line)?;
                accumulator.push_str(&error.error);
            }
        } else {
            let mut lines = LineReader::new(response.bytes_stream());
            while let Some(line) = lines.next_line().await? {
                if parser.parse_line(&line, &mut accumulator) {
                    break;
                }
            }
        }

        if status_code != 200 {
            error!(status = status_code, "request failed: {accumulator}");
            return Err(OllamaError::Protocol(accumulator));
        }

        let result = CallResult {
            response: accumulator.trim().to_string(),
            response_time_ms: start.elapsed().as_millis() as u64,
            http_status_code: status_code,
        };
        if self.verbose {
            info!("model response: {}", result.response);
        }
        Ok(result)
    }
}

/// Caller for the chat endpoint
pub struct ChatEndpointCaller {
    caller: EndpointCaller,
}

impl ChatEndpointCaller {
    /// Create a chat caller against `host` with default settings
    pub fn new(host: &str) -> Result<Self> {
        Ok(Self {
            caller: EndpointCaller::new(host)?,
        })
    }

    /// Create a chat caller with explicit credentials, timeout, and verbosity
    pub fn with_config(
        host: &str,
        basic_auth: Option<BasicAuth>,
        request_timeout_seconds: u64,
        verbose: bool,
    ) -> Result<Self> {
        Ok(Self {
            caller: EndpointCaller::with_config(
                host,
                basic_auth,
                request_timeout_seconds,
                verbose,
            )?,
        })
    }

    /// Send a chat payload and wait for the assembled answer.
    ///
    /// When `handler` is given it is invoked once per content-bearing
    /// line while the call is in flight; the binding lasts exactly one call.
    pub async fn call(
        &self,
        body: &impl RequestBody,
        handler: Option<StreamHandler>,
    ) -> Result<CallResult> {
        let mut parser = ChatLineParser::new(ChatStreamObserver::new(handler));
        self.caller.call_sync(&mut parser, body).await
    }

    /// Configured host, without trailing slash
    pub fn host(&self) -> &str {
        self.caller.host()
    }
}

impl Default for ChatEndpointCaller {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL).expect("Failed to create default ChatEndpointCaller")
    }
}

/// Caller for the generate endpoint
pub struct GenerateEndpointCaller {
    caller: EndpointCaller,
}

impl GenerateEndpointCaller {
    /// Create a generate caller against `host` with default settings
    pub fn new(host: &str) -> Result<Self> {
        Ok(Self {
            caller: EndpointCaller::new(host)?,
        })
    }

    /// Create a generate caller with explicit credentials, timeout, and verbosity
    pub fn with_config(
        host: &str,
        basic_auth: Option<BasicAuth>,
        request_timeout_seconds: u64,
        verbose: bool,
    ) -> Result<Self> {
        Ok(Self {
            caller: EndpointCaller::with_config(
                host,
                basic_auth,
                request_timeout_seconds,
                verbose,
            )?,
        })
    }

    /// Send a generate payload and wait for the assembled answer
    pub async fn call(&self, body: &impl RequestBody) -> Result<CallResult> {
        let mut parser = GenerateLineParser;
        self.caller.call_sync(&mut parser, body).await
    }

    /// Configured host, without trailing slash
    pub fn host(&self) -> &str {
        self.caller.host()
    }
}

impl Default for GenerateEndpointCaller {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL).expect("Failed to create default GenerateEndpointCaller")
    }
}
