//! A model provider for the Gemini generative language API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use gemchat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{GeminiConfig, GeminiConfigBuilder};
use io::{Chunks, Sse};
use proto::ErrorResponse;
pub use response::GeminiResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for [`GeminiProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let resp_fut = if req.credential.is_empty() {
            None
        } else {
            let body = proto::create_request(req);
            let mut builder = self
                .client
                .post(self.config.stream_url(&req.model))
                .header(API_KEY_HEADER, req.credential.expose())
                .header(header::ACCEPT, "text/event-stream")
                .json(&body);
            if let Some(timeout) = self.config.timeout {
                builder = builder.timeout(timeout);
            }
            Some(builder.send())
        };

        async move {
            let Some(resp_fut) = resp_fut else {
                return Err(Error::new(
                    "API key is not set",
                    ErrorKind::Unauthorized,
                ));
            };

            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    error!("failed to send request: {err}");
                    let message = format!("{err}");
                    return Err(Error::new(message, ErrorKind::Network));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(error_from_status(status, &body));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.essence_str() == mime::TEXT_EVENT_STREAM.essence_str()
                })
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(GeminiResponse::from_sse(sse))
        }
    }
}

/// Maps a failed HTTP response to an error, keeping the server's message
/// when the body carries one.
fn error_from_status(status: StatusCode, body: &str) -> Error {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let message = match &parsed {
        Some(resp) if !resp.error.message.is_empty() => {
            resp.error.message.clone()
        }
        _ => format!("HTTP status {status}"),
    };
    let rpc_status = parsed.as_ref().and_then(|r| r.error.status.as_deref());

    let kind = match status.as_u16() {
        401 | 403 => ErrorKind::Unauthorized,
        429 => ErrorKind::RateLimitExceeded,
        // An invalid key is reported as a bad request.
        400 if message.contains("API key") => ErrorKind::Unauthorized,
        _ if rpc_status == Some("RESOURCE_EXHAUSTED") => {
            ErrorKind::RateLimitExceeded
        }
        _ if status.is_server_error() => ErrorKind::Network,
        _ => ErrorKind::Other,
    };
    error!("request failed with {status}: {message}");
    Error::new(message, kind)
}
