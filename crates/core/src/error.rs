use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use gemchat_model::{ErrorKind, ModelProviderError};
use serde::{Deserialize, Serialize};

/// The category of a failed turn.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ChatErrorKind {
    /// The credential is missing or was rejected.
    Unauthorized,
    /// The request could not reach the service, or timed out.
    Network,
    /// The service refused the request due to quota limits.
    RateLimitExceeded,
    /// The prompt or the response was blocked by content filtering.
    Moderated,
    /// The model finished without producing any text.
    EmptyResponse,
    /// Anything else.
    Other,
}

impl From<ErrorKind> for ChatErrorKind {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Unauthorized => Self::Unauthorized,
            ErrorKind::Network => Self::Network,
            ErrorKind::RateLimitExceeded => Self::RateLimitExceeded,
            ErrorKind::Moderated => Self::Moderated,
            ErrorKind::Other => Self::Other,
        }
    }
}

/// The cause recorded in a failed turn.
///
/// Unlike provider errors, this is a plain value: it can be cloned into
/// every snapshot that shows it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatError {
    kind: ChatErrorKind,
    message: String,
}

impl ChatError {
    /// Creates a new error.
    #[inline]
    pub fn new<S: Into<String>>(kind: ChatErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an error for a completion that carried no text.
    #[inline]
    pub fn empty_response() -> Self {
        Self::new(ChatErrorKind::EmptyResponse, "The model returned no text")
    }

    /// Captures a provider error, keeping its message verbatim.
    #[inline]
    pub fn from_provider(err: &dyn ModelProviderError) -> Self {
        Self::new(err.kind().into(), err.to_string())
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ChatErrorKind {
        self.kind
    }

    /// Returns the message of this error.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for ChatError {}

/// The reason a draft was not submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitError {
    /// The draft text is empty or whitespace only.
    EmptyDraft,
    /// A previous submission is still awaiting its response.
    Busy,
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::EmptyDraft => f.write_str("the draft is empty"),
            SubmitError::Busy => {
                f.write_str("still waiting for the previous response")
            }
        }
    }
}

impl StdError for SubmitError {}
