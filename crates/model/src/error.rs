use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The credential is missing, malformed or rejected.
    Unauthorized,
    /// The request could not reach the model provider, or the connection
    /// broke while the response was streaming.
    Network,
    /// The model provider is rate limited, or the quota is used up.
    RateLimitExceeded,
    /// The prompt or the response is blocked by the provider.
    Moderated,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            ErrorKind::Moderated => write!(f, "Content blocked"),
            ErrorKind::Other => write!(f, "Unknown error"),
        }
    }
}
