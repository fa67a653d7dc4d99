//! Error taxonomy for upstream fetches.
//!
//! The variants stay distinct here even though the HTTP layer collapses
//! them: callers decide between `error` and `session_expired` purely from
//! whether the client supplied a session, not from the failure kind.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: DNS, TLS, timeout, connection reset.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered, but not with the structure we expect.
    /// For the upstreams without an explicit liveness probe this is the
    /// signal that a restored session is no longer authenticated.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// A timestamp field did not match the upstream's documented format.
    #[error("bad timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },

    /// The login flow completed but the upstream rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An upstream base URL could not be parsed.
    #[error("invalid base url: {0}")]
    BadUrl(#[from] url::ParseError),
}

impl FetchError {
    pub fn shape(message: impl Into<String>) -> Self {
        Self::UnexpectedShape(message.into())
    }
}
