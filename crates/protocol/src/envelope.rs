//! The top-level response wrapper shared by every endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A session serialized for the client: cookie name → value.
///
/// Ordered so that re-encoding the same session always yields the same
/// JSON object.
pub type CookieMap = BTreeMap<String, String>;

/// Terminal state of a proxied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
    SessionExpired,
}

/// The result envelope returned by all endpoints.
///
/// `message` accompanies non-success statuses; `data` accompanies success;
/// `session` is present only when the client asked for it and a fresh
/// login occurred during the request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<CookieMap>,
}

impl<T> Envelope<T> {
    /// A successful listing with no session attached.
    pub fn success(data: Vec<T>) -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: Some(data),
            session: None,
        }
    }

    /// A generic failure with a client-facing message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
            session: None,
        }
    }

    /// The terminal state for a client-supplied session that no longer
    /// authenticates with its upstream.
    pub fn session_expired() -> Self {
        Self {
            status: Status::SessionExpired,
            message: Some("Session expired".into()),
            data: None,
            session: None,
        }
    }

    /// Attaches a re-encoded session for client-side caching.
    pub fn with_session(mut self, session: CookieMap) -> Self {
        self.session = Some(session);
        self
    }
}
