//! Per-endpoint request bodies and their boundary validation.
//!
//! Every body accepts either a previously issued `session` cookie mapping
//! or a set of upstream credentials. The raw deserialized shape keeps all
//! fields optional; [`Auth`] is the validated form handlers actually work
//! with. An empty `session` object counts as absent, matching clients
//! that send `{}` before their first login.

use serde::{Deserialize, Deserializer};

use crate::envelope::CookieMap;

/// Deserializes the `session` field leniently: anything that is not a
/// string→string mapping (null, a scalar, stale junk from an old client)
/// counts as no session at all rather than a hard parse failure.
fn lenient_session<'de, D>(deserializer: D) -> Result<Option<CookieMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// How a request authenticates with its upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth<C> {
    /// Replay a session previously issued by the proxy.
    Session(CookieMap),
    /// Perform a fresh login.
    Credentials(C),
}

/// A required field that was absent from the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing field `{}`", self.0)
    }
}

impl std::error::Error for MissingField {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradescopeCredentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/gradescope`.
#[derive(Debug, Default, Deserialize)]
pub struct GradescopeRequest {
    #[serde(default, deserialize_with = "lenient_session")]
    pub session: Option<CookieMap>,
    #[serde(default)]
    pub include_session: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl GradescopeRequest {
    pub fn into_auth(self) -> Result<Auth<GradescopeCredentials>, MissingField> {
        if let Some(session) = self.session.filter(|s| !s.is_empty()) {
            return Ok(Auth::Session(session));
        }
        match (self.email, self.password) {
            (Some(email), Some(password)) => {
                Ok(Auth::Credentials(GradescopeCredentials { email, password }))
            }
            (None, _) => Err(MissingField("email")),
            (_, None) => Err(MissingField("password")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgateCredentials {
    pub studentid: String,
    pub password: String,
}

/// Body of `POST /api/blackboard` and its `/api/exam` alias.
#[derive(Debug, Default, Deserialize)]
pub struct EgateRequest {
    #[serde(default, deserialize_with = "lenient_session")]
    pub session: Option<CookieMap>,
    #[serde(default)]
    pub include_session: bool,
    #[serde(default)]
    pub studentid: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl EgateRequest {
    pub fn into_auth(self) -> Result<Auth<EgateCredentials>, MissingField> {
        if let Some(session) = self.session.filter(|s| !s.is_empty()) {
            return Ok(Auth::Session(session));
        }
        match (self.studentid, self.password) {
            (Some(studentid), Some(password)) => {
                Ok(Auth::Credentials(EgateCredentials { studentid, password }))
            }
            (None, _) => Err(MissingField("studentid")),
            (_, None) => Err(MissingField("password")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydroCredentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/hydro`.
///
/// Unlike the other upstreams the judge's base URL comes from the client,
/// so `url` is required on both the session and the credentials path.
#[derive(Debug, Default, Deserialize)]
pub struct HydroRequest {
    #[serde(default, deserialize_with = "lenient_session")]
    pub session: Option<CookieMap>,
    #[serde(default)]
    pub include_session: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl HydroRequest {
    pub fn into_parts(self) -> Result<(String, Auth<HydroCredentials>), MissingField> {
        let url = self.url.ok_or(MissingField("url"))?;
        if let Some(session) = self.session.filter(|s| !s.is_empty()) {
            return Ok((url, Auth::Session(session)));
        }
        match (self.username, self.password) {
            (Some(username), Some(password)) => {
                Ok((url, Auth::Credentials(HydroCredentials { username, password })))
            }
            (None, _) => Err(MissingField("username")),
            (_, None) => Err(MissingField("password")),
        }
    }
}
