//! Session acquisition and the cookie codec.
//!
//! A [`Session`] pairs a reqwest client with a shared cookie store so the
//! jar can be read back out after the login flow ran. Encoding and
//! decoding are pure local transforms; no upstream contact happens here.

use std::sync::Arc;

use dlp_protocol::CookieMap;
use reqwest::Client;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex, RawCookie};
use tracing::debug;
use url::Url;

use crate::error::Result;

/// Browser user agent sent on every upstream request. Some portals refuse
/// logins from clients that do not present one.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// An HTTP session against exactly one upstream.
///
/// Valid for that upstream only; replaying its cookies elsewhere is
/// undefined behavior and not guarded against.
pub struct Session {
    client: Client,
    store: Arc<CookieStoreMutex>,
}

impl Session {
    /// Creates a fresh, unauthenticated session.
    ///
    /// `accept_invalid_certs` exists for the EGate portal, which serves a
    /// certificate the system roots do not accept.
    pub fn new(accept_invalid_certs: bool) -> Result<Self> {
        let store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&store))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { client, store })
    }

    /// Restores a session from a client-supplied cookie mapping, scoping
    /// every cookie to `base`.
    ///
    /// Absent and empty mappings both mean "no session" and yield `None`.
    /// Individually malformed cookies are skipped rather than failing the
    /// whole restore.
    pub fn from_cookies(
        cookies: Option<&CookieMap>,
        base: &Url,
        accept_invalid_certs: bool,
    ) -> Result<Option<Self>> {
        let Some(cookies) = cookies.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let session = Self::new(accept_invalid_certs)?;
        {
            let mut store = session.lock_store();
            for (name, value) in cookies {
                let raw = RawCookie::new(name.clone(), value.clone());
                if let Err(err) = store.insert_raw(&raw, base) {
                    debug!(target = "dlp", cookie = %name, error = %err, "skipping cookie");
                }
            }
        }
        Ok(Some(session))
    }

    /// Serializes the jar back into a name→value mapping. An empty jar
    /// yields an empty mapping.
    pub fn cookies(&self) -> CookieMap {
        self.lock_store()
            .iter_any()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, CookieStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://upstream.example.com/").unwrap()
    }

    fn mapping(pairs: &[(&str, &str)]) -> CookieMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn cookie_mapping_round_trips() {
        let map = mapping(&[("sid", "abc123"), ("sails.sid", "s%3Axyz"), ("gs_token", "t")]);
        let session = Session::from_cookies(Some(&map), &base(), false)
            .unwrap()
            .expect("non-empty mapping restores a session");
        assert_eq!(session.cookies(), map);
    }

    #[test]
    fn absent_and_empty_mappings_restore_nothing() {
        assert!(Session::from_cookies(None, &base(), false).unwrap().is_none());
        let empty = CookieMap::new();
        assert!(
            Session::from_cookies(Some(&empty), &base(), false)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn fresh_session_encodes_to_empty_mapping() {
        let session = Session::new(false).unwrap();
        assert!(session.cookies().is_empty());
    }
}
