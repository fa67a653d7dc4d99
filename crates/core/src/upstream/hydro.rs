//! Hydro online-judge adapter.
//!
//! Hydro serves JSON when asked for it, so this adapter is a thin pair of
//! requests: a form login against `{base}/login` and a GET of
//! `{base}/homework`, whose `calendar` array carries the homework windows.
//! The base URL comes from the client, one deployment per request.

use chrono::{Local, NaiveDateTime, TimeZone};
use dlp_protocol::{CookieMap, HomeworkItem};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};
use crate::session::Session;
use crate::upstream::trim_base;

/// Width of the timezone suffix on `endAt` values, e.g. `+08:00`.
///
/// Documented assumption, not a guaranteed invariant: the deployments we
/// talk to all render a fixed-width offset, and the parse fails loudly if
/// one stops doing so.
const TZ_SUFFIX_LEN: usize = 6;

#[derive(Debug, Deserialize)]
struct CalendarPage {
    calendar: Vec<CalendarItem>,
}

#[derive(Debug, Deserialize)]
struct CalendarItem {
    title: String,
    rule: String,
    #[serde(rename = "endAt")]
    end_at: String,
    #[serde(default)]
    assign: Vec<String>,
    #[serde(rename = "docId")]
    doc_id: String,
}

pub struct HydroClient {
    session: Session,
    base: String,
}

impl HydroClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            session: Session::new(false)?,
            base: trim_base(base_url),
        })
    }

    /// Restores a client from a previously issued cookie mapping; `None`
    /// for an absent or empty mapping. There is no liveness probe for
    /// Hydro — a dead session surfaces as a shape error on the fetch.
    pub fn from_cookies(base_url: &str, cookies: &CookieMap) -> Result<Option<Self>> {
        let base = trim_base(base_url);
        let scope = Url::parse(&base)?;
        let Some(session) = Session::from_cookies(Some(cookies), &scope, false)? else {
            return Ok(None);
        };
        Ok(Some(Self { session, base }))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Posts the judge's login form. The response is deliberately not
    /// inspected: bad credentials simply leave the jar without an
    /// authenticated cookie, and the homework fetch fails to parse.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let form = [
            ("uname", username),
            ("password", password),
            ("tfa", ""),
            ("authnChallenge", ""),
        ];
        self.session
            .client()
            .post(format!("{}/login", self.base))
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;
        Ok(())
    }

    /// Fetches and normalizes the homework calendar.
    pub async fn fetch_homework(&self) -> Result<Vec<HomeworkItem>> {
        let body = self
            .session
            .client()
            .get(format!("{}/homework", self.base))
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .text()
            .await?;
        let page: CalendarPage = serde_json::from_str(&body).map_err(|err| {
            debug!(target = "dlp", error = %err, "hydro homework page did not parse");
            FetchError::shape(format!("homework listing is not calendar JSON: {err}"))
        })?;

        let now = Local::now().timestamp() as f64;
        page.calendar
            .into_iter()
            .map(|item| normalize_item(item, &self.base, now))
            .collect()
    }
}

/// Drops the fixed-width timezone suffix and parses the rest as a naive
/// local timestamp, returned as epoch seconds.
fn parse_end_at(end_at: &str) -> Result<f64> {
    let cut = end_at
        .len()
        .checked_sub(TZ_SUFFIX_LEN)
        .ok_or_else(|| timestamp_error(end_at, "shorter than its timezone suffix"))?;
    let naive = end_at
        .get(..cut)
        .ok_or_else(|| timestamp_error(end_at, "timezone suffix splits a character"))?;
    let naive = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S")
        .map_err(|err| timestamp_error(end_at, &err.to_string()))?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| timestamp_error(end_at, "nonexistent local time"))?;
    Ok(local.timestamp() as f64)
}

fn timestamp_error(value: &str, reason: &str) -> FetchError {
    FetchError::Timestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn normalize_item(item: CalendarItem, base: &str, now: f64) -> Result<HomeworkItem> {
    let due = parse_end_at(&item.end_at)?;
    let course = item
        .assign
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape("calendar item has no assigned course"))?;
    Ok(HomeworkItem {
        title: item.title,
        kind: item.rule,
        due,
        course,
        // TODO: replace the past-due approximation once the upstream
        // exposes per-user submission state on this listing.
        submitted: due < now,
        // Raw concatenation on purpose: docId already starts with the
        // path separator on every deployment seen so far.
        url: format!("{base}/homework{}", item.doc_id),
        status: "Live".into(),
    })
}
