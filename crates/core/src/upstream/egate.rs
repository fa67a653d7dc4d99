//! EGate/Blackboard portal adapter.
//!
//! The deployed portal answers the same homework-calendar dialect as a
//! Hydro judge, so the listing logic below mirrors `upstream::hydro`
//! almost line for line. The duplication is deliberate: whether the two
//! upstreams really are the same platform is an open product question,
//! and keeping the adapters structurally separate means they can diverge
//! without untangling shared code.
//!
//! Unlike Hydro, the portal base URL is fixed server-side configuration,
//! and its certificate is not publicly trusted, so validation is disabled
//! for this upstream only.

use chrono::{Local, NaiveDateTime, TimeZone};
use dlp_protocol::{CookieMap, HomeworkItem};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};
use crate::session::Session;
use crate::upstream::trim_base;

/// Same fixed-width offset assumption as the Hydro adapter.
const TZ_SUFFIX_LEN: usize = 6;

#[derive(Debug, Deserialize)]
struct PortalCalendar {
    calendar: Vec<PortalEntry>,
}

#[derive(Debug, Deserialize)]
struct PortalEntry {
    title: String,
    rule: String,
    #[serde(rename = "endAt")]
    end_at: String,
    #[serde(default)]
    assign: Vec<String>,
    #[serde(rename = "docId")]
    doc_id: String,
}

pub struct EgateClient {
    session: Session,
    base: String,
}

impl EgateClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            session: Session::new(true)?,
            base: trim_base(base_url),
        })
    }

    /// Restores a client from a previously issued cookie mapping; `None`
    /// for an absent or empty mapping. No liveness probe exists for the
    /// portal — a dead session surfaces as a shape error on the fetch.
    pub fn from_cookies(base_url: &str, cookies: &CookieMap) -> Result<Option<Self>> {
        let base = trim_base(base_url);
        let scope = Url::parse(&base)?;
        let Some(session) = Session::from_cookies(Some(cookies), &scope, true)? else {
            return Ok(None);
        };
        Ok(Some(Self { session, base }))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Posts the portal's login form with its two-factor fields left
    /// empty. The response is not inspected; authentication failure
    /// surfaces through the listing fetch instead.
    pub async fn login(&self, studentid: &str, password: &str) -> Result<()> {
        let form = [
            ("username", studentid),
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

    /// Fetches and normalizes the portal's homework calendar.
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
        let page: PortalCalendar = serde_json::from_str(&body).map_err(|err| {
            debug!(target = "dlp", error = %err, "egate homework page did not parse");
            FetchError::shape(format!("portal listing is not calendar JSON: {err}"))
        })?;

        let now = Local::now().timestamp() as f64;
        page.calendar
            .into_iter()
            .map(|entry| normalize_entry(entry, &self.base, now))
            .collect()
    }
}

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

fn normalize_entry(entry: PortalEntry, base: &str, now: f64) -> Result<HomeworkItem> {
    let due = parse_end_at(&entry.end_at)?;
    let course = entry
        .assign
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::shape("calendar entry has no assigned course"))?;
    Ok(HomeworkItem {
        title: entry.title,
        kind: entry.rule,
        due,
        course,
        submitted: due < now,
        url: format!("{base}/homework{}", entry.doc_id),
        status: "Live".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_entry_normalizes_like_hydro() {
        let entry = PortalEntry {
            title: "Quiz 3".into(),
            rule: "homework".into(),
            end_at: "2024-06-01T12:00:00+08:00".into(),
            assign: vec!["Databases".into()],
            doc_id: "/17".into(),
        };
        let record = normalize_entry(entry, "https://egate.example.edu", f64::MAX).unwrap();
        assert_eq!(record.title, "Quiz 3");
        assert_eq!(record.course, "Databases");
        assert_eq!(record.url, "https://egate.example.edu/homework/17");
        assert!(record.submitted);
    }

    #[test]
    fn entry_without_course_is_a_shape_error() {
        let entry = PortalEntry {
            title: "Quiz 3".into(),
            rule: "homework".into(),
            end_at: "2024-06-01T12:00:00+08:00".into(),
            assign: Vec::new(),
            doc_id: "/17".into(),
        };
        assert!(matches!(
            normalize_entry(entry, "https://egate.example.edu", 0.0),
            Err(FetchError::UnexpectedShape(_))
        ));
    }
}
