//! Normalized assignment/homework records returned to clients.

use serde::{Deserialize, Serialize};

/// A Gradescope assignment, flattened from the per-course listing.
///
/// `due` and `latedue` intentionally serialize as `null` when absent so
/// that clients can rely on the keys being present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub title: String,
    /// Full course name the assignment belongs to.
    pub course: String,
    pub url: String,
    pub due: Option<String>,
    pub latedue: Option<String>,
    /// Upstream status label, e.g. "Submitted" or "No Submission".
    pub status: String,
    pub submitted: bool,
    /// Opaque passthrough of the scraped upstream row.
    pub raw: serde_json::Value,
}

/// A homework calendar entry from a Hydro-style online judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeworkItem {
    pub title: String,
    /// Upstream rule label, e.g. "homework" or "contest".
    #[serde(rename = "type")]
    pub kind: String,
    /// End-of-window timestamp in epoch seconds.
    pub due: f64,
    pub course: String,
    pub submitted: bool,
    pub url: String,
    pub status: String,
}
