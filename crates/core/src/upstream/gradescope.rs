//! Gradescope adapter.
//!
//! Gradescope has no JSON API for students, so both the course list and
//! the per-course assignment tables are scraped from the dashboard HTML.
//! The login flow is the site's own Rails form: fetch the login page for
//! its CSRF token, then POST the credentials form and observe where the
//! redirect lands.

use dlp_protocol::{Assignment, CookieMap};
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};
use crate::session::Session;
use crate::upstream::trim_base;

pub const DEFAULT_BASE_URL: &str = "https://www.gradescope.com";

/// Marker input name present on the login form. Used both by the liveness
/// probe and to recognize a dashboard that silently became a login wall.
const LOGIN_FORM_MARKER: &str = "session[email]";
const LOGIN_LABEL: &str = "Log In";
const NO_SUBMISSION: &str = "No Submission";

/// Dashboard headings whose course lists belong to the student role.
const STUDENT_HEADINGS: [&str; 2] = ["Student Courses", "Your Courses"];

/// A course box scraped from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub short_name: String,
    pub full_name: String,
}

pub struct GradescopeClient {
    session: Session,
    base: Url,
    logged_in: bool,
}

impl GradescopeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            session: Session::new(false)?,
            base: Url::parse(&trim_base(base_url))?,
            logged_in: false,
        })
    }

    /// Restores a client from a previously issued cookie mapping. Returns
    /// `None` when the mapping is absent or empty. The caller still has to
    /// probe [`is_session_valid`](Self::is_session_valid) before trusting
    /// the restored session.
    pub fn from_cookies(base_url: &str, cookies: &CookieMap) -> Result<Option<Self>> {
        let base = Url::parse(&trim_base(base_url))?;
        let Some(session) = Session::from_cookies(Some(cookies), &base, false)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            session,
            base,
            logged_in: false,
        }))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether the last [`login`](Self::login) appeared to succeed.
    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    /// Performs the form login flow.
    ///
    /// Rejected credentials do not error; they leave [`logged_in`]
    /// unset because the site redirects back to the login page instead
    /// of the account dashboard.
    ///
    /// [`logged_in`]: Self::logged_in
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let login_url = self.base.join("login")?;
        let page = self
            .session
            .client()
            .get(login_url.clone())
            .send()
            .await?
            .text()
            .await?;
        let token = extract_authenticity_token(&page)
            .ok_or_else(|| FetchError::shape("login page carries no authenticity token"))?;

        let form = [
            ("utf8", "\u{2713}"),
            ("authenticity_token", token.as_str()),
            ("session[email]", email),
            ("session[password]", password),
            ("session[remember_me]", "0"),
            ("commit", LOGIN_LABEL),
        ];
        let response = self
            .session
            .client()
            .post(login_url)
            .form(&form)
            .send()
            .await?;
        self.logged_in = !response.url().path().contains("login");
        debug!(target = "dlp", logged_in = self.logged_in, "gradescope login flow finished");
        Ok(())
    }

    /// Best-effort probe for whether a restored session still
    /// authenticates. Heuristic, not a guarantee: it follows a GET to the
    /// base resource and inspects where it landed.
    pub async fn is_session_valid(&self) -> bool {
        let response = match self.session.client().get(self.base.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(target = "dlp", error = %err, "gradescope liveness probe failed");
                return false;
            }
        };
        if response.url().path().contains("login") {
            return false;
        }
        // Some login walls answer 200 on the original URL instead of
        // redirecting, so double-check the body for the login form.
        match response.text().await {
            Ok(body) => !(body.contains(LOGIN_FORM_MARKER) && body.contains(LOGIN_LABEL)),
            Err(_) => false,
        }
    }

    /// Enumerates student-role courses and flattens their assignment
    /// tables into one ordered sequence.
    pub async fn fetch_listings(&self) -> Result<Vec<Assignment>> {
        let mut records = Vec::new();
        for course in self.student_courses().await? {
            records.extend(self.course_assignments(&course).await?);
        }
        Ok(records)
    }

    async fn student_courses(&self) -> Result<Vec<Course>> {
        let url = self.base.join("account")?;
        let body = self.session.client().get(url).send().await?.text().await?;
        parse_student_courses(&body)
    }

    async fn course_assignments(&self, course: &Course) -> Result<Vec<Assignment>> {
        let url = self.base.join(&format!("courses/{}", course.id))?;
        let body = self.session.client().get(url).send().await?.text().await?;
        parse_assignments(&body, course, &self.base)
    }
}

/// Parses a static CSS selector. Only called with literals, so a parse
/// failure is a programming error.
fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn extract_authenticity_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let input = sel(r#"input[name="authenticity_token"]"#);
    document
        .select(&input)
        .find_map(|el| el.value().attr("value"))
        .map(str::to_string)
}

/// Extracts the course boxes listed under the student-role headings,
/// skipping instructor sections entirely.
fn parse_student_courses(html: &str) -> Result<Vec<Course>> {
    let document = Html::parse_document(html);
    let heading = sel("h1.pageHeading, h2.pageHeading");
    let course_box = sel("a.courseBox");
    let short_name = sel(".courseBox--shortname");
    let full_name = sel(".courseBox--name");

    let mut courses = Vec::new();
    for h in document.select(&heading) {
        let label = text_of(h);
        if !STUDENT_HEADINGS.contains(&label.as_str()) {
            continue;
        }
        for sibling in h.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
                continue;
            };
            // The next heading starts the following role section.
            if matches!(element.value().name(), "h1" | "h2") {
                break;
            }
            for anchor in element.select(&course_box) {
                let Some(id) = anchor
                    .value()
                    .attr("href")
                    .and_then(|href| href.rsplit('/').next())
                    .filter(|id| !id.is_empty())
                else {
                    continue;
                };
                let short = anchor.select(&short_name).next().map(text_of);
                let full = anchor.select(&full_name).next().map(text_of);
                let short = short.unwrap_or_default();
                let full = full.filter(|name| !name.is_empty()).unwrap_or_else(|| short.clone());
                courses.push(Course {
                    id: id.to_string(),
                    short_name: short,
                    full_name: full,
                });
            }
        }
    }

    if courses.is_empty() && html.contains(LOGIN_FORM_MARKER) {
        return Err(FetchError::shape("dashboard replaced by a login form"));
    }
    Ok(courses)
}

/// Parses one course page's student assignments table into normalized
/// records. The due-date cell carries up to two `<time>` elements; the
/// first is the due date, the second the late due date.
fn parse_assignments(html: &str, course: &Course, base: &Url) -> Result<Vec<Assignment>> {
    let document = Html::parse_document(html);
    let table = sel("#assignments-student-table");
    let row = sel("tbody tr");
    let title_link = sel("th a");
    let title_cell = sel("th");
    let status_text = sel(".submissionStatus--text");
    let due_time = sel("time.submissionTimeChart--dueDate");

    let Some(table) = document.select(&table).next() else {
        if html.contains(LOGIN_FORM_MARKER) {
            return Err(FetchError::shape("course page replaced by a login form"));
        }
        return Err(FetchError::shape("course page has no student assignments table"));
    };

    let course_url = base.join(&format!("courses/{}", course.id))?;
    let mut records = Vec::new();
    for tr in table.select(&row) {
        let anchor = tr.select(&title_link).next();
        let title = match anchor {
            Some(a) => text_of(a),
            None => match tr.select(&title_cell).next() {
                Some(cell) => text_of(cell),
                None => continue,
            },
        };
        if title.is_empty() {
            continue;
        }

        let url = match anchor.and_then(|a| a.value().attr("href")) {
            Some(href) => base.join(href)?.to_string(),
            None => course_url.to_string(),
        };
        let status = tr
            .select(&status_text)
            .next()
            .map(text_of)
            .unwrap_or_else(|| NO_SUBMISSION.to_string());

        let mut times = tr
            .select(&due_time)
            .filter_map(|t| t.value().attr("datetime"))
            .map(str::to_string);
        let due = times.next();
        let latedue = times.next();

        let submitted = status != NO_SUBMISSION;
        let raw = json!({
            "title": &title,
            "url": &url,
            "status": &status,
            "dueDate": [&due, &latedue],
        });
        records.push(Assignment {
            title,
            course: course.full_name.clone(),
            url,
            due,
            latedue,
            status,
            submitted,
            raw,
        });
    }
    Ok(records)
}
