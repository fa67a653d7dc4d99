//! End-to-end behavior of the calendar-style endpoints (hydro, egate)
//! and the envelope rules shared by all of them. Upstreams are stubbed
//! with in-process axum servers on ephemeral ports.

use std::collections::HashMap;

use axum::Form;
use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use chrono::{Local, NaiveDateTime, TimeZone};
use dlp_server::app::{self, AppConfig};

const STUB_COOKIE: &str = "sid=stub-session";

async fn stub_login(Form(form): Form<HashMap<String, String>>) -> Response {
    let user = form
        .get("uname")
        .or_else(|| form.get("username"))
        .map(String::as_str);
    if user == Some("u") && form.get("password").map(String::as_str) == Some("p") {
        (
            [(header::SET_COOKIE, format!("{STUB_COOKIE}; Path=/"))],
            "{}",
        )
            .into_response()
    } else {
        "{}".into_response()
    }
}

async fn stub_homework(headers: HeaderMap) -> Response {
    let authed = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|cookies| cookies.contains(STUB_COOKIE));
    if authed {
        Json(serde_json::json!({
            "calendar": [{
                "title": "HW1",
                "rule": "homework",
                "endAt": "2024-01-01T00:00:00+00:00",
                "assign": ["Course A"],
                "docId": "/1",
            }]
        }))
        .into_response()
    } else {
        Html("<html><body>Sign in</body></html>").into_response()
    }
}

fn calendar_stub() -> Router {
    Router::new()
        .route("/login", post(stub_login))
        .route("/homework", get(stub_homework))
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn serve_proxy(egate_url: Option<String>) -> String {
    let config = AppConfig {
        gradescope_url: "http://127.0.0.1:9".into(),
        egate_url,
    };
    serve(app::router(config)).await
}

async fn post_json(url: &str, body: serde_json::Value) -> (StatusCode, HeaderMap, serde_json::Value) {
    let client = reqwest::Client::new();
    let response = client.post(url).json(&body).send().await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body: serde_json::Value = response.json().await.unwrap();
    (status, headers, body)
}

fn expected_epoch(naive: &str) -> f64 {
    let naive = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S").unwrap();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap()
        .timestamp() as f64
}

#[tokio::test]
async fn hydro_fresh_login_returns_normalized_listing() {
    let upstream = serve(calendar_stub()).await;
    let proxy = serve_proxy(None).await;

    let (status, _, body) = post_json(
        &format!("{proxy}/api/hydro"),
        serde_json::json!({
            "url": upstream,
            "username": "u",
            "password": "p",
            "include_session": true,
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success", "body: {body}");
    let record = &body["data"][0];
    assert_eq!(record["title"], "HW1");
    assert_eq!(record["type"], "homework");
    assert_eq!(record["course"], "Course A");
    assert_eq!(record["url"], format!("{upstream}/homework/1"));
    assert_eq!(record["status"], "Live");
    assert_eq!(
        record["due"].as_f64().unwrap(),
        expected_epoch("2024-01-01T00:00:00")
    );
    // The window closed long ago, so the past-due approximation holds.
    assert_eq!(record["submitted"], true);

    // Fresh login with include_session: the re-encoded jar comes back.
    assert_eq!(body["session"]["sid"], "stub-session");
}

#[tokio::test]
async fn hydro_replayed_session_skips_login_and_gets_no_session_back() {
    let upstream = serve(calendar_stub()).await;
    let proxy = serve_proxy(None).await;

    let (_, _, body) = post_json(
        &format!("{proxy}/api/hydro"),
        serde_json::json!({
            "url": upstream,
            "session": {"sid": "stub-session"},
            "include_session": true,
        }),
    )
    .await;

    assert_eq!(body["status"], "success", "body: {body}");
    assert_eq!(body["data"][0]["title"], "HW1");
    // A request that supplied a session never gets one back.
    assert!(body.get("session").is_none());
}

#[tokio::test]
async fn hydro_dead_session_is_session_expired_never_error() {
    let upstream = serve(calendar_stub()).await;
    let proxy = serve_proxy(None).await;

    let (status, _, body) = post_json(
        &format!("{proxy}/api/hydro"),
        serde_json::json!({
            "url": upstream,
            "session": {"sid": "expired-garbage"},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "session_expired");
    assert_eq!(body["message"], "Session expired");
}

#[tokio::test]
async fn hydro_bad_credentials_surface_as_login_failed() {
    let upstream = serve(calendar_stub()).await;
    let proxy = serve_proxy(None).await;

    let (_, _, body) = post_json(
        &format!("{proxy}/api/hydro"),
        serde_json::json!({
            "url": upstream,
            "username": "u",
            "password": "wrong",
        }),
    )
    .await;

    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Login failed");
}

#[tokio::test]
async fn hydro_unreachable_upstream_is_collapsed_by_the_same_rule() {
    let proxy = serve_proxy(None).await;

    // Nothing listens on port 9; with credentials the failure is a plain
    // error, with a session it must be session_expired.
    let (_, _, body) = post_json(
        &format!("{proxy}/api/hydro"),
        serde_json::json!({
            "url": "http://127.0.0.1:9",
            "username": "u",
            "password": "p",
        }),
    )
    .await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Login failed");

    let (_, _, body) = post_json(
        &format!("{proxy}/api/hydro"),
        serde_json::json!({
            "url": "http://127.0.0.1:9",
            "session": {"sid": "x"},
        }),
    )
    .await;
    assert_eq!(body["status"], "session_expired");
}

#[tokio::test]
async fn missing_fields_fail_fast_with_a_structured_error() {
    let proxy = serve_proxy(None).await;

    let (status, _, body) = post_json(&format!("{proxy}/api/hydro"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Bad request: missing field `url`");

    let (_, _, body) = post_json(
        &format!("{proxy}/api/gradescope"),
        serde_json::json!({"password": "pw"}),
    )
    .await;
    assert_eq!(body["message"], "Bad request: missing field `email`");
}

#[tokio::test]
async fn blackboard_and_exam_share_the_egate_upstream() {
    let upstream = serve(calendar_stub()).await;
    let proxy = serve_proxy(Some(upstream.clone())).await;

    for endpoint in ["blackboard", "exam"] {
        let (_, _, body) = post_json(
            &format!("{proxy}/api/{endpoint}"),
            serde_json::json!({
                "studentid": "u",
                "password": "p",
                "include_session": true,
            }),
        )
        .await;
        assert_eq!(body["status"], "success", "endpoint {endpoint}: {body}");
        assert_eq!(body["data"][0]["course"], "Course A");
        assert_eq!(body["session"]["sid"], "stub-session");
    }
}

#[tokio::test]
async fn blackboard_without_configured_portal_is_an_error() {
    let proxy = serve_proxy(None).await;

    let (_, _, body) = post_json(
        &format!("{proxy}/api/blackboard"),
        serde_json::json!({"studentid": "u", "password": "p"}),
    )
    .await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "EGate upstream is not configured");
}

#[tokio::test]
async fn unknown_routes_get_an_enveloped_404() {
    let proxy = serve_proxy(None).await;

    let (status, headers, body) =
        post_json(&format!("{proxy}/api/nonexistent"), serde_json::json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Not Found: "), "message: {message}");
    // CORS headers are applied to the fallback too.
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN.as_str()], "*");
}

#[tokio::test]
async fn every_response_carries_permissive_cors_headers() {
    let proxy = serve_proxy(None).await;

    let (_, headers, _) = post_json(&format!("{proxy}/api/hydro"), serde_json::json!({})).await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN.as_str()], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS.as_str()],
        "Content-Type"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS.as_str()],
        "GET, POST"
    );
}
