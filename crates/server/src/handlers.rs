//! Request dispatch: one handler per upstream endpoint.
//!
//! Every handler runs the same stateless machine: validate the body,
//! branch on session-vs-credentials, fetch, then map failures by a single
//! rule — a client-supplied session turns any fetch failure into
//! `session_expired`, a fresh login turns it into a plain error. Only the
//! Gradescope handler has an upfront liveness probe; the calendar-style
//! upstreams find out their session is dead when the listing fails to
//! parse.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, Uri};
use dlp::{EgateClient, GradescopeClient, HydroClient};
use dlp_protocol::{
    Assignment, Auth, EgateRequest, Envelope, GradescopeRequest, HomeworkItem, HydroRequest,
};
use tracing::{info, warn};

use crate::app::AppConfig;

const LOGIN_FAILED: &str = "Login failed";

type Reply<T> = Json<Envelope<T>>;

fn bad_request<T>(detail: impl std::fmt::Display) -> Reply<T> {
    Json(Envelope::error(format!("Bad request: {detail}")))
}

/// `POST /api/gradescope`
pub async fn gradescope(
    State(config): State<AppConfig>,
    payload: Result<Json<GradescopeRequest>, JsonRejection>,
) -> Reply<Assignment> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };
    let include_session = request.include_session;
    let auth = match request.into_auth() {
        Ok(auth) => auth,
        Err(missing) => return bad_request(missing),
    };
    info!(
        target = "dlproxy",
        upstream = "gradescope",
        fresh = matches!(auth, Auth::Credentials(_)),
        "listing request"
    );

    match auth {
        Auth::Session(cookies) => {
            let client = match GradescopeClient::from_cookies(&config.gradescope_url, &cookies) {
                Ok(Some(client)) => client,
                Ok(None) => return bad_request("empty session"),
                Err(err) => return bad_request(err),
            };
            if !client.is_session_valid().await {
                return Json(Envelope::session_expired());
            }
            match client.fetch_listings().await {
                Ok(data) => Json(Envelope::success(data)),
                Err(err) => {
                    warn!(target = "dlproxy", upstream = "gradescope", error = %err, "fetch failed on restored session");
                    Json(Envelope::session_expired())
                }
            }
        }
        Auth::Credentials(credentials) => {
            let mut client = match GradescopeClient::new(&config.gradescope_url) {
                Ok(client) => client,
                Err(err) => return bad_request(err),
            };
            if let Err(err) = client.login(&credentials.email, &credentials.password).await {
                warn!(target = "dlproxy", upstream = "gradescope", error = %err, "login flow failed");
                return Json(Envelope::error(LOGIN_FAILED));
            }
            if !client.logged_in() {
                return Json(Envelope::error("Invalid email or password"));
            }
            match client.fetch_listings().await {
                Ok(data) => {
                    let mut envelope = Envelope::success(data);
                    if include_session {
                        envelope = envelope.with_session(client.session().cookies());
                    }
                    Json(envelope)
                }
                Err(err) => {
                    warn!(target = "dlproxy", upstream = "gradescope", error = %err, "fetch failed after fresh login");
                    Json(Envelope::error(LOGIN_FAILED))
                }
            }
        }
    }
}

/// `POST /api/blackboard`, also mounted at `POST /api/exam`.
pub async fn blackboard(
    State(config): State<AppConfig>,
    payload: Result<Json<EgateRequest>, JsonRejection>,
) -> Reply<HomeworkItem> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };
    let Some(base_url) = config.egate_url else {
        return Json(Envelope::error("EGate upstream is not configured"));
    };
    let include_session = request.include_session;
    let auth = match request.into_auth() {
        Ok(auth) => auth,
        Err(missing) => return bad_request(missing),
    };
    info!(
        target = "dlproxy",
        upstream = "egate",
        fresh = matches!(auth, Auth::Credentials(_)),
        "listing request"
    );

    match auth {
        Auth::Session(cookies) => {
            let client = match EgateClient::from_cookies(&base_url, &cookies) {
                Ok(Some(client)) => client,
                Ok(None) => return bad_request("empty session"),
                Err(err) => return bad_request(err),
            };
            match client.fetch_homework().await {
                Ok(data) => Json(Envelope::success(data)),
                Err(err) => {
                    warn!(target = "dlproxy", upstream = "egate", error = %err, "fetch failed on restored session");
                    Json(Envelope::session_expired())
                }
            }
        }
        Auth::Credentials(credentials) => {
            let client = match EgateClient::new(&base_url) {
                Ok(client) => client,
                Err(err) => return bad_request(err),
            };
            if let Err(err) = client
                .login(&credentials.studentid, &credentials.password)
                .await
            {
                warn!(target = "dlproxy", upstream = "egate", error = %err, "login flow failed");
                return Json(Envelope::error(LOGIN_FAILED));
            }
            match client.fetch_homework().await {
                Ok(data) => {
                    let mut envelope = Envelope::success(data);
                    if include_session {
                        envelope = envelope.with_session(client.session().cookies());
                    }
                    Json(envelope)
                }
                Err(err) => {
                    warn!(target = "dlproxy", upstream = "egate", error = %err, "fetch failed after fresh login");
                    Json(Envelope::error(LOGIN_FAILED))
                }
            }
        }
    }
}

/// `POST /api/hydro`
pub async fn hydro(
    payload: Result<Json<HydroRequest>, JsonRejection>,
) -> Reply<HomeworkItem> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_request(rejection),
    };
    let include_session = request.include_session;
    let (base_url, auth) = match request.into_parts() {
        Ok(parts) => parts,
        Err(missing) => return bad_request(missing),
    };
    info!(
        target = "dlproxy",
        upstream = "hydro",
        fresh = matches!(auth, Auth::Credentials(_)),
        "listing request"
    );

    match auth {
        Auth::Session(cookies) => {
            let client = match HydroClient::from_cookies(&base_url, &cookies) {
                Ok(Some(client)) => client,
                Ok(None) => return bad_request("empty session"),
                Err(err) => return bad_request(err),
            };
            match client.fetch_homework().await {
                Ok(data) => Json(Envelope::success(data)),
                Err(err) => {
                    warn!(target = "dlproxy", upstream = "hydro", error = %err, "fetch failed on restored session");
                    Json(Envelope::session_expired())
                }
            }
        }
        Auth::Credentials(credentials) => {
            let client = match HydroClient::new(&base_url) {
                Ok(client) => client,
                Err(err) => return bad_request(err),
            };
            if let Err(err) = client
                .login(&credentials.username, &credentials.password)
                .await
            {
                warn!(target = "dlproxy", upstream = "hydro", error = %err, "login flow failed");
                return Json(Envelope::error(LOGIN_FAILED));
            }
            match client.fetch_homework().await {
                Ok(data) => {
                    let mut envelope = Envelope::success(data);
                    if include_session {
                        envelope = envelope.with_session(client.session().cookies());
                    }
                    Json(envelope)
                }
                Err(err) => {
                    warn!(target = "dlproxy", upstream = "hydro", error = %err, "fetch failed after fresh login");
                    Json(Envelope::error(LOGIN_FAILED))
                }
            }
        }
    }
}

/// Fallback for unknown routes, mirroring the envelope shape so clients
/// never have to special-case plain-text errors.
pub async fn not_found(uri: Uri) -> (StatusCode, Reply<()>) {
    (
        StatusCode::NOT_FOUND,
        Json(Envelope::error(format!("Not Found: {uri}"))),
    )
}
