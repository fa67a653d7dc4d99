//! Router construction and response-wide headers.

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::post;

use crate::handlers;

/// Immutable per-process configuration; the only state the router holds.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gradescope_url: String,
    /// Portal base URL. `None` leaves the exam/blackboard endpoints
    /// answering a configuration error.
    pub egate_url: Option<String>,
}

/// Builds the API router. `exam` is a legacy alias of `blackboard` and
/// shares its handler.
pub fn router(config: AppConfig) -> Router {
    Router::new()
        .route("/api/gradescope", post(handlers::gradescope))
        .route("/api/exam", post(handlers::blackboard))
        .route("/api/blackboard", post(handlers::blackboard))
        .route("/api/hydro", post(handlers::hydro))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(cors_headers))
        .with_state(config)
}

/// Permissive CORS for browser clients, applied to every response
/// including the 404 fallback.
async fn cors_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST"),
    );
    response
}
