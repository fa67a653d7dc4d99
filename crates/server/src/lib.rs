//! HTTP front end for the deadline proxy.
//!
//! One axum router, one handler per upstream, no state shared between
//! requests beyond the immutable [`app::AppConfig`]. Each handler owns
//! the session/credentials branching described by the request dispatcher
//! and delegates the actual upstream work to `dlp-core`.

pub mod app;
pub mod cli;
pub mod handlers;
pub mod logging;
