//! Per-upstream adapters: login + listing fetch + normalization.
//!
//! All three adapters follow the same contract. `login` performs the
//! platform's native flow and never errors just because credentials were
//! wrong; authentication failure surfaces either through an explicit
//! liveness probe (Gradescope) or through the listing fetch failing to
//! parse (EGate, Hydro). `fetch_*` enumerates the platform's listing and
//! flattens it into one ordered sequence of normalized records.

/// EGate/Blackboard portal adapter.
pub mod egate;
/// Gradescope adapter, including the session liveness probe.
pub mod gradescope;
/// Hydro online-judge adapter.
pub mod hydro;

/// Normalizes a client-supplied base URL: trailing slashes are dropped so
/// path concatenation stays predictable.
pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
