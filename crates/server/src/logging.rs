//! Tracing subscriber setup for the proxy binary.

use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. `RUST_LOG` wins when set; otherwise
/// the counted `-v` flags pick the level for our own crates.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dlproxy={level},dlp_server={level},dlp={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
