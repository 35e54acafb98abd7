//! Diagnostic tracing for the rewriting passes.
//!
//! Passes log through the `tracing` facade only: `debug` per pass with
//! counts, `trace` per individual rewrite, `warn` for failed verification.
//! Embedding applications usually install their own subscriber; these
//! helpers are for tools and tests that do not.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize a tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=pmtree_transform=trace cargo test -p pmtree-transform
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

/// Like [`init`], but a no-op if a global subscriber is already set.
/// Returns whether this call installed it.
pub fn try_init() -> bool {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .is_ok()
}
