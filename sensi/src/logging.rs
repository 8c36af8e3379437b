//! Diagnostic tracing for the `sensi` binary.
//!
//! The library only emits `tracing` events and never installs a subscriber,
//! so embedding applications and tests decide where events go. The binary
//! calls [`init`] once at startup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for the CLI.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, which still shows
/// failed directives and the encrypted-paths fallback.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=sensi=debug sensi apply --document model.json ...
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
