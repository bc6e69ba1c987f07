//! Logging setup. Logs go to stderr since stdout belongs to the plugin
//! handshake.
//!
//! The filter comes from `RUST_LOG` when set. Otherwise Terraform's `TF_LOG`
//! (or the provider-specific `TF_LOG_PROVIDER`) level names are honoured, and
//! `info` is the default.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Maps a Terraform log level name onto a tracing filter directive.
pub fn tf_log_directive(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "JSON" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARN" => Some("warn"),
        "ERROR" => Some("error"),
        "OFF" => Some("off"),
        _ => None,
    }
}

fn build_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directive = ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|level| tf_log_directive(&level))
        .unwrap_or("info");

    EnvFilter::new(directive)
}

/// Installs the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(build_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

/// Like [`init_logging`], but returns `false` instead of panicking when a
/// subscriber is already installed.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(build_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}
