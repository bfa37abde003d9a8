//! # Structured Logging
//!
//! tracing-subscriber setup for the daemon. Two output modes: pretty for a
//! terminal, JSON lines for log shipping. Everything goes to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for a terminal.
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

impl LogFormat {
    /// Parses a format string, case-insensitive. Anything that is not
    /// "json" falls back to pretty rather than failing — a bad log-format
    /// flag should never keep the daemon from starting.
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Installs the global tracing subscriber. Call once from `main`; a second
/// call panics.
///
/// `default_filter` applies only when `RUST_LOG` is unset, e.g.
/// `"coffer_node=info,coffer_vault=info"`. When `RUST_LOG` is present its
/// directives win outright.
pub fn init_logging(default_filter: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
    }

    tracing::info!(?format, "logging initialized");
}
