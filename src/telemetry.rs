//! Tracing setup for the overlay backend.
//!
//! `LOG_LEVEL` takes a full filter directive (e.g. "info,prompt_store=trace").
//! An unparsable value falls back to the default and says so once the
//! subscriber is up. `LOG_FORMAT=json` switches to structured lines.
//!
//! Targets in use: `prompt_store` for store/session/review activity,
//! `orbit_backend` for transport and startup.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,prompt_store=debug,orbit_backend=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than "json" (case-insensitive) is pretty.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Filter from `LOG_LEVEL`, or the default plus the rejected directive.
fn filter_from(value: Option<&str>) -> (EnvFilter, Option<String>) {
    match value {
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_FILTER), Some(directives.to_string())),
        },
        None => (EnvFilter::new(DEFAULT_FILTER), None),
    }
}

pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok();
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let (filter, rejected) = filter_from(level.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }

    if let Some(bad) = rejected {
        warn!(target: "orbit_backend", directive = %bad, fallback = DEFAULT_FILTER, "LOG_LEVEL not understood");
    }
    info!(target: "orbit_backend", ?format, "Tracing ready");
}
