//! Centralised tracing initialisation for flowmedic binaries.
//!
//! Call [`init_tracing`] once at program start. Safe to call more than
//! once; the global subscriber can only be set once per process, so
//! subsequent calls are silently ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a flowmedic-specific filter directive.
/// Takes precedence over `RUST_LOG`.
pub const LOG_ENV: &str = "FLOWMEDIC_LOG";

/// Initialise the global tracing subscriber.
///
/// * `json` — when `true`, emit newline-delimited JSON log lines.
/// * `level` — default verbosity when no filter env var is set.
///
/// Filter resolution order: `FLOWMEDIC_LOG`, then `RUST_LOG`, then the
/// supplied `level` with the HTTP client internals quieted down.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

/// Reasoning calls go through reqwest; its transport layers log
/// per-connection noise at debug that drowns the pipeline events.
fn default_directive(level: Level) -> String {
    format!("{},hyper=warn,reqwest=warn", level.as_str())
}
