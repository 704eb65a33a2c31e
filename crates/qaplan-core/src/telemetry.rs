//! Logging for the `qaplan` binary.
//!
//! Stage events (`stage`, `records`, `duration_ms` fields) are written
//! to stderr. Stdout belongs to the run summary and the `qaplan score`
//! table, so piping either into a file never picks up log lines.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr subscriber for a `qaplan` invocation.
///
/// The CLI passes `--json` as `json` and maps `--verbose` to `level`
/// (DEBUG instead of INFO). `RUST_LOG` overrides the level. Only the first
/// call installs anything, so tests can call it freely.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
