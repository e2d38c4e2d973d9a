//! Structured logging setup.
//!
//! Console layer plus an optional daily-rolling file layer. Hosting
//! binaries call [`init`] once at startup; repeated calls (tests) are
//! harmless no-ops.

use std::path::Path;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise tracing. `log_dir` enables the rolling file layer; pass
/// `None` for console-only output (tests, one-off tools).
pub fn init(log_dir: Option<&Path>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,siam_pos=debug"));

    let console_layer = fmt::layer().with_target(true);

    let file_layer = log_dir.map(|dir| {
        std::fs::create_dir_all(dir).ok();
        let file_appender = tracing_appender::rolling::daily(dir, "pos");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // The guard must live for the whole process; dropping it stops
        // the background writer.
        std::mem::forget(guard);
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
    });

    let initialised = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if initialised {
        info!("Siam POS core v{} logging ready", env!("CARGO_PKG_VERSION"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_creates_the_log_dir() {
        let dir = tempfile::tempdir().expect("temp log dir");
        let log_dir = dir.path().join("logs");
        init(Some(&log_dir));
        // Second init must not panic even though a subscriber is set.
        init(None);
        assert!(log_dir.is_dir());
    }
}
