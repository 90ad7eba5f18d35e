//! Logging setup.
//!
//! Logs go to stderr through a `tracing-subscriber` fmt layer. The library
//! logs through the `log` facade; [`LogTracer`] forwards those records.

use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Environment variable holding an `EnvFilter` directive, e.g. `ongoku=debug`.
pub const LOG_ENV_VAR: &str = "ONGOKU_LOG";

/// Default level for a given number of `-v` flags.
pub fn default_level(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `ONGOKU_LOG` wins over `-v`.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity, quiet)));

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1);

    if let Err(e) = LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }

    let subscriber = Registry::default().with(filter).with(stderr);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
