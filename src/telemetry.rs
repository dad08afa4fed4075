//! Logging setup
//!
//! Events go to stderr so they never mix with command output on stdout.
//! `IDESK_LOG` takes an `EnvFilter` directive string (e.g. `idesk=debug`).

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "IDESK_LOG";

/// Install the global subscriber
///
/// Without `IDESK_LOG` the level is `warn`, or `debug` when `verbose` is set.
/// Calling this twice is harmless; the second call is ignored.
pub fn init(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();
}
