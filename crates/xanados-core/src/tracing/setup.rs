//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "XANADOS_LOG";

/// Filter used when `XANADOS_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "xanados=info";

/// Initialize the tracing/logging system.
///
/// Reads `XANADOS_LOG` for per-module log levels.
/// Format: `XANADOS_LOG=xanados_scanner::scheduler=debug,xanados_scanner::cache=warn`
///
/// Falls back to `xanados=info` if `XANADOS_LOG` is not set or is invalid.
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = env_filter();

        // Another subscriber may already be installed by the embedding
        // application; that one wins.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}

/// The filter `init_tracing` installs: `XANADOS_LOG` when it parses,
/// otherwise `DEFAULT_FILTER`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
