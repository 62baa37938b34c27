//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the tracing/logging system.
///
/// Reads `TARGETING_LOG` for per-subsystem log levels, e.g.
/// `TARGETING_LOG=targeting_engine=debug,targeting_storage=warn`, and
/// falls back to `targeting=info` when unset or invalid.
///
/// Idempotent; calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("TARGETING_LOG")
            .unwrap_or_else(|_| EnvFilter::new("targeting=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
