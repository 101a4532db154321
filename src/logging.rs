// Holds the tracing setup the binary installs before running a sweep

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

pub const LOG_ENV: &str = "NUM2SQRTS_LOG";

/// Installs the global subscriber.
///
/// Levels come from `NUM2SQRTS_LOG` (e.g. `NUM2SQRTS_LOG=num2sqrts::logic=debug`),
/// falling back to `num2sqrts=info`. Later calls do nothing.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("num2sqrts=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
