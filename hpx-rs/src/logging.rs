//! Diagnostic logging setup.
//!
//! Program output goes to stdout through the console; tracing events go to
//! stderr so the two never interleave in a pipe.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
pub const LOG_ENV: &str = "HPX_LOG";

/// Install the global tracing subscriber.
///
/// `debug` (the `-d` flag) forces `hpx=debug` when no filter is set in the
/// environment.  Without either, nothing is logged.  Safe to call repeatedly.
pub fn init(debug: bool) {
    TRACING_INIT.call_once(|| {
        let Some(filter) = filter_directives(debug) else {
            return;
        };
        let Ok(filter) = EnvFilter::try_new(&filter) else {
            eprintln!("hpx: ignoring invalid log filter `{filter}`");
            return;
        };
        // A subscriber installed by the embedding program wins.
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .try_init();
    });
}

fn filter_directives(debug: bool) -> Option<String> {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| debug.then(|| "hpx=debug".to_owned()))
}
