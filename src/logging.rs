use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Installs the stderr log subscriber.
///
/// `LOGEST_LOG` takes the usual `EnvFilter` syntax, e.g. `LOGEST_LOG=logest=trace`.
/// Without it, only warnings are shown unless `verbose` is set.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let fallback = if verbose { "logest=debug" } else { "logest=warn" };
        let filter =
            EnvFilter::try_from_env("LOGEST_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
