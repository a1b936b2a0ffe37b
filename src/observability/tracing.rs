use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with the given log level.
///
/// Log level can be overridden with the `RUST_LOG` environment variable.
/// `json` switches the fmt layer to structured JSON lines.
pub fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

/// Initialize tracing for tests (doesn't fail if already initialized).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("ruletrace=debug")
        .with_test_writer()
        .try_init();
}
