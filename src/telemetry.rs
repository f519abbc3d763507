use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialise structured JSON logging on stdout.
///
/// `RUST_LOG` controls the level, falling back to `info`. Actix's `log` records
/// are forwarded through the subscriber's log bridge.
pub fn init_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(formatting_layer)
        .init();
}

/// Like [`init_telemetry`] but tolerates an already installed subscriber.
///
/// Used by integration tests, which share one process across many servers.
pub fn try_init_test_telemetry() {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .json();

    let _ = tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(formatting_layer)
        .try_init();
}
