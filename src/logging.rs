use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Diagnostics go to stderr so stdout stays reserved for probe lines and the
/// summary. `RUST_LOG` takes precedence; otherwise only warnings are shown,
/// or `info` and above with `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Ignore a second initialisation, e.g. when embedded in another binary.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
