use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "graph_upload=debug,warn"
    } else {
        "graph_upload=info,warn"
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the `debug` flag. Calling this twice is harmless;
/// the second subscriber is simply not installed.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
