use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_LOG_LEVEL: &str =
    "info,supervisor_allocation_engine=debug,supervisor_allocation_backend=debug,tower_http=debug";

/// `RUST_LOG` wins over the configured filter, which wins over the default.
pub fn setup_telemetry(log_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.unwrap_or(DEFAULT_LOG_LEVEL).into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .init();
}
