// ============================
// larder-backend-lib/src/logging.rs
// ============================
//! Tracing subscriber setup.
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogFormat;

/// Build the event filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(level: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(format!("{level},tower_http=info")),
    }
}

/// Install the global subscriber
pub fn init_logging(
    level: &str,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = env_filter(level)?;

    match format {
        LogFormat::Full => {
            let fmt_layer = fmt::layer().with_target(true).with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        },
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_filter(filter);
            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        },
    }

    Ok(())
}
