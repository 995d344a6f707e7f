use std::error::Error;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over `logging.level`.
pub fn init(logging: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format.as_str() {
        "pretty" => registry.with(fmt::layer().pretty()).try_init()?,
        _ => registry.with(fmt::layer().json()).try_init()?,
    }
    Ok(())
}
