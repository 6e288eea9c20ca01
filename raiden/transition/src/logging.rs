use tracing_subscriber::{
	fmt,
	prelude::*,
	EnvFilter,
};

use crate::{
	config::LoggingConfig,
	errors::EngineError,
};

/// Install the global subscriber. `RUST_LOG` takes precedence over the configured filter.
pub fn setup_logging(config: &LoggingConfig) -> Result<(), EngineError> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.filter))
		.map_err(|e| EngineError::Config(format!("Invalid log filter: {}", e)))?;

	let registry = tracing_subscriber::registry().with(filter);
	let result = if config.json {
		registry.with(fmt::layer().json()).try_init()
	} else {
		registry.with(fmt::layer().with_ansi(config.ansi)).try_init()
	};
	result.map_err(|e| EngineError::Config(format!("Could not install logger: {}", e)))
}
