use raiden_light_primitives::types::{
	BlockTimeout,
	RevealTimeout,
	SettleTimeout,
};
use raiden_light_transport::config::TransportConfig;
use serde::Deserialize;

use crate::errors::EngineError;

/// Log output settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
	/// Directive used when `RUST_LOG` is not set, e.g. `info,raiden_light_transition=debug`.
	pub filter: String,
	pub json: bool,
	pub ansi: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self { filter: "info".to_owned(), json: false, ansi: true }
	}
}

/// Protocol and runtime settings of the engine.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
	pub reveal_timeout: u64,
	pub settle_timeout: u64,
	/// Depth at which chain events are considered final.
	pub confirmation_blocks: u64,
	/// Attempts for a transiently failing transaction, after the first one.
	pub transaction_retries: u32,
	pub transaction_retry_delay_ms: u64,
	/// Lifetime of our withdraw requests. Defaults to twice the reveal timeout.
	pub withdraw_expiry_blocks: Option<u64>,
	/// Minimum remaining lifetime of a withdraw request. Defaults to the reveal timeout.
	pub withdraw_margin_blocks: Option<u64>,
	/// Blocks before a lock expires at which its secret is registered on-chain.
	/// Defaults to the reveal timeout.
	pub secret_registration_margin: Option<u64>,
	pub stream_capacity: usize,
	/// Number of state changing transitions between two snapshots.
	pub snapshot_interval: u64,
	pub transport: TransportConfig,
	pub logging: LoggingConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			reveal_timeout: 50,
			settle_timeout: 500,
			confirmation_blocks: 5,
			transaction_retries: 3,
			transaction_retry_delay_ms: 1000,
			withdraw_expiry_blocks: None,
			withdraw_margin_blocks: None,
			secret_registration_margin: None,
			stream_capacity: 1024,
			snapshot_interval: 100,
			transport: TransportConfig::default(),
			logging: LoggingConfig::default(),
		}
	}
}

impl EngineConfig {
	pub fn from_json(data: &str) -> Result<Self, EngineError> {
		let config: Self = serde_json::from_str(data)
			.map_err(|e| EngineError::Config(format!("Could not parse config: {}", e)))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), EngineError> {
		if self.reveal_timeout == 0 {
			return Err(EngineError::Config("Reveal timeout must be positive".to_owned()))
		}
		if self.settle_timeout < self.reveal_timeout * 2 {
			return Err(EngineError::Config(format!(
				"Settle timeout {} must be at least twice the reveal timeout {}",
				self.settle_timeout, self.reveal_timeout
			)))
		}
		if self.withdraw_expiry_blocks() < self.withdraw_margin_blocks() {
			return Err(EngineError::Config(
				"Withdraw expiry must not be shorter than its margin".to_owned(),
			))
		}
		if self.transport.retry_interval_ms == 0 {
			return Err(EngineError::Config("Retry interval must be positive".to_owned()))
		}
		if self.stream_capacity == 0 {
			return Err(EngineError::Config("Stream capacity must be positive".to_owned()))
		}
		Ok(())
	}

	pub fn reveal_timeout(&self) -> RevealTimeout {
		self.reveal_timeout.into()
	}

	pub fn settle_timeout(&self) -> SettleTimeout {
		self.settle_timeout.into()
	}

	pub fn withdraw_expiry_blocks(&self) -> u64 {
		self.withdraw_expiry_blocks.unwrap_or(self.reveal_timeout * 2)
	}

	pub fn withdraw_margin_blocks(&self) -> u64 {
		self.withdraw_margin_blocks.unwrap_or(self.reveal_timeout)
	}

	pub fn withdraw_margin(&self) -> BlockTimeout {
		self.withdraw_margin_blocks().into()
	}

	pub fn secret_registration_margin(&self) -> BlockTimeout {
		self.secret_registration_margin.unwrap_or(self.reveal_timeout).into()
	}
}
