use serde::Deserialize;

/// Generic transport configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
	/// Interval between two deliveries of an unacknowledged message.
	pub retry_interval_ms: u64,
	/// Capacity of the inbound message queue.
	pub inbound_capacity: usize,
}

impl Default for TransportConfig {
	fn default() -> Self {
		Self { retry_interval_ms: 5000, inbound_capacity: 1024 }
	}
}
