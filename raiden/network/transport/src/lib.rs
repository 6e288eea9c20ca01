use async_trait::async_trait;
use raiden_light_messages::{
	errors::MessageError,
	messages::Message,
};
use raiden_light_primitives::types::Address;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod presence;
#[cfg(test)]
mod tests;

#[derive(Error, Debug, Clone)]
pub enum TransportError {
	#[error("Could not initialize transport: `{0}`")]
	Init(String),
	#[error("Peer `{0:#x}` is not reachable")]
	Unreachable(Address),
	#[error("Could not send message: `{0}`")]
	Send(String),
	#[error("Could not encode message: `{0}`")]
	Codec(#[from] MessageError),
	#[error("Error: `{0}`")]
	Other(String),
}

/// A message received from a peer. `sender` is the transport level identity,
/// the message signature is checked separately.
#[derive(Clone, Debug, PartialEq)]
pub struct IncomingMessage {
	pub sender: Address,
	pub message: Message,
}

/// Delivery of signed messages to peers.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Hand a message to the network. Success does not imply the peer received it.
	async fn send(&self, recipient: Address, message: &Message) -> Result<(), TransportError>;

	/// Whether `peer` is currently reachable.
	fn is_available(&self, peer: &Address) -> bool;
}
