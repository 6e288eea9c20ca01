//! An in-process network connecting transports by address.
use std::{
	collections::HashMap,
	sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use raiden_light_messages::messages::Message;
use raiden_light_primitives::types::Address;
use tokio::sync::mpsc;
use tracing::trace;

use crate::{
	presence::Presence,
	IncomingMessage,
	Transport,
	TransportError,
};

#[derive(Default)]
struct NetworkInner {
	peers: Mutex<HashMap<Address, mpsc::Sender<IncomingMessage>>>,
	presence: Presence,
}

/// Routes encoded messages between the transports that joined it.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
	inner: Arc<NetworkInner>,
}

impl MemoryNetwork {
	pub fn new() -> Self {
		Self::default()
	}

	/// Connect `address`, returning its transport and inbound queue.
	pub fn join(
		&self,
		address: Address,
		capacity: usize,
	) -> (MemoryTransport, mpsc::Receiver<IncomingMessage>) {
		let (sender, receiver) = mpsc::channel(capacity);
		self.inner.peers.lock().insert(address, sender);
		self.inner.presence.set_available(address, true);
		let transport =
			MemoryTransport { address, network: self.clone(), sent: Arc::new(Mutex::new(vec![])) };
		(transport, receiver)
	}

	/// Mark a peer reachable or not without disconnecting it.
	pub fn set_available(&self, address: Address, available: bool) {
		self.inner.presence.set_available(address, available);
	}

	pub fn leave(&self, address: Address) {
		self.inner.peers.lock().remove(&address);
		self.inner.presence.set_available(address, false);
	}

	fn sender(&self, address: &Address) -> Option<mpsc::Sender<IncomingMessage>> {
		self.inner.peers.lock().get(address).cloned()
	}
}

/// One node's view of a `MemoryNetwork`. Keeps a log of what it sent.
#[derive(Clone)]
pub struct MemoryTransport {
	address: Address,
	network: MemoryNetwork,
	sent: Arc<Mutex<Vec<(Address, Message)>>>,
}

impl MemoryTransport {
	pub fn address(&self) -> Address {
		self.address
	}

	/// Every message handed to the network so far, in order.
	pub fn sent_messages(&self) -> Vec<(Address, Message)> {
		self.sent.lock().clone()
	}
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn send(&self, recipient: Address, message: &Message) -> Result<(), TransportError> {
		if !self.is_available(&recipient) {
			return Err(TransportError::Unreachable(recipient))
		}
		let peer = self.network.sender(&recipient).ok_or(TransportError::Unreachable(recipient))?;

		let data = message.encode()?;
		let decoded = Message::decode(&data)?;
		trace!(
			message = "Sending message",
			recipient = format!("{:#x}", recipient),
			kind = message.type_name(),
		);
		self.sent.lock().push((recipient, message.clone()));
		peer.send(IncomingMessage { sender: self.address, message: decoded })
			.await
			.map_err(|e| TransportError::Send(format!("{}", e)))
	}

	fn is_available(&self, peer: &Address) -> bool {
		self.network.inner.presence.is_available(peer)
	}
}
