use std::collections::HashMap;

use parking_lot::RwLock;
use raiden_light_primitives::types::Address;
use tracing::debug;

/// Reachability of peers as reported by the network.
#[derive(Default)]
pub struct Presence {
	peers: RwLock<HashMap<Address, bool>>,
}

impl Presence {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set_available(&self, peer: Address, available: bool) {
		let previous = self.peers.write().insert(peer, available);
		if previous != Some(available) {
			debug!(message = "Peer presence changed", peer = format!("{:#x}", peer), available);
		}
	}

	/// Unknown peers are unreachable.
	pub fn is_available(&self, peer: &Address) -> bool {
		self.peers.read().get(peer).copied().unwrap_or(false)
	}

	pub fn available_peers(&self) -> Vec<Address> {
		self.peers.read().iter().filter(|(_, available)| **available).map(|(peer, _)| *peer).collect()
	}
}
