use raiden_light_primitives::types::{
	Address,
	H256,
};
use serde::{
	Deserialize,
	Serialize,
};
use web3::signing::keccak256;

/// A path of nodes a transfer is forwarded along, initiator first.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RouteMetadata {
	pub route: Vec<Address>,
}

/// Routing information attached to a locked transfer.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
	pub routes: Vec<RouteMetadata>,
}

impl Metadata {
	pub fn new(routes: Vec<Vec<Address>>) -> Self {
		Self { routes: routes.into_iter().map(|route| RouteMetadata { route }).collect() }
	}

	/// Hash committed to by the transfer's message hash.
	///
	/// Each route is hashed over its concatenated addresses and the route hashes are hashed
	/// together in order.
	pub fn hash(&self) -> H256 {
		let mut data = vec![];
		for route in &self.routes {
			let addresses: Vec<u8> =
				route.route.iter().flat_map(|address| address.as_bytes().to_vec()).collect();
			data.extend_from_slice(&keccak256(&addresses));
		}
		H256::from_slice(&keccak256(&data))
	}
}
