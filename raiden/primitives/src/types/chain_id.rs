#![warn(clippy::missing_docs_in_private_items)]

use std::str::FromStr;

use derive_more::Display;
use web3::types::U256;

/// The chain a token network lives on.
#[derive(Copy, Clone, Display, Debug, Eq, Hash, PartialEq)]
pub enum ChainID {
	Mainnet,
	Ropsten,
	Rinkeby,
	Goerli,
	#[display(fmt = "Private({})", _0)]
	Private(U256),
}

impl From<u64> for ChainID {
	fn from(value: u64) -> Self {
		match value {
			1 => ChainID::Mainnet,
			3 => ChainID::Ropsten,
			4 => ChainID::Rinkeby,
			5 => ChainID::Goerli,
			id => ChainID::Private(id.into()),
		}
	}
}

impl From<ChainID> for u64 {
	fn from(val: ChainID) -> Self {
		match val {
			ChainID::Mainnet => 1u64,
			ChainID::Ropsten => 3u64,
			ChainID::Rinkeby => 4u64,
			ChainID::Goerli => 5u64,
			ChainID::Private(id) => id.low_u64(),
		}
	}
}

impl From<U256> for ChainID {
	fn from(value: U256) -> Self {
		value.low_u64().into()
	}
}

impl From<ChainID> for U256 {
	fn from(val: ChainID) -> Self {
		let chain_id: u64 = val.into();
		chain_id.into()
	}
}

impl FromStr for ChainID {
	type Err = ();

	fn from_str(s: &str) -> Result<ChainID, ()> {
		Ok(s.parse::<u64>().map_err(|_| ())?.into())
	}
}
