use serde::{
	Deserialize,
	Serialize,
};
pub use web3::types::{
	Address,
	Bytes,
	H160,
	H256,
	U256,
};

mod chain_id;
pub use chain_id::*;

mod message_type;
pub use message_type::*;

mod numeric;
pub use numeric::*;

pub type BalanceHash = H256;

pub type BlockExpiration = U64;

pub type BlockNumber = U64;

pub type BlockTimeout = U64;

pub type ChannelIdentifier = U256;

pub type EncodedLock = Bytes;

pub type FeeAmount = U256;

pub type LockedAmount = U256;

pub type Locksroot = H256;

pub type MessageIdentifier = u64;

pub type MessageHash = H256;

pub type Nonce = U256;

pub type PaymentIdentifier = U64;

pub type RevealTimeout = U64;

pub type Secret = Bytes;

pub type SecretHash = H256;

pub type SettleTimeout = U64;

/// A 65 bytes `r || s || v` recoverable signature.
pub type Signature = Bytes;

pub type TokenAddress = Address;

pub type TokenAmount = U256;

pub type TokenNetworkAddress = Address;

pub type TransactionHash = H256;

/// The on-chain identity of a channel.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct CanonicalIdentifier {
	pub chain_identifier: ChainID,
	pub token_network_address: TokenNetworkAddress,
	pub channel_identifier: ChannelIdentifier,
}
