use raiden_light_primitives::{
	deserializers::{
		signature_from_str,
		u256_from_str,
		u64_from_str,
	},
	packing::pack_withdraw,
	serializers::{
		u256_to_str,
		u64_to_str,
	},
	types::{
		Address,
		BlockExpiration,
		CanonicalIdentifier,
		ChainID,
		ChannelIdentifier,
		MessageIdentifier,
		Nonce,
		Signature,
		TokenAmount,
		TokenNetworkAddress,
	},
};
use serde::{
	Deserialize,
	Serialize,
};

use super::{
	CmdId,
	SignedMessage,
};

/// Implement the withdraw accessors shared by all withdraw messages.
macro_rules! withdraw_message {
	($message:ident) => {
		impl $message {
			pub fn canonical_identifier(&self) -> CanonicalIdentifier {
				CanonicalIdentifier {
					chain_identifier: self.chain_id,
					token_network_address: self.token_network_address,
					channel_identifier: self.channel_identifier,
				}
			}

			/// The data both participants sign for the on-chain withdraw.
			pub fn packed_withdraw(&self) -> Vec<u8> {
				pack_withdraw(
					&self.canonical_identifier(),
					self.participant,
					self.total_withdraw,
					self.expiration,
				)
				.0
			}
		}
	};
}

/// Requests a signature on a new withdraw from the partner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawRequest {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub channel_identifier: ChannelIdentifier,
	pub participant: Address,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub total_withdraw: TokenAmount,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub nonce: Nonce,
	pub expiration: BlockExpiration,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

withdraw_message!(WithdrawRequest);

impl SignedMessage for WithdrawRequest {
	fn bytes_to_sign(&self) -> Vec<u8> {
		self.packed_withdraw()
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

/// Confirms the request to withdraw `total_withdraw` from the channel.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawConfirmation {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub channel_identifier: ChannelIdentifier,
	pub participant: Address,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub total_withdraw: TokenAmount,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub nonce: Nonce,
	pub expiration: BlockExpiration,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

withdraw_message!(WithdrawConfirmation);

impl SignedMessage for WithdrawConfirmation {
	fn bytes_to_sign(&self) -> Vec<u8> {
		self.packed_withdraw()
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

/// Notifies the partner that a withdraw request expired unconfirmed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawExpired {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub channel_identifier: ChannelIdentifier,
	pub participant: Address,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub total_withdraw: TokenAmount,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub nonce: Nonce,
	pub expiration: BlockExpiration,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

withdraw_message!(WithdrawExpired);

impl SignedMessage for WithdrawExpired {
	fn bytes_to_sign(&self) -> Vec<u8> {
		let cmd_id: [u8; 1] = CmdId::WithdrawExpired.into();

		let mut nonce = [0u8; 32];
		self.nonce.to_big_endian(&mut nonce);

		let mut bytes = vec![];
		bytes.extend_from_slice(&cmd_id);
		bytes.extend_from_slice(&[0, 0, 0]);
		bytes.extend_from_slice(&nonce);
		bytes.extend_from_slice(&self.message_identifier.to_be_bytes());
		bytes.extend(self.packed_withdraw());
		bytes
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}
