use derive_more::Deref;
use raiden_light_primitives::{
	deserializers::{
		signature_from_str,
		u256_from_str,
		u64_from_str,
	},
	hashing::hash_secret,
	serializers::{
		u256_to_str,
		u64_to_str,
	},
	types::{
		Address,
		BlockExpiration,
		ChainID,
		ChannelIdentifier,
		LockedAmount,
		Locksroot,
		MessageIdentifier,
		Nonce,
		PaymentIdentifier,
		Secret,
		SecretHash,
		Signature,
		TokenAddress,
		TokenAmount,
		TokenNetworkAddress,
		H256,
	},
};
use serde::{
	Deserialize,
	Serialize,
};
use web3::signing::keccak256;

use super::{
	balance_proof_bytes,
	metadata::Metadata,
	CmdId,
	SignedEnvelopeMessage,
	SignedMessage,
};

/// Requests the secret which unlocks a lock.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SecretRequest {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub payment_identifier: PaymentIdentifier,
	pub secrethash: SecretHash,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub amount: TokenAmount,
	pub expiration: BlockExpiration,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl SignedMessage for SecretRequest {
	fn bytes_to_sign(&self) -> Vec<u8> {
		let mut amount = [0u8; 32];
		self.amount.to_big_endian(&mut amount);

		let mut bytes = vec![];
		bytes.extend(&[CmdId::SecretRequest as u8, 0, 0, 0]);
		bytes.extend(&self.message_identifier.to_be_bytes());
		bytes.extend(&self.payment_identifier.as_bytes());
		bytes.extend(self.secrethash.as_bytes());
		bytes.extend(&amount);
		bytes.extend(&self.expiration.to_be_bytes());
		bytes
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

/// Reveal the lock's secret.
///
/// This message is not sufficient to unlock a lock, refer to the Unlock.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SecretReveal {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub secret: Secret,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl SecretReveal {
	pub fn secrethash(&self) -> SecretHash {
		hash_secret(&self.secret.0)
	}
}

impl SignedMessage for SecretReveal {
	fn bytes_to_sign(&self) -> Vec<u8> {
		let mut bytes = vec![];
		bytes.extend(&[CmdId::RevealSecret as u8, 0, 0, 0]);
		bytes.extend(&self.message_identifier.to_be_bytes());
		bytes.extend(&self.secret.0);
		bytes
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

/// Message used when a lock expires.
///
/// For this message to be valid the balance proof has to be updated to:
///
/// - Remove the expired lock from the pending locks and reflect it in the locksroot.
/// - Decrease the locked_amount by exactly lock.amount.
/// - Leave the transferred_amount untouched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LockExpired {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub channel_identifier: ChannelIdentifier,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub nonce: Nonce,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub transferred_amount: TokenAmount,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub locked_amount: LockedAmount,
	pub locksroot: Locksroot,
	pub recipient: Address,
	pub secrethash: SecretHash,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl_balance_proof_message!(LockExpired);

impl SignedMessage for LockExpired {
	fn bytes_to_sign(&self) -> Vec<u8> {
		balance_proof_bytes(self)
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

impl SignedEnvelopeMessage for LockExpired {
	fn message_hash(&self) -> H256 {
		let mut res: Vec<u8> = Vec::new();
		res.push(CmdId::LockExpired as u8);
		res.extend_from_slice(&self.message_identifier.to_be_bytes());
		res.extend_from_slice(self.recipient.as_bytes());
		res.extend_from_slice(self.secrethash.as_bytes());
		H256::from_slice(&keccak256(&res))
	}
}

/// Message used to successfully unlock a lock.
///
/// For this message to be valid the balance proof has to be updated to:
///
/// - Remove the successful lock from the pending locks and decrement the locked_amount by the lock's
///   amount, otherwise the sender will pay twice.
/// - Increase the transferred_amount, otherwise the recipient will reject it because it was not
///   paid.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Unlock {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub payment_identifier: PaymentIdentifier,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub channel_identifier: ChannelIdentifier,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub nonce: Nonce,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub transferred_amount: TokenAmount,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub locked_amount: LockedAmount,
	pub locksroot: Locksroot,
	pub secret: Secret,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl Unlock {
	pub fn secrethash(&self) -> SecretHash {
		hash_secret(&self.secret.0)
	}
}

impl_balance_proof_message!(Unlock);

impl SignedMessage for Unlock {
	fn bytes_to_sign(&self) -> Vec<u8> {
		balance_proof_bytes(self)
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

impl SignedEnvelopeMessage for Unlock {
	fn message_hash(&self) -> H256 {
		let mut res: Vec<u8> = Vec::new();
		res.push(CmdId::Unlock as u8);
		res.extend_from_slice(&self.message_identifier.to_be_bytes());
		res.extend_from_slice(&self.payment_identifier.as_bytes());
		res.extend_from_slice(&self.secret.0);
		H256::from_slice(&keccak256(&res))
	}
}

/// The lock a locked transfer carries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Lock {
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub amount: TokenAmount,
	pub expiration: BlockExpiration,
	pub secrethash: SecretHash,
}

impl Lock {
	/// Encoding of the lock as it enters the locksroot.
	pub fn as_bytes(&self) -> Vec<u8> {
		let mut amount = [0u8; 32];
		self.amount.to_big_endian(&mut amount);

		let mut bytes = vec![];
		bytes.extend(self.expiration.to_be_bytes());
		bytes.extend(&amount);
		bytes.extend(self.secrethash.as_bytes());
		bytes
	}
}

/// A transfer which signs that the partner can claim `locked_amount` if she knows the secret to
/// `secrethash`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LockedTransfer {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	pub payment_identifier: PaymentIdentifier,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub channel_identifier: ChannelIdentifier,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub nonce: Nonce,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub transferred_amount: TokenAmount,
	#[serde(deserialize_with = "u256_from_str", serialize_with = "u256_to_str")]
	pub locked_amount: LockedAmount,
	pub locksroot: Locksroot,
	pub token: TokenAddress,
	pub recipient: Address,
	pub target: Address,
	pub initiator: Address,
	pub lock: Lock,
	pub metadata: Metadata,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl LockedTransfer {
	/// Hash over the transfer fields outside of the balance proof, for the given command.
	fn hash_with_cmd(&self, cmd_id: CmdId) -> H256 {
		let mut amount = [0u8; 32];
		self.lock.amount.to_big_endian(&mut amount);

		let mut res: Vec<u8> = Vec::new();
		res.push(cmd_id as u8);
		res.extend_from_slice(&self.message_identifier.to_be_bytes());
		res.extend_from_slice(&self.payment_identifier.as_bytes());
		res.extend_from_slice(&self.lock.expiration.to_be_bytes());
		res.extend_from_slice(self.token.as_bytes());
		res.extend_from_slice(self.recipient.as_bytes());
		res.extend_from_slice(self.target.as_bytes());
		res.extend_from_slice(self.initiator.as_bytes());
		res.extend_from_slice(self.lock.secrethash.as_bytes());
		res.extend_from_slice(&amount);
		res.extend_from_slice(self.metadata.hash().as_bytes());
		H256::from_slice(&keccak256(&res))
	}
}

impl_balance_proof_message!(LockedTransfer);

impl SignedMessage for LockedTransfer {
	fn bytes_to_sign(&self) -> Vec<u8> {
		balance_proof_bytes(self)
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

impl SignedEnvelopeMessage for LockedTransfer {
	fn message_hash(&self) -> H256 {
		self.hash_with_cmd(CmdId::LockedTransfer)
	}
}

/// A locked transfer sent back to the payer when the payee cannot forward it.
#[derive(Clone, Debug, Deref, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefundTransfer {
	pub transfer: LockedTransfer,
}

impl super::BalanceProofMessage for RefundTransfer {
	fn nonce(&self) -> Nonce {
		self.transfer.nonce
	}

	fn transferred_amount(&self) -> TokenAmount {
		self.transfer.transferred_amount
	}

	fn locked_amount(&self) -> LockedAmount {
		self.transfer.locked_amount
	}

	fn locksroot(&self) -> Locksroot {
		self.transfer.locksroot
	}

	fn canonical_identifier(&self) -> raiden_light_primitives::types::CanonicalIdentifier {
		super::BalanceProofMessage::canonical_identifier(&self.transfer)
	}
}

impl SignedMessage for RefundTransfer {
	fn bytes_to_sign(&self) -> Vec<u8> {
		balance_proof_bytes(self)
	}

	fn signature(&self) -> &Signature {
		&self.transfer.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.transfer.signature = signature;
	}
}

impl SignedEnvelopeMessage for RefundTransfer {
	fn message_hash(&self) -> H256 {
		self.transfer.hash_with_cmd(CmdId::RefundTransfer)
	}
}
