use raiden_light_primitives::{
	hashing::hash_balance_data,
	packing::pack_balance_proof,
	signing,
	types::{
		Address,
		BalanceHash,
		CanonicalIdentifier,
		LockedAmount,
		Locksroot,
		MessageIdentifier,
		MessageTypeId,
		Nonce,
		Signature,
		TokenAmount,
		H256,
	},
};
use serde::{
	Deserialize,
	Serialize,
};

use crate::errors::MessageError;

/// Implement `BalanceProofMessage` for a message holding the balance proof fields directly.
macro_rules! impl_balance_proof_message {
	($message:ty) => {
		impl $crate::messages::BalanceProofMessage for $message {
			fn nonce(&self) -> raiden_light_primitives::types::Nonce {
				self.nonce
			}

			fn transferred_amount(&self) -> raiden_light_primitives::types::TokenAmount {
				self.transferred_amount
			}

			fn locked_amount(&self) -> raiden_light_primitives::types::LockedAmount {
				self.locked_amount
			}

			fn locksroot(&self) -> raiden_light_primitives::types::Locksroot {
				self.locksroot
			}

			fn canonical_identifier(&self) -> raiden_light_primitives::types::CanonicalIdentifier {
				raiden_light_primitives::types::CanonicalIdentifier {
					chain_identifier: self.chain_id,
					token_network_address: self.token_network_address,
					channel_identifier: self.channel_identifier,
				}
			}
		}
	};
}

mod metadata;
mod synchronization;
mod transfer;
mod withdraw;

pub use metadata::*;
pub use synchronization::*;
pub use transfer::*;
pub use withdraw::*;

/// Command identifiers prefixing the signed data of each message kind.
#[derive(Copy, Clone, Debug)]
pub enum CmdId {
	Processed = 0,
	SecretRequest = 3,
	Unlock = 4,
	LockedTransfer = 7,
	RefundTransfer = 8,
	RevealSecret = 11,
	Delivered = 12,
	LockExpired = 13,
	WithdrawExpired = 17,
}

impl From<CmdId> for [u8; 1] {
	fn from(cmd_id: CmdId) -> Self {
		(cmd_id as u8).to_be_bytes()
	}
}

/// A protocol message as it travels on the wire.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
	LockedTransfer(LockedTransfer),
	RefundTransfer(RefundTransfer),
	SecretRequest(SecretRequest),
	#[serde(rename = "RevealSecret", alias = "SecretReveal")]
	SecretReveal(SecretReveal),
	Unlock(Unlock),
	LockExpired(LockExpired),
	WithdrawRequest(WithdrawRequest),
	WithdrawConfirmation(WithdrawConfirmation),
	WithdrawExpired(WithdrawExpired),
	Processed(Processed),
	Delivered(Delivered),
}

impl Message {
	pub fn type_name(&self) -> &'static str {
		match self {
			Message::LockedTransfer(_) => "LockedTransfer",
			Message::RefundTransfer(_) => "RefundTransfer",
			Message::SecretRequest(_) => "SecretRequest",
			Message::SecretReveal(_) => "SecretReveal",
			Message::Unlock(_) => "Unlock",
			Message::LockExpired(_) => "LockExpired",
			Message::WithdrawRequest(_) => "WithdrawRequest",
			Message::WithdrawConfirmation(_) => "WithdrawConfirmation",
			Message::WithdrawExpired(_) => "WithdrawExpired",
			Message::Processed(_) => "Processed",
			Message::Delivered(_) => "Delivered",
		}
	}

	/// The identifier acknowledgements refer back to, absent for the acknowledgements themselves.
	pub fn message_identifier(&self) -> Option<MessageIdentifier> {
		match self {
			Message::LockedTransfer(m) => Some(m.message_identifier),
			Message::RefundTransfer(m) => Some(m.message_identifier),
			Message::SecretRequest(m) => Some(m.message_identifier),
			Message::SecretReveal(m) => Some(m.message_identifier),
			Message::Unlock(m) => Some(m.message_identifier),
			Message::LockExpired(m) => Some(m.message_identifier),
			Message::WithdrawRequest(m) => Some(m.message_identifier),
			Message::WithdrawConfirmation(m) => Some(m.message_identifier),
			Message::WithdrawExpired(m) => Some(m.message_identifier),
			Message::Processed(_) | Message::Delivered(_) => None,
		}
	}

	/// The message the variant wraps, as a signed message.
	fn inner(&self) -> &dyn SignedMessage {
		match self {
			Message::LockedTransfer(m) => m,
			Message::RefundTransfer(m) => m,
			Message::SecretRequest(m) => m,
			Message::SecretReveal(m) => m,
			Message::Unlock(m) => m,
			Message::LockExpired(m) => m,
			Message::WithdrawRequest(m) => m,
			Message::WithdrawConfirmation(m) => m,
			Message::WithdrawExpired(m) => m,
			Message::Processed(m) => m,
			Message::Delivered(m) => m,
		}
	}
}

impl SignedMessage for Message {
	fn bytes_to_sign(&self) -> Vec<u8> {
		self.inner().bytes_to_sign()
	}

	fn signature(&self) -> &Signature {
		self.inner().signature()
	}

	fn set_signature(&mut self, signature: Signature) {
		match self {
			Message::LockedTransfer(m) => m.set_signature(signature),
			Message::RefundTransfer(m) => m.set_signature(signature),
			Message::SecretRequest(m) => m.set_signature(signature),
			Message::SecretReveal(m) => m.set_signature(signature),
			Message::Unlock(m) => m.set_signature(signature),
			Message::LockExpired(m) => m.set_signature(signature),
			Message::WithdrawRequest(m) => m.set_signature(signature),
			Message::WithdrawConfirmation(m) => m.set_signature(signature),
			Message::WithdrawExpired(m) => m.set_signature(signature),
			Message::Processed(m) => m.set_signature(signature),
			Message::Delivered(m) => m.set_signature(signature),
		}
	}
}

/// A message which carries a signature over its canonical encoding.
pub trait SignedMessage {
	/// The canonical bytes covered by the signature.
	fn bytes_to_sign(&self) -> Vec<u8>;

	fn signature(&self) -> &Signature;

	fn set_signature(&mut self, signature: Signature);

	/// Recover the address which produced the message signature.
	fn signer(&self) -> Result<Address, MessageError> {
		signing::recover(&self.bytes_to_sign(), &self.signature().0)
			.map_err(|e| MessageError::Recovery(format!("{:?}", e)))
	}

	/// Whether the message was signed by `expected`.
	fn is_signed_by(&self, expected: Address) -> bool {
		matches!(self.signer(), Ok(signer) if signer == expected)
	}
}

/// A signed message which commits to its content through an additional hash.
pub trait SignedEnvelopeMessage: SignedMessage {
	fn message_hash(&self) -> H256;
}

/// A message carrying a balance proof of its sender.
pub trait BalanceProofMessage: SignedEnvelopeMessage {
	fn nonce(&self) -> Nonce;

	fn transferred_amount(&self) -> TokenAmount;

	fn locked_amount(&self) -> LockedAmount;

	fn locksroot(&self) -> Locksroot;

	fn canonical_identifier(&self) -> CanonicalIdentifier;

	fn balance_hash(&self) -> BalanceHash {
		hash_balance_data(self.transferred_amount(), self.locked_amount(), self.locksroot())
	}
}

/// The bytes a sender signs for a balance proof message.
pub(crate) fn balance_proof_bytes<M: BalanceProofMessage + ?Sized>(message: &M) -> Vec<u8> {
	pack_balance_proof(
		message.nonce(),
		message.balance_hash(),
		message.message_hash(),
		&message.canonical_identifier(),
		MessageTypeId::BalanceProof,
	)
	.0
}
