use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	deserializers::{
		signature_from_str,
		u64_from_str,
	},
	serializers::u64_to_str,
	types::{
		MessageIdentifier,
		Signature,
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

/// Acknowledges that a message changed the receiver's state.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Processed {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub message_identifier: MessageIdentifier,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl Processed {
	pub fn new(message_identifier: MessageIdentifier) -> Self {
		Self { message_identifier, signature: EMPTY_SIGNATURE.clone() }
	}
}

impl SignedMessage for Processed {
	fn bytes_to_sign(&self) -> Vec<u8> {
		let cmd_id: [u8; 1] = CmdId::Processed.into();

		let mut bytes = vec![];
		bytes.extend_from_slice(&cmd_id);
		bytes.extend_from_slice(&[0, 0, 0]);
		bytes.extend_from_slice(&self.message_identifier.to_be_bytes());
		bytes
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}

/// Acknowledges that a message reached the receiver.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Delivered {
	#[serde(deserialize_with = "u64_from_str", serialize_with = "u64_to_str")]
	pub delivered_message_identifier: MessageIdentifier,
	#[serde(deserialize_with = "signature_from_str")]
	pub signature: Signature,
}

impl Delivered {
	pub fn new(delivered_message_identifier: MessageIdentifier) -> Self {
		Self { delivered_message_identifier, signature: EMPTY_SIGNATURE.clone() }
	}
}

impl SignedMessage for Delivered {
	fn bytes_to_sign(&self) -> Vec<u8> {
		let cmd_id: [u8; 1] = CmdId::Delivered.into();

		let mut bytes = vec![];
		bytes.extend_from_slice(&cmd_id);
		bytes.extend_from_slice(&[0, 0, 0]);
		bytes.extend_from_slice(&self.delivered_message_identifier.to_be_bytes());
		bytes
	}

	fn signature(&self) -> &Signature {
		&self.signature
	}

	fn set_signature(&mut self, signature: Signature) {
		self.signature = signature;
	}
}
