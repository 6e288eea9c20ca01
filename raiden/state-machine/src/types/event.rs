use raiden_light_macros::IntoEvent;
use raiden_light_primitives::types::{
	BlockNumber,
	MessageIdentifier,
	Secret,
	SecretHash,
};
use serde::{
	Deserialize,
	Serialize,
};

use crate::{
	errors::{
		ErrorCode,
		Rejection,
	},
	types::{
		ChannelKey,
		Meta,
		TransferKey,
	},
};

/// Facts the reducer reports next to the new state.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum Event {
	ErrorInvalidReceivedMessage(ErrorInvalidReceivedMessage),
	ErrorInvalidAction(ErrorInvalidAction),
	ChannelSettleable(ChannelSettleable),
	SecretLearned(SecretLearned),
	TransferChannelClosed(TransferChannelClosed),
}

impl Event {
	pub fn type_name(&self) -> &'static str {
		match self {
			Event::ErrorInvalidReceivedMessage(_) => "ErrorInvalidReceivedMessage",
			Event::ErrorInvalidAction(_) => "ErrorInvalidAction",
			Event::ChannelSettleable(_) => "ChannelSettleable",
			Event::SecretLearned(_) => "SecretLearned",
			Event::TransferChannelClosed(_) => "TransferChannelClosed",
		}
	}

	/// The error carried by the event, if it reports a rejection.
	pub fn error(&self) -> Option<(Meta, ErrorCode, &str)> {
		match self {
			Event::ErrorInvalidReceivedMessage(inner) =>
				Some((inner.meta, inner.code, inner.reason.as_str())),
			Event::ErrorInvalidAction(inner) => Some((inner.meta, inner.code, inner.reason.as_str())),
			_ => None,
		}
	}
}

/// A received message failed validation and was dropped.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ErrorInvalidReceivedMessage {
	pub meta: Meta,
	pub message_identifier: Option<MessageIdentifier>,
	pub code: ErrorCode,
	pub reason: String,
}

impl ErrorInvalidReceivedMessage {
	pub fn new(
		meta: Meta,
		message_identifier: Option<MessageIdentifier>,
		rejection: Rejection,
	) -> Self {
		Self { meta, message_identifier, code: rejection.code, reason: rejection.reason }
	}
}

/// A local action was refused.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ErrorInvalidAction {
	pub meta: Meta,
	pub code: ErrorCode,
	pub reason: String,
}

impl ErrorInvalidAction {
	pub fn new(meta: Meta, rejection: Rejection) -> Self {
		Self { meta, code: rejection.code, reason: rejection.reason }
	}
}

/// The settlement window of a closed channel was reached.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct ChannelSettleable {
	pub channel: ChannelKey,
	pub block_number: BlockNumber,
}

/// A secret became known for the first time.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct SecretLearned {
	pub secrethash: SecretHash,
	pub secret: Secret,
	pub registered_block: Option<BlockNumber>,
}

/// The channel of a pending transfer was closed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoEvent)]
pub struct TransferChannelClosed {
	pub key: TransferKey,
	/// The secret is known, so the lock can still be claimed on-chain.
	pub resolvable: bool,
}
