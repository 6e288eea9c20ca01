use serde_json::Value;

use crate::{
	errors::MessageError,
	messages::Message,
};

/// Message kinds the decoder accepts in the `type` field.
const KNOWN_TYPES: [&str; 12] = [
	"LockedTransfer",
	"RefundTransfer",
	"SecretRequest",
	"RevealSecret",
	"SecretReveal",
	"Unlock",
	"LockExpired",
	"WithdrawRequest",
	"WithdrawConfirmation",
	"WithdrawExpired",
	"Processed",
	"Delivered",
];

pub struct MessageDecoder;

impl MessageDecoder {
	/// Decode a message from its JSON body.
	///
	/// The body may also arrive as a JSON string wrapping the encoded message.
	pub fn decode(body: Value) -> Result<Message, MessageError> {
		let body = match body {
			Value::String(s) =>
				serde_json::from_str(&s).map_err(|e| MessageError::Decode(format!("{}", e)))?,
			value => value,
		};

		let message_type = body
			.get("type")
			.and_then(|t| t.as_str())
			.ok_or_else(|| MessageError::Decode("Message has no type".to_owned()))?;
		if !KNOWN_TYPES.contains(&message_type) {
			return Err(MessageError::UnknownType(message_type.to_owned()))
		}

		serde_json::from_value(body).map_err(|e| MessageError::Decode(format!("{}", e)))
	}
}

impl Message {
	/// Encode into the JSON wire format.
	pub fn encode(&self) -> Result<String, MessageError> {
		serde_json::to_string(self).map_err(|e| MessageError::Encode(format!("{}", e)))
	}

	/// Decode from the JSON wire format.
	pub fn decode(data: &str) -> Result<Message, MessageError> {
		let body: Value =
			serde_json::from_str(data).map_err(|e| MessageError::Decode(format!("{}", e)))?;
		MessageDecoder::decode(body)
	}
}
