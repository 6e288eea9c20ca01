use thiserror::Error;

/// Failures of encoding, decoding or verifying a protocol message.
#[derive(Error, Debug, Clone)]
pub enum MessageError {
	#[error("Could not decode message: `{0}`")]
	Decode(String),
	#[error("Could not encode message: `{0}`")]
	Encode(String),
	#[error("Unknown message type: `{0}`")]
	UnknownType(String),
	#[error("Could not recover signer: `{0}`")]
	Recovery(String),
}
