use raiden_light_blockchain::errors::{
	ChainWatcherError,
	SignerError,
	TransactionError,
};
use raiden_light_state_machine::{
	errors::{
		ErrorCode,
		StateTransitionError,
	},
	types::Meta,
};
use raiden_light_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StateManagerError {
	#[error("Invalid snapshot: `{0}`")]
	Snapshot(String),
	#[error("Storage error: `{0}`")]
	Storage(String),
	#[error("Snapshot belongs to `{found:#x}`, expected `{expected:#x}`")]
	AddressMismatch {
		expected: raiden_light_primitives::types::Address,
		found: raiden_light_primitives::types::Address,
	},
}

impl From<StateTransitionError> for StateManagerError {
	fn from(e: StateTransitionError) -> Self {
		Self::Snapshot(e.msg)
	}
}

#[derive(Error, Debug, Clone)]
pub enum EngineError {
	#[error("Invalid configuration: `{0}`")]
	Config(String),
	#[error("Engine is not running")]
	Stopped,
	#[error("Task failed: `{0}`")]
	Task(String),
	#[error("Rejected ({code}) on {meta}: `{reason}`")]
	Rejected { meta: Meta, code: ErrorCode, reason: String },
	#[error(transparent)]
	StateManager(#[from] StateManagerError),
	#[error(transparent)]
	Signer(#[from] SignerError),
	#[error(transparent)]
	Transaction(#[from] TransactionError),
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error(transparent)]
	ChainWatcher(#[from] ChainWatcherError),
}
