use thiserror::Error;

/// Signing failures.
#[derive(Error, Debug, Clone)]
pub enum SignerError {
	#[error("Could not load private key: `{0}`")]
	Key(String),
	#[error("Could not sign data: `{0}`")]
	Signing(String),
}

/// Failures of an on-chain transaction.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum TransactionError {
	/// The transaction may succeed if submitted again.
	#[error("Transient transaction failure: `{0}`")]
	Transient(String),
	/// The chain refused the transaction, submitting it again will not help.
	#[error("Transaction rejected: `{0}`")]
	Rejected(String),
	#[error("Fatal transaction failure: `{0}`")]
	Fatal(String),
}

impl TransactionError {
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transient(_))
	}
}

/// Failures of the chain event source.
#[derive(Error, Debug, Clone)]
pub enum ChainWatcherError {
	#[error("Chain source failure: `{0}`")]
	Source(String),
	#[error("Event `{0}` carries no block number")]
	MissingBlockNumber(&'static str),
}
