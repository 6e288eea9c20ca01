#![warn(clippy::missing_docs_in_private_items)]

use std::{
	error,
	fmt,
};

use derive_more::Display;
use serde::{
	Deserialize,
	Serialize,
};

/// The state transition error type.
#[derive(Debug, Clone)]
pub struct StateTransitionError {
	pub msg: String,
}

impl fmt::Display for StateTransitionError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.msg)
	}
}

impl error::Error for StateTransitionError {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		None
	}
}

impl From<String> for StateTransitionError {
	fn from(msg: String) -> Self {
		StateTransitionError { msg }
	}
}

/// Broad classes of failures, for callers which only care about the kind of problem.
#[derive(Copy, Clone, Display, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ErrorCategory {
	InvalidParameter,
	InsufficientFunds,
	ConflictingState,
	NotFound,
	Transient,
	Fatal,
}

/// Machine readable reason of a rejected state change.
#[derive(Copy, Clone, Display, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ErrorCode {
	ChannelNotFound,
	ChannelExists,
	ChannelNotOpen,
	InvalidChannelState,
	InvalidSignature,
	UnexpectedSender,
	InvalidNonce,
	InvalidBalanceProof,
	InvalidLocksroot,
	InvalidLockedAmount,
	InvalidTransferredAmount,
	InvalidAmount,
	InvalidPaymentIdentifier,
	InvalidExpiration,
	InsufficientCapacity,
	NoRoute,
	LockExpired,
	LockNotExpired,
	TransferNotFound,
	TransferConflict,
	TransferResolved,
	SecretMismatch,
	InvalidDeposit,
	InvalidWithdraw,
	InsufficientWithdrawable,
	WithdrawNotFound,
	WithdrawConflict,
	TransactionFailed,
}

impl ErrorCode {
	pub fn category(&self) -> ErrorCategory {
		match self {
			ErrorCode::InvalidSignature |
			ErrorCode::UnexpectedSender |
			ErrorCode::InvalidNonce |
			ErrorCode::InvalidBalanceProof |
			ErrorCode::InvalidLocksroot |
			ErrorCode::InvalidLockedAmount |
			ErrorCode::InvalidTransferredAmount |
			ErrorCode::InvalidAmount |
			ErrorCode::InvalidPaymentIdentifier |
			ErrorCode::InvalidExpiration |
			ErrorCode::SecretMismatch |
			ErrorCode::InvalidDeposit |
			ErrorCode::InvalidWithdraw => ErrorCategory::InvalidParameter,
			ErrorCode::InsufficientCapacity | ErrorCode::InsufficientWithdrawable =>
				ErrorCategory::InsufficientFunds,
			ErrorCode::ChannelExists |
			ErrorCode::ChannelNotOpen |
			ErrorCode::InvalidChannelState |
			ErrorCode::LockExpired |
			ErrorCode::LockNotExpired |
			ErrorCode::TransferConflict |
			ErrorCode::TransferResolved |
			ErrorCode::WithdrawConflict => ErrorCategory::ConflictingState,
			ErrorCode::ChannelNotFound |
			ErrorCode::NoRoute |
			ErrorCode::TransferNotFound |
			ErrorCode::WithdrawNotFound => ErrorCategory::NotFound,
			ErrorCode::TransactionFailed => ErrorCategory::Transient,
		}
	}
}

/// A state change the reducer refused to apply.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
	pub code: ErrorCode,
	pub reason: String,
}

impl Rejection {
	pub fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
		Self { code, reason: reason.into() }
	}
}

impl fmt::Display for Rejection {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}: {}", self.code, self.reason)
	}
}

/// Attach an error code to a validator's failure reason.
pub trait RejectWith<T> {
	fn reject_with(self, code: ErrorCode) -> Result<T, Rejection>;
}

impl<T> RejectWith<T> for Result<T, String> {
	fn reject_with(self, code: ErrorCode) -> Result<T, Rejection> {
		self.map_err(|reason| Rejection { code, reason })
	}
}
