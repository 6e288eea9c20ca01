use raiden_light_messages::messages::{
	BalanceProofMessage,
	LockExpired,
	LockedTransfer,
	SignedMessage,
	Unlock,
	WithdrawConfirmation,
	WithdrawExpired,
	WithdrawRequest,
};
use raiden_light_primitives::types::{
	Address,
	BlockExpiration,
	BlockNumber,
	CanonicalIdentifier,
	Nonce,
	TokenAmount,
};

use super::utils::{
	compute_locked_amount,
	compute_locks_with,
	compute_locks_without,
	compute_locksroot,
};
use crate::{
	errors::{
		ErrorCode,
		RejectWith,
		Rejection,
	},
	types::{
		ChannelEndState,
		ChannelState,
		ChannelStatus,
		HashTimeLockState,
		PendingWithdrawState,
	},
	views,
};

pub(crate) fn is_valid_signature<M: SignedMessage>(
	message: &M,
	sender_address: Address,
) -> Result<(), String> {
	let signer = message.signer().map_err(|e| format!("Could not recover signer: {}", e))?;
	if signer != sender_address {
		return Err(format!(
			"Message signed by {:#x}, expected {:#x}",
			signer, sender_address
		))
	}
	Ok(())
}

pub(crate) fn is_channel_open(channel: &ChannelState) -> Result<(), String> {
	if channel.status != ChannelStatus::Open {
		return Err(format!("Channel {} is {}, not Open", channel.key(), channel.status))
	}
	Ok(())
}

pub(crate) fn is_valid_channel_identity(
	channel: &ChannelState,
	canonical_identifier: &CanonicalIdentifier,
) -> Result<(), String> {
	match channel.canonical_identifier() {
		Some(ours) if ours == *canonical_identifier => Ok(()),
		Some(ours) => Err(format!(
			"Message is for channel {} on {:#x}, expected channel {} on {:#x}",
			canonical_identifier.channel_identifier,
			canonical_identifier.token_network_address,
			ours.channel_identifier,
			ours.token_network_address,
		)),
		None => Err(format!("Channel {} is not open on-chain yet", channel.key())),
	}
}

pub(crate) fn is_valid_nonce(end_state: &ChannelEndState, nonce: Nonce) -> Result<(), String> {
	let expected = end_state.next_nonce();
	if nonce != expected {
		return Err(format!("Nonce did not change sequentially, expected: {} got: {}", expected, nonce))
	}
	Ok(())
}

/// Check a balance proof commits to exactly `locks` and `transferred_amount`.
pub(crate) fn is_valid_balance_proof<M: BalanceProofMessage>(
	channel: &ChannelState,
	sender_end: &ChannelEndState,
	message: &M,
	locks: &[HashTimeLockState],
	transferred_amount: TokenAmount,
) -> Result<(), Rejection> {
	is_valid_channel_identity(channel, &message.canonical_identifier())
		.reject_with(ErrorCode::InvalidChannelState)?;
	is_valid_nonce(sender_end, message.nonce()).reject_with(ErrorCode::InvalidNonce)?;

	if message.transferred_amount() != transferred_amount {
		return Err(Rejection::new(
			ErrorCode::InvalidTransferredAmount,
			format!(
				"Transferred amount is {}, expected {}",
				message.transferred_amount(),
				transferred_amount
			),
		))
	}

	let locked_amount = compute_locked_amount(locks);
	if message.locked_amount() != locked_amount {
		return Err(Rejection::new(
			ErrorCode::InvalidLockedAmount,
			format!("Locked amount is {}, expected {}", message.locked_amount(), locked_amount),
		))
	}

	let locksroot = compute_locksroot(locks);
	if message.locksroot() != locksroot {
		return Err(Rejection::new(
			ErrorCode::InvalidLocksroot,
			format!("Locksroot is {:#x}, expected {:#x}", message.locksroot(), locksroot),
		))
	}

	Ok(())
}

/// Validate a locked transfer from `sender_end` and return the sender's new pending locks.
pub(crate) fn is_valid_locked_transfer(
	channel: &ChannelState,
	sender_end: &ChannelEndState,
	receiver_end: &ChannelEndState,
	message: &LockedTransfer,
	block_number: BlockNumber,
) -> Result<Vec<HashTimeLockState>, Rejection> {
	is_channel_open(channel).reject_with(ErrorCode::ChannelNotOpen)?;
	is_valid_signature(message, sender_end.address).reject_with(ErrorCode::InvalidSignature)?;

	if message.recipient != receiver_end.address {
		return Err(Rejection::new(
			ErrorCode::InvalidBalanceProof,
			format!("Transfer addressed to {:#x}, expected {:#x}", message.recipient, receiver_end.address),
		))
	}

	let lock = HashTimeLockState::from(&message.lock);
	if lock.amount.is_zero() {
		return Err(Rejection::new(ErrorCode::InvalidAmount, "Lock amount must be positive"))
	}
	if block_number >= lock.expiration {
		return Err(Rejection::new(
			ErrorCode::LockExpired,
			format!("Lock expired at block {}, current block {}", lock.expiration, block_number),
		))
	}

	let distributable = views::channel_distributable(sender_end, receiver_end);
	if lock.amount > distributable {
		return Err(Rejection::new(
			ErrorCode::InsufficientCapacity,
			format!("Lock amount {} exceeds distributable {}", lock.amount, distributable),
		))
	}

	let locks = compute_locks_with(&sender_end.pending_locks, lock).ok_or_else(|| {
		Rejection::new(ErrorCode::TransferConflict, "A lock with this secrethash is already pending")
	})?;
	is_valid_balance_proof(channel, sender_end, message, &locks, sender_end.transferred_amount())?;

	Ok(locks)
}

/// Validate an unlock from `sender_end` and return the sender's remaining pending locks.
pub(crate) fn is_valid_unlock(
	channel: &ChannelState,
	sender_end: &ChannelEndState,
	message: &Unlock,
) -> Result<Vec<HashTimeLockState>, Rejection> {
	is_valid_signature(message, sender_end.address).reject_with(ErrorCode::InvalidSignature)?;

	let secrethash = message.secrethash();
	let lock = sender_end.lock(&secrethash).ok_or_else(|| {
		Rejection::new(ErrorCode::TransferNotFound, format!("No pending lock for {:#x}", secrethash))
	})?;
	let transferred_amount = sender_end.transferred_amount().saturating_add(lock.amount);
	let locks = compute_locks_without(&sender_end.pending_locks, &secrethash).unwrap_or_default();
	is_valid_balance_proof(channel, sender_end, message, &locks, transferred_amount)?;

	Ok(locks)
}

/// Validate a lock expiration from `sender_end` and return the sender's remaining pending locks.
pub(crate) fn is_valid_lock_expired(
	channel: &ChannelState,
	sender_end: &ChannelEndState,
	receiver_end: &ChannelEndState,
	message: &LockExpired,
	block_number: BlockNumber,
) -> Result<Vec<HashTimeLockState>, Rejection> {
	is_valid_signature(message, sender_end.address).reject_with(ErrorCode::InvalidSignature)?;

	if message.recipient != receiver_end.address {
		return Err(Rejection::new(
			ErrorCode::InvalidBalanceProof,
			format!("Lock expiry addressed to {:#x}", message.recipient),
		))
	}

	let lock = sender_end.lock(&message.secrethash).ok_or_else(|| {
		Rejection::new(
			ErrorCode::TransferNotFound,
			format!("No pending lock for {:#x}", message.secrethash),
		)
	})?;
	if block_number <= lock.expiration {
		return Err(Rejection::new(
			ErrorCode::LockNotExpired,
			format!("Lock expires at block {}, current block {}", lock.expiration, block_number),
		))
	}

	let locks =
		compute_locks_without(&sender_end.pending_locks, &message.secrethash).unwrap_or_default();
	is_valid_balance_proof(channel, sender_end, message, &locks, sender_end.transferred_amount())?;

	Ok(locks)
}

/// Validate a withdraw request signed by `sender_end`.
pub(crate) fn is_valid_withdraw_request(
	channel: &ChannelState,
	sender_end: &ChannelEndState,
	receiver_end: &ChannelEndState,
	message: &WithdrawRequest,
	min_expiration: BlockExpiration,
) -> Result<(), Rejection> {
	is_channel_open(channel).reject_with(ErrorCode::ChannelNotOpen)?;
	is_valid_signature(message, sender_end.address).reject_with(ErrorCode::InvalidSignature)?;
	if message.participant != sender_end.address {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("Withdraw for {:#x} signed by {:#x}", message.participant, sender_end.address),
		))
	}
	is_valid_channel_identity(channel, &message.canonical_identifier())
		.reject_with(ErrorCode::InvalidChannelState)?;
	is_valid_nonce(sender_end, message.nonce).reject_with(ErrorCode::InvalidNonce)?;
	is_valid_total_withdraw(sender_end, receiver_end, message.total_withdraw)?;

	if message.expiration < min_expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!("Withdraw expires at {}, must be at least {}", message.expiration, min_expiration),
		))
	}

	Ok(())
}

pub(crate) fn is_valid_total_withdraw(
	sender_end: &ChannelEndState,
	receiver_end: &ChannelEndState,
	total_withdraw: TokenAmount,
) -> Result<(), Rejection> {
	if total_withdraw <= sender_end.total_withdraw() {
		return Err(Rejection::new(
			ErrorCode::InvalidWithdraw,
			format!(
				"Total withdraw {} must exceed the current {}",
				total_withdraw,
				sender_end.total_withdraw()
			),
		))
	}

	let max_total_withdraw = views::max_total_withdraw(sender_end, receiver_end);
	if total_withdraw > max_total_withdraw {
		return Err(Rejection::new(
			ErrorCode::InsufficientWithdrawable,
			format!("Total withdraw {} exceeds the maximum {}", total_withdraw, max_total_withdraw),
		))
	}

	Ok(())
}

/// Validate `confirming_end`'s confirmation of a pending withdraw request.
pub(crate) fn is_valid_withdraw_confirmation(
	channel: &ChannelState,
	confirming_end: &ChannelEndState,
	pending: &PendingWithdrawState,
	message: &WithdrawConfirmation,
	block_number: BlockNumber,
) -> Result<(), Rejection> {
	is_valid_signature(message, confirming_end.address).reject_with(ErrorCode::InvalidSignature)?;
	if message.participant != pending.request.participant {
		return Err(Rejection::new(
			ErrorCode::InvalidWithdraw,
			format!("Confirmation is for participant {:#x}", message.participant),
		))
	}
	if message.expiration != pending.expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!(
				"Confirmation expires at {}, request expires at {}",
				message.expiration, pending.expiration
			),
		))
	}
	if block_number > pending.expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!("Withdraw expired at block {}", pending.expiration),
		))
	}
	is_valid_channel_identity(channel, &message.canonical_identifier())
		.reject_with(ErrorCode::InvalidChannelState)?;
	is_valid_nonce(confirming_end, message.nonce).reject_with(ErrorCode::InvalidNonce)?;

	Ok(())
}

/// Validate `sender_end`'s expiration of its own pending withdraw request.
pub(crate) fn is_valid_withdraw_expired(
	channel: &ChannelState,
	sender_end: &ChannelEndState,
	pending: &PendingWithdrawState,
	message: &WithdrawExpired,
	block_number: BlockNumber,
) -> Result<(), Rejection> {
	is_valid_signature(message, sender_end.address).reject_with(ErrorCode::InvalidSignature)?;
	if message.participant != sender_end.address || message.expiration != pending.expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidWithdraw,
			"Withdraw expiry does not match the pending request",
		))
	}
	if block_number <= pending.expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!("Withdraw expires at block {}, current block {}", pending.expiration, block_number),
		))
	}
	is_valid_channel_identity(channel, &message.canonical_identifier())
		.reject_with(ErrorCode::InvalidChannelState)?;
	is_valid_nonce(sender_end, message.nonce).reject_with(ErrorCode::InvalidNonce)?;

	Ok(())
}
