#![warn(clippy::missing_docs_in_private_items)]

use raiden_light_messages::messages::{
	Lock,
	LockExpired,
	LockedTransfer,
	Metadata,
	Unlock,
};
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	hashing::{
		hash_message_identifier,
		hash_secret,
	},
	types::{
		Address,
		BlockExpiration,
		BlockNumber,
		SecretHash,
		TokenAmount,
	},
};

use super::{
	channel::{
		apply_balance_proof,
		get_channel,
		get_channel_mut,
		utils::{
			compute_locked_amount,
			compute_locks_with,
			compute_locks_without,
			compute_locksroot,
			u256_bytes,
		},
		validators,
	},
	secret::cache_secret,
	HandlerResult,
	Update,
};
use crate::{
	errors::{
		ErrorCode,
		RejectWith,
		Rejection,
	},
	types::{
		ActionInitTransfer,
		ActionLockExpiredSigned,
		ActionTransferClear,
		ActionTransferExpire,
		ActionTransferFailed,
		ActionTransferSigned,
		ActionUnlockSigned,
		ChainState,
		ChannelKey,
		ChannelState,
		ChannelStatus,
		HashTimeLockState,
		ReceiveLockExpired,
		ReceiveLockedTransfer,
		ReceiveTransferRefund,
		ReceiveUnlock,
		TransferChannelClosed,
		TransferDirection,
		TransferKey,
		TransferState,
	},
	views,
};

pub(super) fn get_transfer<'a>(
	chain_state: &'a ChainState,
	key: &TransferKey,
) -> Result<&'a TransferState, Rejection> {
	chain_state
		.transfers
		.get(key)
		.ok_or_else(|| Rejection::new(ErrorCode::TransferNotFound, format!("No transfer {}", key)))
}

pub(super) fn get_transfer_mut<'a>(
	chain_state: &'a mut ChainState,
	key: &TransferKey,
) -> Result<&'a mut TransferState, Rejection> {
	chain_state
		.transfers
		.get_mut(key)
		.ok_or_else(|| Rejection::new(ErrorCode::TransferNotFound, format!("No transfer {}", key)))
}

/// Whether off-chain unlocks and expirations may still be sent on the channel.
fn is_channel_usable(channel: &ChannelState) -> bool {
	matches!(channel.status, ChannelStatus::Open | ChannelStatus::Closing)
}

/// Validate a transfer intent and pick its channel, route and lock expiration.
fn validate_init_transfer(
	chain_state: &ChainState,
	state_change: &ActionInitTransfer,
) -> Result<(ChannelKey, Vec<Address>, BlockExpiration), Rejection> {
	if state_change.value.is_zero() {
		return Err(Rejection::new(ErrorCode::InvalidAmount, "Transfer value must be positive"))
	}
	if state_change.target == chain_state.our_address {
		return Err(Rejection::new(ErrorCode::NoRoute, "Cannot pay ourselves"))
	}
	if let Some(secret) = &state_change.secret {
		if hash_secret(&secret.0) != state_change.secrethash {
			return Err(Rejection::new(
				ErrorCode::SecretMismatch,
				format!("Secret does not hash to {:#x}", state_change.secrethash),
			))
		}
	}

	let amount = state_change.value.saturating_add(state_change.fee);
	let (channel_key, route) = views::select_route(
		chain_state,
		state_change.token_network_address,
		state_change.target,
		amount,
		&state_change.paths,
	)?;

	let channel = get_channel(chain_state, &channel_key)?;
	let lock_timeout = state_change.lock_timeout.unwrap_or(channel.reveal_timeout * 2);
	if lock_timeout <= channel.reveal_timeout || lock_timeout > channel.settle_timeout {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!(
				"Lock timeout {} must be above the reveal timeout {} and within the settle timeout {}",
				lock_timeout, channel.reveal_timeout, channel.settle_timeout
			),
		))
	}

	Ok((channel_key, route, chain_state.block_number + lock_timeout))
}

/// Build the locked transfer for a payment intent. Returns the unsigned message and the partner.
pub fn make_locked_transfer(
	chain_state: &ChainState,
	state_change: &ActionInitTransfer,
) -> Result<(LockedTransfer, Address), Rejection> {
	let (channel_key, route, expiration) = validate_init_transfer(chain_state, state_change)?;
	let channel = get_channel(chain_state, &channel_key)?;
	let canonical_identifier = channel.canonical_identifier().ok_or_else(|| {
		Rejection::new(ErrorCode::ChannelNotOpen, format!("Channel {} has no identifier", channel_key))
	})?;

	let lock = Lock {
		amount: state_change.value.saturating_add(state_change.fee),
		expiration,
		secrethash: state_change.secrethash,
	};
	let locks = compute_locks_with(&channel.our_state.pending_locks, HashTimeLockState::from(&lock))
		.ok_or_else(|| {
			Rejection::new(ErrorCode::TransferConflict, "A lock with this secrethash is already pending")
		})?;
	let nonce = channel.our_state.next_nonce();

	let transfer = LockedTransfer {
		message_identifier: hash_message_identifier(&[
			b"LockedTransfer",
			state_change.secrethash.as_bytes(),
			&u256_bytes(canonical_identifier.channel_identifier),
			&u256_bytes(nonce),
		]),
		payment_identifier: state_change.payment_identifier,
		chain_id: canonical_identifier.chain_identifier,
		token_network_address: canonical_identifier.token_network_address,
		channel_identifier: canonical_identifier.channel_identifier,
		nonce,
		transferred_amount: channel.our_state.transferred_amount(),
		locked_amount: compute_locked_amount(&locks),
		locksroot: compute_locksroot(&locks),
		token: channel.token_address,
		recipient: channel_key.partner,
		target: state_change.target,
		initiator: chain_state.our_address,
		lock,
		metadata: Metadata::new(vec![route]),
		signature: EMPTY_SIGNATURE.clone(),
	};
	Ok((transfer, channel_key.partner))
}

/// Build the unlock of a sent transfer whose secret is known.
pub fn make_unlock(chain_state: &ChainState, secrethash: SecretHash) -> Result<Unlock, Rejection> {
	let transfer = get_transfer(chain_state, &TransferKey::sent(secrethash))?;
	let secret = chain_state.secret(&secrethash).ok_or_else(|| {
		Rejection::new(ErrorCode::SecretMismatch, format!("Secret of {:#x} is unknown", secrethash))
	})?;
	let channel = get_channel(chain_state, &transfer.channel_key())?;
	if !is_channel_usable(channel) {
		return Err(Rejection::new(ErrorCode::ChannelNotOpen, "Channel no longer accepts unlocks"))
	}
	let canonical_identifier = channel.canonical_identifier().ok_or_else(|| {
		Rejection::new(ErrorCode::ChannelNotOpen, "Channel has no identifier")
	})?;
	let lock = channel.our_state.lock(&secrethash).ok_or_else(|| {
		Rejection::new(ErrorCode::TransferResolved, "Lock is no longer pending")
	})?;

	let locks =
		compute_locks_without(&channel.our_state.pending_locks, &secrethash).unwrap_or_default();
	let nonce = channel.our_state.next_nonce();
	Ok(Unlock {
		message_identifier: hash_message_identifier(&[
			b"Unlock",
			secrethash.as_bytes(),
			&u256_bytes(canonical_identifier.channel_identifier),
			&u256_bytes(nonce),
		]),
		payment_identifier: transfer.transfer.payment_identifier,
		chain_id: canonical_identifier.chain_identifier,
		token_network_address: canonical_identifier.token_network_address,
		channel_identifier: canonical_identifier.channel_identifier,
		nonce,
		transferred_amount: channel.our_state.transferred_amount().saturating_add(lock.amount),
		locked_amount: compute_locked_amount(&locks),
		locksroot: compute_locksroot(&locks),
		secret: secret.clone(),
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// Build the lock expiration of a sent transfer.
pub fn make_lock_expired(
	chain_state: &ChainState,
	secrethash: SecretHash,
) -> Result<LockExpired, Rejection> {
	let transfer = get_transfer(chain_state, &TransferKey::sent(secrethash))?;
	let channel = get_channel(chain_state, &transfer.channel_key())?;
	let canonical_identifier = channel.canonical_identifier().ok_or_else(|| {
		Rejection::new(ErrorCode::ChannelNotOpen, "Channel has no identifier")
	})?;
	let locks = compute_locks_without(&channel.our_state.pending_locks, &secrethash)
		.ok_or_else(|| Rejection::new(ErrorCode::TransferResolved, "Lock is no longer pending"))?;
	let nonce = channel.our_state.next_nonce();

	Ok(LockExpired {
		message_identifier: hash_message_identifier(&[
			b"LockExpired",
			secrethash.as_bytes(),
			&u256_bytes(canonical_identifier.channel_identifier),
			&u256_bytes(nonce),
		]),
		chain_id: canonical_identifier.chain_identifier,
		token_network_address: canonical_identifier.token_network_address,
		channel_identifier: canonical_identifier.channel_identifier,
		nonce,
		transferred_amount: channel.our_state.transferred_amount(),
		locked_amount: compute_locked_amount(&locks),
		locksroot: compute_locksroot(&locks),
		recipient: channel.partner_state.address,
		secrethash,
		signature: EMPTY_SIGNATURE.clone(),
	})
}

pub(super) fn handle_action_init_transfer(
	chain_state: &mut ChainState,
	state_change: ActionInitTransfer,
) -> HandlerResult {
	if let Some(transfer) = chain_state.transfers.get(&TransferKey::sent(state_change.secrethash)) {
		if transfer.transfer.target == state_change.target && transfer.value() == state_change.value {
			return Ok(Update::noop())
		}
		return Err(Rejection::new(
			ErrorCode::TransferConflict,
			"Another transfer with this secrethash was already sent",
		))
	}

	validate_init_transfer(chain_state, &state_change)?;
	let mut update = match state_change.secret {
		Some(secret) => cache_secret(chain_state, state_change.secrethash, secret, None),
		None => Update::noop(),
	};
	// Our own secret is not news.
	update.events.clear();
	Ok(update)
}

pub(super) fn handle_action_transfer_signed(
	chain_state: &mut ChainState,
	state_change: ActionTransferSigned,
) -> HandlerResult {
	let message = state_change.message;
	let key = TransferKey::sent(message.lock.secrethash);
	if let Some(transfer) = chain_state.transfers.get(&key) {
		if transfer.transfer == message {
			return Ok(Update::noop())
		}
		return Err(Rejection::new(
			ErrorCode::TransferConflict,
			"Another transfer with this secrethash was already sent",
		))
	}
	if message.initiator != chain_state.our_address {
		return Err(Rejection::new(ErrorCode::UnexpectedSender, "We can only send our own transfers"))
	}

	let channel_key = ChannelKey::new(message.token_network_address, state_change.partner);
	let channel = get_channel(chain_state, &channel_key)?;
	let block_number = chain_state.block_number;
	let expiration = message.lock.expiration;
	if expiration <= block_number + channel.reveal_timeout ||
		expiration > block_number + channel.settle_timeout
	{
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!("Lock expiration {} is unsafe at block {}", expiration, block_number),
		))
	}
	let locks = validators::is_valid_locked_transfer(
		channel,
		&channel.our_state,
		&channel.partner_state,
		&message,
		block_number,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	apply_balance_proof(&mut channel.our_state, &message, locks);
	chain_state.transfers.insert(
		key,
		TransferState::new(TransferDirection::Sent, message, state_change.fee, state_change.partner),
	);
	Ok(Update::changed())
}

/// Check a sent transfer's lock can be expired, without touching the state.
pub(super) fn handle_action_transfer_expire(
	chain_state: &mut ChainState,
	state_change: ActionTransferExpire,
) -> HandlerResult {
	let transfer = get_transfer(chain_state, &TransferKey::sent(state_change.secrethash))?;
	if transfer.expired.is_some() {
		return Ok(Update::noop())
	}
	if transfer.unlock.is_some() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer was already unlocked"))
	}
	let channel = get_channel(chain_state, &transfer.channel_key())?;
	if !is_channel_usable(channel) {
		return Err(Rejection::new(ErrorCode::ChannelNotOpen, "Channel no longer accepts expirations"))
	}
	if channel.our_state.lock(&state_change.secrethash).is_none() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Lock is no longer pending"))
	}
	if chain_state.block_number <= transfer.expiration {
		return Err(Rejection::new(
			ErrorCode::LockNotExpired,
			format!("Lock expires at {}, current block {}", transfer.expiration, chain_state.block_number),
		))
	}
	Ok(Update::noop())
}

pub(super) fn handle_action_lock_expired_signed(
	chain_state: &mut ChainState,
	state_change: ActionLockExpiredSigned,
) -> HandlerResult {
	let key = TransferKey::sent(state_change.secrethash);
	let message = state_change.message;
	let transfer = get_transfer(chain_state, &key)?;
	match &transfer.expired {
		Some(expired) if *expired == message => return Ok(Update::noop()),
		Some(_) => return Err(Rejection::new(ErrorCode::TransferConflict, "Lock already expired")),
		None => {},
	}
	if transfer.unlock.is_some() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer was already unlocked"))
	}
	if message.secrethash != key.secrethash {
		return Err(Rejection::new(ErrorCode::SecretMismatch, "Expiration is for another lock"))
	}

	let channel_key = transfer.channel_key();
	let channel = get_channel(chain_state, &channel_key)?;
	if !is_channel_usable(channel) {
		return Err(Rejection::new(ErrorCode::ChannelNotOpen, "Channel no longer accepts expirations"))
	}
	let locks = validators::is_valid_lock_expired(
		channel,
		&channel.our_state,
		&channel.partner_state,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	apply_balance_proof(&mut channel.our_state, &message, locks);
	get_transfer_mut(chain_state, &key)?.expired = Some(message);
	Ok(Update::changed())
}

/// Apply our unlock. Unlocks for gone channels or expired locks are dropped silently.
pub(super) fn handle_action_unlock_signed(
	chain_state: &mut ChainState,
	state_change: ActionUnlockSigned,
) -> HandlerResult {
	let key = TransferKey::sent(state_change.secrethash);
	let message = state_change.message;
	let transfer = get_transfer(chain_state, &key)?;
	match &transfer.unlock {
		Some(unlock) if *unlock == message => return Ok(Update::noop()),
		Some(_) => return Err(Rejection::new(ErrorCode::TransferConflict, "Transfer already unlocked")),
		None => {},
	}
	if message.secrethash() != key.secrethash {
		return Err(Rejection::new(ErrorCode::SecretMismatch, "Unlock is for another lock"))
	}
	if transfer.expired.is_some() || chain_state.block_number > transfer.expiration {
		return Ok(Update::noop())
	}

	let channel_key = transfer.channel_key();
	let channel = match chain_state.channels.get(&channel_key) {
		Some(channel) if is_channel_usable(channel) => channel,
		_ => return Ok(Update::noop()),
	};
	let locks = validators::is_valid_unlock(channel, &channel.our_state, &message)?;

	let secret = message.secret.clone();
	let channel = get_channel_mut(chain_state, &channel_key)?;
	apply_balance_proof(&mut channel.our_state, &message, locks);
	get_transfer_mut(chain_state, &key)?.unlock = Some(message);

	let mut update = Update::changed();
	update.merge(cache_secret(chain_state, key.secrethash, secret, None));
	Ok(update)
}

pub(super) fn handle_action_transfer_failed(
	chain_state: &mut ChainState,
	state_change: ActionTransferFailed,
) -> HandlerResult {
	let transfer = get_transfer_mut(chain_state, &TransferKey::sent(state_change.secrethash))?;
	if transfer.unlock.is_some() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer was already unlocked"))
	}
	if transfer.failed.is_some() {
		return Ok(Update::noop())
	}
	transfer.failed = Some(state_change.reason);
	Ok(Update::changed())
}

pub(super) fn handle_action_transfer_clear(
	chain_state: &mut ChainState,
	state_change: ActionTransferClear,
) -> HandlerResult {
	let key = state_change.key;
	let transfer = match chain_state.transfers.get(&key) {
		Some(transfer) => transfer,
		None => return clear_unused_secret(chain_state, key),
	};
	if !views::is_transfer_clearable(chain_state, transfer) {
		return Err(Rejection::new(ErrorCode::TransferConflict, format!("Transfer {} is still pending", key)))
	}

	let identifiers = transfer.message_identifiers();
	chain_state.transfers.remove(&key);
	for identifier in identifiers {
		chain_state.processed.remove(&identifier);
	}
	if !chain_state.transfers.keys().any(|k| k.secrethash == key.secrethash) {
		chain_state.secrets.remove(&key.secrethash);
	}
	Ok(Update::changed())
}

/// Forget the secret of a payment which never produced a transfer.
fn clear_unused_secret(chain_state: &mut ChainState, key: TransferKey) -> HandlerResult {
	if key.direction != TransferDirection::Sent ||
		!chain_state.secrets.contains_key(&key.secrethash) ||
		chain_state.transfers.keys().any(|k| k.secrethash == key.secrethash)
	{
		return Err(Rejection::new(ErrorCode::TransferNotFound, format!("No transfer {}", key)))
	}
	chain_state.secrets.remove(&key.secrethash);
	Ok(Update::changed())
}

/// A locked transfer paid to us.
pub(super) fn handle_receive_locked_transfer(
	chain_state: &mut ChainState,
	state_change: ReceiveLockedTransfer,
) -> HandlerResult {
	let message = state_change.message;
	let sender = state_change.sender;
	let key = TransferKey::received(message.lock.secrethash);
	if let Some(transfer) = chain_state.transfers.get(&key) {
		if transfer.transfer == message && transfer.partner == sender {
			return Ok(Update::noop())
		}
		return Err(Rejection::new(
			ErrorCode::TransferConflict,
			"Another transfer with this secrethash was already received",
		))
	}
	if message.target != chain_state.our_address {
		return Err(Rejection::new(
			ErrorCode::NoRoute,
			format!("Transfer targets {:#x}, we do not mediate", message.target),
		))
	}

	let channel_key = ChannelKey::new(message.token_network_address, sender);
	let channel = get_channel(chain_state, &channel_key)?;
	let locks = validators::is_valid_locked_transfer(
		channel,
		&channel.partner_state,
		&channel.our_state,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	apply_balance_proof(&mut channel.partner_state, &message, locks);
	chain_state.transfers.insert(
		key,
		TransferState::new(TransferDirection::Received, message, TokenAmount::zero(), sender),
	);
	Ok(Update::changed())
}

/// The next hop could not route our transfer and sent it back. The transfer fails.
pub(super) fn handle_receive_transfer_refund(
	chain_state: &mut ChainState,
	state_change: ReceiveTransferRefund,
) -> HandlerResult {
	let refund = state_change.message;
	let sender = state_change.sender;
	let key = TransferKey::sent(refund.lock.secrethash);
	let transfer = get_transfer(chain_state, &key)?;

	if sender != transfer.partner {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("Refund from {:#x}, transfer was sent to {:#x}", sender, transfer.partner),
		))
	}
	validators::is_valid_signature(&refund, sender).reject_with(ErrorCode::InvalidSignature)?;
	match &transfer.refund {
		Some(existing) if *existing == refund => return Ok(Update::noop()),
		Some(_) => return Err(Rejection::new(ErrorCode::TransferConflict, "Transfer already refunded")),
		None => {},
	}
	if transfer.is_resolved() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer is already resolved"))
	}

	let original = &transfer.transfer;
	if refund.token_network_address != original.token_network_address ||
		refund.channel_identifier != original.channel_identifier
	{
		return Err(Rejection::new(ErrorCode::InvalidChannelState, "Refund is for another channel"))
	}
	if refund.initiator != original.initiator {
		return Err(Rejection::new(ErrorCode::TransferConflict, "Refund is for another initiator"))
	}
	if refund.lock.amount != original.lock.amount {
		return Err(Rejection::new(
			ErrorCode::InvalidAmount,
			format!("Refund locks {}, transfer locked {}", refund.lock.amount, original.lock.amount),
		))
	}

	let transfer = get_transfer_mut(chain_state, &key)?;
	transfer.refund = Some(refund);
	transfer.failed.get_or_insert_with(|| "Refunded by partner".to_owned());
	Ok(Update::changed())
}

pub(super) fn handle_receive_unlock(
	chain_state: &mut ChainState,
	state_change: ReceiveUnlock,
) -> HandlerResult {
	let message = state_change.message;
	let key = TransferKey::received(message.secrethash());
	let transfer = get_transfer(chain_state, &key)?;

	if state_change.sender != transfer.partner {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("Unlock from {:#x}, payer is {:#x}", state_change.sender, transfer.partner),
		))
	}
	match &transfer.unlock {
		Some(unlock) if *unlock == message => return Ok(Update::noop()),
		Some(_) => return Err(Rejection::new(ErrorCode::TransferConflict, "Transfer already unlocked")),
		None => {},
	}
	if transfer.expired.is_some() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Lock already expired"))
	}

	let channel_key = transfer.channel_key();
	let channel = get_channel(chain_state, &channel_key)?;
	if !is_channel_usable(channel) {
		return Err(Rejection::new(ErrorCode::ChannelNotOpen, "Channel no longer accepts unlocks"))
	}
	let locks = validators::is_valid_unlock(channel, &channel.partner_state, &message)?;

	let secret = message.secret.clone();
	let channel = get_channel_mut(chain_state, &channel_key)?;
	apply_balance_proof(&mut channel.partner_state, &message, locks);
	get_transfer_mut(chain_state, &key)?.unlock = Some(message);

	let mut update = Update::changed();
	update.merge(cache_secret(chain_state, key.secrethash, secret, None));
	Ok(update)
}

pub(super) fn handle_receive_lock_expired(
	chain_state: &mut ChainState,
	state_change: ReceiveLockExpired,
) -> HandlerResult {
	let message = state_change.message;
	let key = TransferKey::received(message.secrethash);
	let transfer = get_transfer(chain_state, &key)?;

	if state_change.sender != transfer.partner {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("Expiration from {:#x}, payer is {:#x}", state_change.sender, transfer.partner),
		))
	}
	match &transfer.expired {
		Some(expired) if *expired == message => return Ok(Update::noop()),
		Some(_) => return Err(Rejection::new(ErrorCode::TransferConflict, "Lock already expired")),
		None => {},
	}
	if transfer.unlock.is_some() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer was already unlocked"))
	}

	let channel_key = transfer.channel_key();
	let channel = get_channel(chain_state, &channel_key)?;
	let locks = validators::is_valid_lock_expired(
		channel,
		&channel.partner_state,
		&channel.our_state,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	apply_balance_proof(&mut channel.partner_state, &message, locks);
	get_transfer_mut(chain_state, &key)?.expired = Some(message);
	Ok(Update::changed())
}

/// Flag the unresolved transfers of a closed channel.
///
/// A received lock can be claimed on-chain once we know its secret. A sent lock can only be
/// claimed by the payee, which needs the secret from us, from the partner's own reveal or from
/// the registry. The others are failed.
pub(super) fn reconcile_channel_closed(
	chain_state: &mut ChainState,
	channel: ChannelKey,
	block_number: BlockNumber,
) -> Update {
	let mut update = Update::noop();
	let secrets = &chain_state.secrets;
	for transfer in chain_state.transfers.values_mut() {
		if transfer.channel_key() != channel ||
			transfer.channel_closed.is_some() ||
			transfer.is_resolved()
		{
			continue
		}

		transfer.channel_closed = Some(block_number);
		let secret = secrets.get(&transfer.secrethash());
		let resolvable = match transfer.direction {
			TransferDirection::Received => secret.is_some(),
			TransferDirection::Sent =>
				transfer.secret_reveal.is_some() ||
					transfer.partner_revealed ||
					secret.map(|s| s.registered_block.is_some()).unwrap_or(false),
		};
		if !resolvable {
			transfer.failed.get_or_insert_with(|| "Channel closed".to_owned());
		}
		update.dirty = true;
		update.events.push(TransferChannelClosed { key: transfer.key(), resolvable }.into());
	}
	update
}
