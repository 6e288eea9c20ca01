#![warn(clippy::missing_docs_in_private_items)]

use raiden_light_messages::messages::{
	WithdrawConfirmation,
	WithdrawExpired,
	WithdrawRequest,
};
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	hashing::hash_message_identifier,
	types::{
		BlockExpiration,
		CanonicalIdentifier,
		MessageIdentifier,
		TokenAmount,
	},
};

use super::{
	channel::{
		get_channel,
		get_channel_mut,
		utils::u256_bytes,
		validators,
	},
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
		ActionWithdrawConfirmationSigned,
		ActionWithdrawExpiredSigned,
		ActionWithdrawFailed,
		ActionWithdrawRequest,
		ActionWithdrawRequestSigned,
		ChainState,
		ChannelEndState,
		ChannelKey,
		ChannelState,
		ErrorInvalidAction,
		ExpiredWithdrawState,
		Meta,
		PendingWithdrawState,
		ReceiveWithdrawConfirmation,
		ReceiveWithdrawExpired,
		ReceiveWithdrawRequest,
		WithdrawKey,
	},
};

/// Identity of an open channel, required by every withdraw message.
fn open_channel_identifier(channel: &ChannelState) -> Result<CanonicalIdentifier, Rejection> {
	validators::is_channel_open(channel).reject_with(ErrorCode::ChannelNotOpen)?;
	channel.canonical_identifier().ok_or_else(|| {
		Rejection::new(ErrorCode::ChannelNotOpen, format!("Channel {} has no identifier", channel.key()))
	})
}

fn get_pending<'a>(
	end_state: &'a ChannelEndState,
	total_withdraw: TokenAmount,
) -> Result<&'a PendingWithdrawState, Rejection> {
	end_state.withdraws_pending.get(&total_withdraw).ok_or_else(|| {
		Rejection::new(
			ErrorCode::WithdrawNotFound,
			format!("No pending withdraw of {} for {:#x}", total_withdraw, end_state.address),
		)
	})
}

/// Withdraw messages are identified by their kind, channel, participant and total.
fn withdraw_message_identifier(
	kind: &[u8],
	canonical_identifier: &CanonicalIdentifier,
	end_state: &ChannelEndState,
	total_withdraw: TokenAmount,
) -> MessageIdentifier {
	hash_message_identifier(&[
		kind,
		&u256_bytes(canonical_identifier.channel_identifier),
		end_state.address.as_bytes(),
		&u256_bytes(total_withdraw),
	])
}

/// Expiration of our withdraw request: the requested block, or twice the reveal timeout ahead.
fn request_expiration(
	chain_state: &ChainState,
	channel: &ChannelState,
	state_change: &ActionWithdrawRequest,
) -> BlockExpiration {
	state_change
		.expiration
		.unwrap_or_else(|| chain_state.block_number + channel.reveal_timeout * 2)
}

/// Build our withdraw request.
pub fn make_withdraw_request(
	chain_state: &ChainState,
	state_change: &ActionWithdrawRequest,
) -> Result<WithdrawRequest, Rejection> {
	let channel = get_channel(chain_state, &state_change.channel)?;
	let canonical_identifier = open_channel_identifier(channel)?;
	let our_state = &channel.our_state;

	Ok(WithdrawRequest {
		message_identifier: withdraw_message_identifier(
			b"WithdrawRequest",
			&canonical_identifier,
			our_state,
			state_change.total_withdraw,
		),
		chain_id: canonical_identifier.chain_identifier,
		token_network_address: canonical_identifier.token_network_address,
		channel_identifier: canonical_identifier.channel_identifier,
		participant: our_state.address,
		total_withdraw: state_change.total_withdraw,
		nonce: our_state.next_nonce(),
		expiration: request_expiration(chain_state, channel, state_change),
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// Build our confirmation of the partner's pending request.
pub fn make_withdraw_confirmation(
	chain_state: &ChainState,
	channel_key: &ChannelKey,
	total_withdraw: TokenAmount,
) -> Result<WithdrawConfirmation, Rejection> {
	let channel = get_channel(chain_state, channel_key)?;
	let canonical_identifier = open_channel_identifier(channel)?;
	let pending = get_pending(&channel.partner_state, total_withdraw)?;

	Ok(WithdrawConfirmation {
		message_identifier: withdraw_message_identifier(
			b"WithdrawConfirmation",
			&canonical_identifier,
			&channel.partner_state,
			total_withdraw,
		),
		chain_id: canonical_identifier.chain_identifier,
		token_network_address: canonical_identifier.token_network_address,
		channel_identifier: canonical_identifier.channel_identifier,
		participant: pending.request.participant,
		total_withdraw,
		nonce: channel.our_state.next_nonce(),
		expiration: pending.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// Build the expiration of our unconfirmed request.
pub fn make_withdraw_expired(
	chain_state: &ChainState,
	channel_key: &ChannelKey,
	total_withdraw: TokenAmount,
) -> Result<WithdrawExpired, Rejection> {
	let channel = get_channel(chain_state, channel_key)?;
	let canonical_identifier = open_channel_identifier(channel)?;
	let pending = get_pending(&channel.our_state, total_withdraw)?;
	if chain_state.block_number <= pending.expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!("Withdraw expires at block {}", pending.expiration),
		))
	}

	Ok(WithdrawExpired {
		message_identifier: withdraw_message_identifier(
			b"WithdrawExpired",
			&canonical_identifier,
			&channel.our_state,
			total_withdraw,
		),
		chain_id: canonical_identifier.chain_identifier,
		token_network_address: canonical_identifier.token_network_address,
		channel_identifier: canonical_identifier.channel_identifier,
		participant: channel.our_state.address,
		total_withdraw,
		nonce: channel.our_state.next_nonce(),
		expiration: pending.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// Check our withdraw intent without touching the state.
pub(super) fn handle_action_withdraw_request(
	chain_state: &mut ChainState,
	state_change: ActionWithdrawRequest,
) -> HandlerResult {
	let channel = get_channel(chain_state, &state_change.channel)?;
	validators::is_channel_open(channel).reject_with(ErrorCode::ChannelNotOpen)?;
	if channel.our_state.withdraws_pending.contains_key(&state_change.total_withdraw) {
		return Ok(Update::noop())
	}
	validators::is_valid_total_withdraw(
		&channel.our_state,
		&channel.partner_state,
		state_change.total_withdraw,
	)?;

	let expiration = request_expiration(chain_state, channel, &state_change);
	let min_expiration = chain_state.block_number + chain_state.withdraw_margin;
	if expiration < min_expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!("Withdraw expires at {}, must be at least {}", expiration, min_expiration),
		))
	}
	Ok(Update::noop())
}

pub(super) fn handle_action_withdraw_request_signed(
	chain_state: &mut ChainState,
	state_change: ActionWithdrawRequestSigned,
) -> HandlerResult {
	let message = state_change.message;
	let channel = get_channel(chain_state, &state_change.channel)?;
	match channel.our_state.withdraws_pending.get(&message.total_withdraw) {
		Some(pending) if pending.request == message => return Ok(Update::noop()),
		Some(_) =>
			return Err(Rejection::new(
				ErrorCode::WithdrawConflict,
				format!("A withdraw of {} is already pending", message.total_withdraw),
			)),
		None => {},
	}
	validators::is_valid_withdraw_request(
		channel,
		&channel.our_state,
		&channel.partner_state,
		&message,
		chain_state.block_number + chain_state.withdraw_margin,
	)?;

	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	channel.our_state.nonce = message.nonce;
	channel
		.our_state
		.withdraws_pending
		.insert(message.total_withdraw, PendingWithdrawState::new(message));
	Ok(Update::changed())
}

/// The partner confirmed our request. The on-chain withdraw can now be submitted.
pub(super) fn handle_receive_withdraw_confirmation(
	chain_state: &mut ChainState,
	state_change: ReceiveWithdrawConfirmation,
) -> HandlerResult {
	let message = state_change.message;
	let channel_key = ChannelKey::new(message.token_network_address, state_change.sender);
	let channel = get_channel(chain_state, &channel_key)?;
	let pending = get_pending(&channel.our_state, message.total_withdraw)?;
	match &pending.confirmation {
		Some(confirmation) if *confirmation == message => return Ok(Update::noop()),
		Some(_) =>
			return Err(Rejection::new(ErrorCode::WithdrawConflict, "Withdraw already confirmed")),
		None => {},
	}
	validators::is_valid_withdraw_confirmation(
		channel,
		&channel.partner_state,
		pending,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	channel.partner_state.nonce = message.nonce;
	if let Some(pending) = channel.our_state.withdraws_pending.get_mut(&message.total_withdraw) {
		pending.confirmation = Some(message);
	}
	Ok(Update::changed())
}

/// The partner asks us to confirm a withdraw of theirs.
pub(super) fn handle_receive_withdraw_request(
	chain_state: &mut ChainState,
	state_change: ReceiveWithdrawRequest,
) -> HandlerResult {
	let message = state_change.message;
	let channel_key = ChannelKey::new(message.token_network_address, state_change.sender);
	let channel = get_channel(chain_state, &channel_key)?;
	match channel.partner_state.withdraws_pending.get(&message.total_withdraw) {
		Some(pending) if pending.request == message => return Ok(Update::noop()),
		Some(_) =>
			return Err(Rejection::new(
				ErrorCode::WithdrawConflict,
				format!("A withdraw of {} is already pending", message.total_withdraw),
			)),
		None => {},
	}
	validators::is_valid_withdraw_request(
		channel,
		&channel.partner_state,
		&channel.our_state,
		&message,
		chain_state.block_number + 1,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	channel.partner_state.nonce = message.nonce;
	channel
		.partner_state
		.withdraws_pending
		.insert(message.total_withdraw, PendingWithdrawState::new(message));
	Ok(Update::changed())
}

pub(super) fn handle_action_withdraw_confirmation_signed(
	chain_state: &mut ChainState,
	state_change: ActionWithdrawConfirmationSigned,
) -> HandlerResult {
	let message = state_change.message;
	let channel = get_channel(chain_state, &state_change.channel)?;
	validators::is_channel_open(channel).reject_with(ErrorCode::ChannelNotOpen)?;
	let pending = get_pending(&channel.partner_state, message.total_withdraw)?;
	match &pending.confirmation {
		Some(confirmation) if *confirmation == message => return Ok(Update::noop()),
		Some(_) =>
			return Err(Rejection::new(ErrorCode::WithdrawConflict, "Withdraw already confirmed")),
		None => {},
	}
	validators::is_valid_withdraw_confirmation(
		channel,
		&channel.our_state,
		pending,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	channel.our_state.nonce = message.nonce;
	if let Some(pending) = channel.partner_state.withdraws_pending.get_mut(&message.total_withdraw) {
		pending.confirmation = Some(message);
	}
	Ok(Update::changed())
}

pub(super) fn handle_action_withdraw_expired_signed(
	chain_state: &mut ChainState,
	state_change: ActionWithdrawExpiredSigned,
) -> HandlerResult {
	let message = state_change.message;
	let channel = get_channel(chain_state, &state_change.channel)?;
	if channel
		.our_state
		.withdraws_expired
		.iter()
		.any(|expired| expired.message == message)
	{
		return Ok(Update::noop())
	}
	let pending = get_pending(&channel.our_state, message.total_withdraw)?;
	validators::is_valid_withdraw_expired(
		channel,
		&channel.our_state,
		pending,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	channel.our_state.nonce = message.nonce;
	channel.our_state.withdraws_pending.remove(&message.total_withdraw);
	channel.our_state.withdraws_expired.push(ExpiredWithdrawState {
		total_withdraw: message.total_withdraw,
		expiration: message.expiration,
		nonce: message.nonce,
		message,
		processed: None,
	});
	Ok(Update::changed())
}

/// The partner's request expired unconfirmed on-chain.
pub(super) fn handle_receive_withdraw_expired(
	chain_state: &mut ChainState,
	state_change: ReceiveWithdrawExpired,
) -> HandlerResult {
	let message = state_change.message;
	let channel_key = ChannelKey::new(message.token_network_address, state_change.sender);
	let channel = get_channel(chain_state, &channel_key)?;
	if channel.partner_state.withdraws_expired.iter().any(|expired| expired.message == message) {
		return Ok(Update::noop())
	}
	let pending = get_pending(&channel.partner_state, message.total_withdraw)?;
	validators::is_valid_withdraw_expired(
		channel,
		&channel.partner_state,
		pending,
		&message,
		chain_state.block_number,
	)?;

	let channel = get_channel_mut(chain_state, &channel_key)?;
	channel.partner_state.nonce = message.nonce;
	channel.partner_state.withdraws_pending.remove(&message.total_withdraw);
	channel.partner_state.withdraws_expired.push(ExpiredWithdrawState {
		total_withdraw: message.total_withdraw,
		expiration: message.expiration,
		nonce: message.nonce,
		message,
		processed: None,
	});
	Ok(Update::changed())
}

pub(super) fn handle_action_withdraw_failed(
	chain_state: &mut ChainState,
	state_change: ActionWithdrawFailed,
) -> HandlerResult {
	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	let pending = channel
		.our_state
		.withdraws_pending
		.get_mut(&state_change.total_withdraw)
		.ok_or_else(|| {
			Rejection::new(
				ErrorCode::WithdrawNotFound,
				format!("No pending withdraw of {}", state_change.total_withdraw),
			)
		})?;

	let dirty = !pending.failed;
	pending.failed = true;
	let meta = Meta::Withdraw(WithdrawKey {
		channel: state_change.channel,
		total_withdraw: state_change.total_withdraw,
	});
	let update = if dirty { Update::changed() } else { Update::noop() };
	Ok(update.with_event(ErrorInvalidAction::new(
		meta,
		Rejection::new(ErrorCode::TransactionFailed, state_change.reason),
	)))
}

/// Forget expired withdraws nobody will ask about again: ours once the partner acknowledged the
/// expiry, the partner's once its expiry is `reveal_timeout` blocks old.
pub(super) fn prune_expired_withdraws(chain_state: &mut ChainState) -> Update {
	let block_number = chain_state.block_number;
	let mut update = Update::noop();
	for channel in chain_state.channels.values_mut() {
		let reveal_timeout = channel.reveal_timeout;
		let ours = channel.our_state.withdraws_expired.len();
		let partners = channel.partner_state.withdraws_expired.len();
		channel
			.our_state
			.withdraws_expired
			.retain(|expired| expired.processed.is_none() || block_number <= expired.expiration);
		channel
			.partner_state
			.withdraws_expired
			.retain(|expired| block_number <= expired.expiration.saturating_add(reveal_timeout));
		if channel.our_state.withdraws_expired.len() != ours ||
			channel.partner_state.withdraws_expired.len() != partners
		{
			update.dirty = true;
		}
	}
	update
}
