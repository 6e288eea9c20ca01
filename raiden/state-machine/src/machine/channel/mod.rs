#![warn(clippy::missing_docs_in_private_items)]

use std::cmp::max;

use raiden_light_messages::messages::BalanceProofMessage;

use super::{
	processed,
	transfer,
	withdraw,
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
		ActionChannelClose,
		ActionChannelDeposit,
		ActionChannelOpen,
		ActionChannelSettle,
		ActionChannelTransactionFailed,
		BalanceProofState,
		Block,
		ChainState,
		ChannelEndState,
		ChannelIdentifier,
		ChannelKey,
		ChannelSettleable,
		ChannelState,
		ChannelStatus,
		ChannelTransaction,
		ContractReceiveChannelClosed,
		ContractReceiveChannelDeposit,
		ContractReceiveChannelOpened,
		ContractReceiveChannelSettled,
		ContractReceiveChannelWithdraw,
		ErrorInvalidAction,
		HashTimeLockState,
		Meta,
		SettleTimeout,
		TokenAddress,
	},
};

/// Channel and balance proof utils.
pub mod utils;
/// Channel validators.
pub mod validators;

pub(super) fn get_channel<'a>(
	chain_state: &'a ChainState,
	key: &ChannelKey,
) -> Result<&'a ChannelState, Rejection> {
	chain_state
		.channels
		.get(key)
		.ok_or_else(|| Rejection::new(ErrorCode::ChannelNotFound, format!("No channel {}", key)))
}

pub(super) fn get_channel_mut<'a>(
	chain_state: &'a mut ChainState,
	key: &ChannelKey,
) -> Result<&'a mut ChannelState, Rejection> {
	chain_state
		.channels
		.get_mut(key)
		.ok_or_else(|| Rejection::new(ErrorCode::ChannelNotFound, format!("No channel {}", key)))
}

/// Check the channel is on-chain and carries the expected identifier.
fn check_channel_identifier(
	channel: &ChannelState,
	channel_identifier: ChannelIdentifier,
) -> Result<(), Rejection> {
	if channel.channel_identifier != Some(channel_identifier) {
		return Err(Rejection::new(
			ErrorCode::InvalidChannelState,
			format!("Event for channel {} does not match {}", channel_identifier, channel.key()),
		))
	}
	Ok(())
}

fn new_channel(
	chain_state: &ChainState,
	key: ChannelKey,
	token_address: TokenAddress,
	settle_timeout: SettleTimeout,
	status: ChannelStatus,
) -> ChannelState {
	ChannelState {
		channel_identifier: None,
		chain_id: chain_state.chain_id,
		token_network_address: key.token_network_address,
		token_address,
		status,
		settle_timeout,
		reveal_timeout: chain_state.reveal_timeout,
		open_block: None,
		close_block: None,
		our_state: ChannelEndState::new(chain_state.our_address),
		partner_state: ChannelEndState::new(key.partner),
	}
}

pub(super) fn handle_action_channel_open(
	chain_state: &mut ChainState,
	state_change: ActionChannelOpen,
) -> HandlerResult {
	let key = state_change.channel_key();
	if chain_state.channels.contains_key(&key) {
		return Err(Rejection::new(ErrorCode::ChannelExists, format!("Channel {} already exists", key)))
	}
	if state_change.partner == chain_state.our_address {
		return Err(Rejection::new(ErrorCode::UnexpectedSender, "Cannot open a channel with ourselves"))
	}

	let settle_timeout = state_change.settle_timeout.unwrap_or(chain_state.settle_timeout);
	if settle_timeout < chain_state.reveal_timeout * 2 {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!(
				"Settle timeout {} must be at least twice the reveal timeout {}",
				settle_timeout, chain_state.reveal_timeout
			),
		))
	}

	let channel = new_channel(
		chain_state,
		key,
		state_change.token_address,
		settle_timeout,
		ChannelStatus::Opening,
	);
	chain_state.channels.insert(key, channel);
	Ok(Update::changed())
}

pub(super) fn handle_contract_receive_channel_opened(
	chain_state: &mut ChainState,
	state_change: ContractReceiveChannelOpened,
) -> HandlerResult {
	let key = state_change.channel_key();
	if !chain_state.channels.contains_key(&key) {
		let channel = new_channel(
			chain_state,
			key,
			state_change.token_address,
			state_change.settle_timeout,
			ChannelStatus::Opening,
		);
		chain_state.channels.insert(key, channel);
	}

	let channel = get_channel_mut(chain_state, &key)?;
	match channel.status {
		ChannelStatus::Opening => {
			channel.status = ChannelStatus::Open;
			channel.channel_identifier = Some(state_change.channel_identifier);
			channel.settle_timeout = state_change.settle_timeout;
			channel.token_address = state_change.token_address;
			channel.open_block = Some(state_change.block_number);
			Ok(Update::changed())
		},
		_ if channel.channel_identifier == Some(state_change.channel_identifier) => Ok(Update::noop()),
		status => Err(Rejection::new(
			ErrorCode::ChannelExists,
			format!("Channel {} is already {}", key, status),
		)),
	}
}

pub(super) fn handle_action_channel_deposit(
	chain_state: &mut ChainState,
	state_change: ActionChannelDeposit,
) -> HandlerResult {
	let channel = get_channel(chain_state, &state_change.channel)?;
	validators::is_channel_open(channel).reject_with(ErrorCode::ChannelNotOpen)?;

	if state_change.total_deposit <= channel.our_state.contract_balance {
		return Err(Rejection::new(
			ErrorCode::InvalidDeposit,
			format!(
				"Total deposit {} must exceed the current deposit {}",
				state_change.total_deposit, channel.our_state.contract_balance
			),
		))
	}

	Ok(Update::noop())
}

pub(super) fn handle_contract_receive_channel_deposit(
	chain_state: &mut ChainState,
	state_change: ContractReceiveChannelDeposit,
) -> HandlerResult {
	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	let end_state = if state_change.participant == channel.our_state.address {
		&mut channel.our_state
	} else if state_change.participant == channel.partner_state.address {
		&mut channel.partner_state
	} else {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("{:#x} is not a participant", state_change.participant),
		))
	};

	if state_change.total_deposit <= end_state.contract_balance {
		return Ok(Update::noop())
	}
	end_state.contract_balance = state_change.total_deposit;
	Ok(Update::changed())
}

pub(super) fn handle_action_channel_close(
	chain_state: &mut ChainState,
	state_change: ActionChannelClose,
) -> HandlerResult {
	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	match channel.status {
		ChannelStatus::Open => {
			channel.status = ChannelStatus::Closing;
			Ok(Update::changed())
		},
		ChannelStatus::Closing => Ok(Update::noop()),
		status => Err(Rejection::new(
			ErrorCode::ChannelNotOpen,
			format!("Cannot close channel {} while {}", state_change.channel, status),
		)),
	}
}

pub(super) fn handle_contract_receive_channel_closed(
	chain_state: &mut ChainState,
	state_change: ContractReceiveChannelClosed,
) -> HandlerResult {
	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	check_channel_identifier(channel, state_change.channel_identifier)?;
	match channel.status {
		ChannelStatus::Open | ChannelStatus::Closing => {
			channel.status = ChannelStatus::Closed;
			channel.close_block = Some(state_change.block_number);
		},
		_ => return Ok(Update::noop()),
	}

	let mut update = Update::changed();
	update.merge(transfer::reconcile_channel_closed(
		chain_state,
		state_change.channel,
		state_change.block_number,
	));
	update.merge(settleable_channels(chain_state));
	Ok(update)
}

pub(super) fn handle_action_channel_settle(
	chain_state: &mut ChainState,
	state_change: ActionChannelSettle,
) -> HandlerResult {
	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	match channel.status {
		ChannelStatus::Settleable => {
			channel.status = ChannelStatus::Settling;
			Ok(Update::changed())
		},
		ChannelStatus::Settling => Ok(Update::noop()),
		status => Err(Rejection::new(
			ErrorCode::InvalidChannelState,
			format!("Cannot settle channel {} while {}", state_change.channel, status),
		)),
	}
}

pub(super) fn handle_contract_receive_channel_settled(
	chain_state: &mut ChainState,
	state_change: ContractReceiveChannelSettled,
) -> HandlerResult {
	let channel = get_channel(chain_state, &state_change.channel)?;
	check_channel_identifier(channel, state_change.channel_identifier)?;

	chain_state.channels.remove(&state_change.channel);
	Ok(Update::changed())
}

/// Revert the status change of an intent whose transaction failed.
pub(super) fn handle_action_channel_transaction_failed(
	chain_state: &mut ChainState,
	state_change: ActionChannelTransactionFailed,
) -> HandlerResult {
	let key = state_change.channel;
	let mut update = Update::noop();

	let status = chain_state.channels.get(&key).map(|channel| channel.status);
	let reverted = match (state_change.transaction, status) {
		(ChannelTransaction::Open, Some(ChannelStatus::Opening)) => {
			chain_state.channels.remove(&key);
			None
		},
		(ChannelTransaction::Close, Some(ChannelStatus::Closing)) => Some(ChannelStatus::Open),
		(ChannelTransaction::Settle, Some(ChannelStatus::Settling)) =>
			Some(ChannelStatus::Settleable),
		_ => status,
	};
	if let Some(channel) = chain_state.channels.get_mut(&key) {
		if let Some(reverted) = reverted {
			channel.status = reverted;
		}
	}
	update.dirty = reverted != status;

	Ok(update.with_event(ErrorInvalidAction::new(
		Meta::Channel(key),
		Rejection::new(ErrorCode::TransactionFailed, state_change.reason),
	)))
}

pub(super) fn handle_contract_receive_channel_withdraw(
	chain_state: &mut ChainState,
	state_change: ContractReceiveChannelWithdraw,
) -> HandlerResult {
	let channel = get_channel_mut(chain_state, &state_change.channel)?;
	let end_state = if state_change.participant == channel.our_state.address {
		&mut channel.our_state
	} else if state_change.participant == channel.partner_state.address {
		&mut channel.partner_state
	} else {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("{:#x} is not a participant", state_change.participant),
		))
	};

	if state_change.total_withdraw <= end_state.onchain_total_withdraw {
		return Ok(Update::noop())
	}
	end_state.onchain_total_withdraw =
		max(end_state.onchain_total_withdraw, state_change.total_withdraw);
	end_state
		.withdraws_pending
		.retain(|total_withdraw, _| *total_withdraw > state_change.total_withdraw);
	Ok(Update::changed())
}

/// Move closed channels past their settlement window to `Settleable`.
fn settleable_channels(chain_state: &mut ChainState) -> Update {
	let block_number = chain_state.block_number;
	let mut update = Update::noop();
	for (key, channel) in chain_state.channels.iter_mut() {
		if channel.status != ChannelStatus::Closed {
			continue
		}
		if matches!(channel.settleable_at(), Some(at) if block_number >= at) {
			channel.status = ChannelStatus::Settleable;
			update.dirty = true;
			update.events.push(ChannelSettleable { channel: *key, block_number }.into());
		}
	}
	update
}

pub(super) fn handle_block(chain_state: &mut ChainState, state_change: Block) -> HandlerResult {
	if state_change.block_number <= chain_state.block_number {
		return Ok(Update::noop())
	}
	chain_state.block_number = state_change.block_number;

	let mut update = Update::changed();
	update.merge(settleable_channels(chain_state));
	update.merge(withdraw::prune_expired_withdraws(chain_state));
	update.merge(processed::prune_processed(chain_state));
	Ok(update)
}

/// Record a validated balance proof and the pending locks it commits to.
pub(super) fn apply_balance_proof<M: BalanceProofMessage>(
	end_state: &mut ChannelEndState,
	message: &M,
	locks: Vec<HashTimeLockState>,
) {
	end_state.nonce = message.nonce();
	end_state.balance_proof = Some(BalanceProofState::from_message(message, end_state.address));
	end_state.pending_locks = locks;
}
