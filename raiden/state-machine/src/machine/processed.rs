use std::collections::HashSet;

use raiden_light_primitives::types::MessageIdentifier;

use super::{
	channel::validators,
	HandlerResult,
	Update,
};
use crate::{
	errors::{
		ErrorCode,
		RejectWith,
	},
	types::{
		ActionProcessedSigned,
		ChainState,
		ReceiveDelivered,
		ReceiveProcessed,
		TransferDirection,
	},
};

/// Attach a peer's `Processed` to the message it acknowledges. Unknown identifiers are ignored.
pub(super) fn handle_receive_processed(
	chain_state: &mut ChainState,
	state_change: ReceiveProcessed,
) -> HandlerResult {
	let sender = state_change.sender;
	let processed = state_change.message;
	validators::is_valid_signature(&processed, sender).reject_with(ErrorCode::InvalidSignature)?;
	let identifier = processed.message_identifier;

	for transfer in chain_state.transfers.values_mut() {
		if transfer.direction != TransferDirection::Sent || transfer.partner != sender {
			continue
		}
		if transfer.transfer.message_identifier == identifier {
			if transfer.transfer_processed.is_none() {
				transfer.transfer_processed = Some(processed);
				return Ok(Update::changed())
			}
			return Ok(Update::noop())
		}
		if transfer.unlock.as_ref().map(|m| m.message_identifier) == Some(identifier) {
			if transfer.unlock_processed.is_none() {
				transfer.unlock_processed = Some(processed);
				return Ok(Update::changed())
			}
			return Ok(Update::noop())
		}
		if transfer.expired.as_ref().map(|m| m.message_identifier) == Some(identifier) {
			if transfer.expired_processed.is_none() {
				transfer.expired_processed = Some(processed);
				return Ok(Update::changed())
			}
			return Ok(Update::noop())
		}
	}

	for (key, channel) in chain_state.channels.iter_mut() {
		if key.partner != sender {
			continue
		}
		for withdraw in channel.partner_state.withdraws_pending.values_mut() {
			if withdraw.confirmation.as_ref().map(|m| m.message_identifier) == Some(identifier) {
				if withdraw.confirmation_processed.is_none() {
					withdraw.confirmation_processed = Some(processed);
					return Ok(Update::changed())
				}
				return Ok(Update::noop())
			}
		}
		for expired in channel.our_state.withdraws_expired.iter_mut() {
			if expired.message.message_identifier == identifier {
				if expired.processed.is_none() {
					expired.processed = Some(processed);
					return Ok(Update::changed())
				}
				return Ok(Update::noop())
			}
		}
	}

	Ok(Update::noop())
}

/// Stop retrying a secret request or reveal once the peer got it.
pub(super) fn handle_receive_delivered(
	chain_state: &mut ChainState,
	state_change: ReceiveDelivered,
) -> HandlerResult {
	let sender = state_change.sender;
	let delivered = state_change.message;
	validators::is_valid_signature(&delivered, sender).reject_with(ErrorCode::InvalidSignature)?;
	let identifier = delivered.delivered_message_identifier;

	let mut update = Update::noop();
	for transfer in chain_state.transfers.values_mut() {
		if transfer.direction != TransferDirection::Received {
			continue
		}
		if !transfer.secret_request_delivered &&
			transfer.transfer.initiator == sender &&
			transfer.secret_request.as_ref().map(|m| m.message_identifier) == Some(identifier)
		{
			transfer.secret_request_delivered = true;
			update.dirty = true;
		}
		if !transfer.secret_reveal_delivered &&
			transfer.partner == sender &&
			transfer.secret_reveal.as_ref().map(|m| m.message_identifier) == Some(identifier)
		{
			transfer.secret_reveal_delivered = true;
			update.dirty = true;
		}
	}
	Ok(update)
}

/// Cache a `Processed` we signed so it can be replayed when the peer retries.
pub(super) fn handle_action_processed_signed(
	chain_state: &mut ChainState,
	state_change: ActionProcessedSigned,
) -> HandlerResult {
	let processed = state_change.message;
	validators::is_valid_signature(&processed, chain_state.our_address)
		.reject_with(ErrorCode::InvalidSignature)?;
	if chain_state.processed.get(&processed.message_identifier) == Some(&processed) {
		return Ok(Update::noop())
	}
	chain_state.processed.insert(processed.message_identifier, processed);
	Ok(Update::changed())
}

/// Drop the `Processed` we signed for messages no longer held in state.
pub(super) fn prune_processed(chain_state: &mut ChainState) -> Update {
	let mut live: HashSet<MessageIdentifier> = chain_state
		.transfers
		.values()
		.flat_map(|transfer| transfer.message_identifiers())
		.collect();
	for channel in chain_state.channels.values() {
		live.extend(
			channel
				.our_state
				.withdraws_pending
				.values()
				.filter_map(|pending| pending.confirmation.as_ref().map(|m| m.message_identifier)),
		);
		live.extend(
			channel.partner_state.withdraws_expired.iter().map(|expired| expired.message.message_identifier),
		);
	}

	let before = chain_state.processed.len();
	chain_state.processed.retain(|identifier, _| live.contains(identifier));
	if chain_state.processed.len() == before {
		return Update::noop()
	}
	Update::changed()
}
