use raiden_light_primitives::types::MessageIdentifier;

use super::{
	channel,
	processed,
	secret,
	transfer,
	withdraw,
	HandlerResult,
};
use crate::{
	errors::Rejection,
	types::{
		ChainState,
		ErrorInvalidAction,
		ErrorInvalidReceivedMessage,
		Event,
		Meta,
		StateChange,
	},
};

/// The outcome of applying a state change.
#[derive(Clone, Debug)]
pub struct Transition {
	pub new_state: ChainState,
	pub events: Vec<Event>,
	/// The state change was accepted and modified the state.
	pub changed: bool,
}

/// Identifier of the message carried by a received state change.
fn received_message_identifier(state_change: &StateChange) -> Option<MessageIdentifier> {
	match state_change {
		StateChange::ReceiveLockedTransfer(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveTransferRefund(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveSecretRequest(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveSecretReveal(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveUnlock(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveLockExpired(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveWithdrawRequest(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveWithdrawConfirmation(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveWithdrawExpired(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveProcessed(inner) => Some(inner.message.message_identifier),
		StateChange::ReceiveDelivered(inner) => Some(inner.message.delivered_message_identifier),
		_ => None,
	}
}

fn dispatch(chain_state: &mut ChainState, state_change: StateChange) -> HandlerResult {
	match state_change {
		StateChange::Block(inner) => channel::handle_block(chain_state, inner),
		StateChange::ActionChannelOpen(inner) =>
			channel::handle_action_channel_open(chain_state, inner),
		StateChange::ContractReceiveChannelOpened(inner) =>
			channel::handle_contract_receive_channel_opened(chain_state, inner),
		StateChange::ActionChannelDeposit(inner) =>
			channel::handle_action_channel_deposit(chain_state, inner),
		StateChange::ContractReceiveChannelDeposit(inner) =>
			channel::handle_contract_receive_channel_deposit(chain_state, inner),
		StateChange::ActionChannelClose(inner) =>
			channel::handle_action_channel_close(chain_state, inner),
		StateChange::ContractReceiveChannelClosed(inner) =>
			channel::handle_contract_receive_channel_closed(chain_state, inner),
		StateChange::ActionChannelSettle(inner) =>
			channel::handle_action_channel_settle(chain_state, inner),
		StateChange::ContractReceiveChannelSettled(inner) =>
			channel::handle_contract_receive_channel_settled(chain_state, inner),
		StateChange::ActionChannelTransactionFailed(inner) =>
			channel::handle_action_channel_transaction_failed(chain_state, inner),
		StateChange::ContractReceiveChannelWithdraw(inner) =>
			channel::handle_contract_receive_channel_withdraw(chain_state, inner),
		StateChange::ContractReceiveSecretRevealed(inner) =>
			secret::handle_contract_receive_secret_revealed(chain_state, inner),
		StateChange::ActionInitTransfer(inner) =>
			transfer::handle_action_init_transfer(chain_state, inner),
		StateChange::ActionTransferSecret(inner) =>
			secret::handle_action_transfer_secret(chain_state, inner),
		StateChange::ActionTransferSigned(inner) =>
			transfer::handle_action_transfer_signed(chain_state, inner),
		StateChange::ActionTransferExpire(inner) =>
			transfer::handle_action_transfer_expire(chain_state, inner),
		StateChange::ActionTransferFailed(inner) =>
			transfer::handle_action_transfer_failed(chain_state, inner),
		StateChange::ActionTransferClear(inner) =>
			transfer::handle_action_transfer_clear(chain_state, inner),
		StateChange::ActionSecretRegistrationFailed(inner) =>
			secret::handle_action_secret_registration_failed(chain_state, inner),
		StateChange::ActionUnlockSigned(inner) =>
			transfer::handle_action_unlock_signed(chain_state, inner),
		StateChange::ActionLockExpiredSigned(inner) =>
			transfer::handle_action_lock_expired_signed(chain_state, inner),
		StateChange::ActionSecretRequestSigned(inner) =>
			secret::handle_action_secret_request_signed(chain_state, inner),
		StateChange::ActionSecretRevealSigned(inner) =>
			secret::handle_action_secret_reveal_signed(chain_state, inner),
		StateChange::ActionProcessedSigned(inner) =>
			processed::handle_action_processed_signed(chain_state, inner),
		StateChange::ActionWithdrawRequest(inner) =>
			withdraw::handle_action_withdraw_request(chain_state, inner),
		StateChange::ActionWithdrawRequestSigned(inner) =>
			withdraw::handle_action_withdraw_request_signed(chain_state, inner),
		StateChange::ActionWithdrawConfirmationSigned(inner) =>
			withdraw::handle_action_withdraw_confirmation_signed(chain_state, inner),
		StateChange::ActionWithdrawExpiredSigned(inner) =>
			withdraw::handle_action_withdraw_expired_signed(chain_state, inner),
		StateChange::ActionWithdrawFailed(inner) =>
			withdraw::handle_action_withdraw_failed(chain_state, inner),
		StateChange::ReceiveLockedTransfer(inner) =>
			transfer::handle_receive_locked_transfer(chain_state, inner),
		StateChange::ReceiveTransferRefund(inner) =>
			transfer::handle_receive_transfer_refund(chain_state, inner),
		StateChange::ReceiveSecretRequest(inner) =>
			secret::handle_receive_secret_request(chain_state, inner),
		StateChange::ReceiveSecretReveal(inner) =>
			secret::handle_receive_secret_reveal(chain_state, inner),
		StateChange::ReceiveUnlock(inner) => transfer::handle_receive_unlock(chain_state, inner),
		StateChange::ReceiveLockExpired(inner) =>
			transfer::handle_receive_lock_expired(chain_state, inner),
		StateChange::ReceiveWithdrawRequest(inner) =>
			withdraw::handle_receive_withdraw_request(chain_state, inner),
		StateChange::ReceiveWithdrawConfirmation(inner) =>
			withdraw::handle_receive_withdraw_confirmation(chain_state, inner),
		StateChange::ReceiveWithdrawExpired(inner) =>
			withdraw::handle_receive_withdraw_expired(chain_state, inner),
		StateChange::ReceiveProcessed(inner) =>
			processed::handle_receive_processed(chain_state, inner),
		StateChange::ReceiveDelivered(inner) =>
			processed::handle_receive_delivered(chain_state, inner),
	}
}

/// Report a rejected state change. On-chain facts are never reported back.
fn rejection_events(
	state_change_kind: Kind,
	meta: Meta,
	message_identifier: Option<MessageIdentifier>,
	rejection: Rejection,
) -> Vec<Event> {
	match state_change_kind {
		Kind::ReceivedMessage =>
			vec![ErrorInvalidReceivedMessage::new(meta, message_identifier, rejection).into()],
		Kind::Action => vec![ErrorInvalidAction::new(meta, rejection).into()],
		Kind::Chain => vec![],
	}
}

/// Where a state change comes from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Kind {
	ReceivedMessage,
	Action,
	Chain,
}

impl Kind {
	fn of(state_change: &StateChange) -> Self {
		if state_change.is_received_message() {
			Kind::ReceivedMessage
		} else if state_change.is_contract_receive() || matches!(state_change, StateChange::Block(_)) {
			Kind::Chain
		} else {
			Kind::Action
		}
	}
}

/// Apply a state change to the chain state.
///
/// The original state is returned untouched when the state change is rejected or changes
/// nothing. Every accepted change which modified the state bumps its version.
pub fn state_transition(chain_state: ChainState, state_change: StateChange) -> Transition {
	let kind = Kind::of(&state_change);
	let meta = state_change.meta();
	let message_identifier = received_message_identifier(&state_change);

	let mut new_state = chain_state.clone();
	match dispatch(&mut new_state, state_change) {
		Ok(update) if update.dirty => {
			new_state.version += 1;
			Transition { new_state, events: update.events, changed: true }
		},
		Ok(update) => Transition { new_state: chain_state, events: update.events, changed: false },
		Err(rejection) => Transition {
			new_state: chain_state,
			events: rejection_events(kind, meta, message_identifier, rejection),
			changed: false,
		},
	}
}
