#![warn(clippy::missing_docs_in_private_items)]

use raiden_light_messages::messages::Message;
use raiden_light_primitives::types::{
	Address,
	BlockTimeout,
	MessageIdentifier,
	TokenAmount,
	TokenNetworkAddress,
};

use crate::{
	errors::{
		ErrorCode,
		Rejection,
	},
	types::{
		ChainState,
		ChannelEndState,
		ChannelKey,
		ChannelState,
		ChannelStatus,
		Meta,
		PendingWithdrawState,
		StateChange,
		TransferDirection,
		TransferKey,
		TransferState,
		WithdrawKey,
	},
};

/// Returns the channel with a partner on a token network, if any.
pub fn get_channel<'a>(chain_state: &'a ChainState, key: &ChannelKey) -> Option<&'a ChannelState> {
	chain_state.channels.get(key)
}

/// Returns the total balance of the sender's side of a channel.
pub fn channel_balance(sender: &ChannelEndState, receiver: &ChannelEndState) -> TokenAmount {
	sender
		.contract_balance
		.saturating_add(receiver.transferred_amount())
		.saturating_sub(sender.total_withdraw())
		.saturating_sub(sender.transferred_amount())
}

/// Return the amount the sender can still lock or withdraw.
pub fn channel_distributable(sender: &ChannelEndState, receiver: &ChannelEndState) -> TokenAmount {
	channel_balance(sender, receiver).saturating_sub(sender.locked_amount())
}

/// How much we can send on the channel.
pub fn channel_capacity(channel: &ChannelState) -> TokenAmount {
	channel_distributable(&channel.our_state, &channel.partner_state)
}

/// How much the partner can send us on the channel.
pub fn partner_capacity(channel: &ChannelState) -> TokenAmount {
	channel_distributable(&channel.partner_state, &channel.our_state)
}

/// The highest total withdraw the sender may currently request.
pub fn max_total_withdraw(sender: &ChannelEndState, receiver: &ChannelEndState) -> TokenAmount {
	sender.total_withdraw().saturating_add(channel_distributable(sender, receiver))
}

/// Pick the first channel able to carry `amount` towards `target`.
///
/// Without paths the transfer is direct. Each path starts with the next hop and ends with the
/// target; a leading entry with our own address is skipped. Returns the channel and the full
/// route, starting with us.
pub fn select_route(
	chain_state: &ChainState,
	token_network_address: TokenNetworkAddress,
	target: Address,
	amount: TokenAmount,
	paths: &[Vec<Address>],
) -> Result<(ChannelKey, Vec<Address>), Rejection> {
	let candidates = if paths.is_empty() { vec![vec![target]] } else { paths.to_vec() };

	let mut found_channel = false;
	for path in candidates {
		let hops: Vec<Address> =
			path.into_iter().skip_while(|hop| *hop == chain_state.our_address).collect();
		let next_hop = match hops.first() {
			Some(hop) => *hop,
			None => continue,
		};
		if hops.last() != Some(&target) {
			continue
		}

		let key = ChannelKey::new(token_network_address, next_hop);
		let channel = match chain_state.channels.get(&key) {
			Some(channel) if channel.status == ChannelStatus::Open => channel,
			_ => continue,
		};
		found_channel = true;

		if channel_capacity(channel) >= amount {
			let mut route = vec![chain_state.our_address];
			route.extend(hops);
			return Ok((key, route))
		}
	}

	if found_channel {
		return Err(Rejection::new(
			ErrorCode::InsufficientCapacity,
			format!("No open channel can carry {} towards {:#x}", amount, target),
		))
	}
	Err(Rejection::new(ErrorCode::NoRoute, format!("No open channel towards {:#x}", target)))
}

pub fn get_transfer<'a>(chain_state: &'a ChainState, key: &TransferKey) -> Option<&'a TransferState> {
	chain_state.transfers.get(key)
}

/// Find the transfer owning a message identifier.
pub fn get_transfer_by_message_identifier(
	chain_state: &ChainState,
	message_identifier: MessageIdentifier,
) -> Option<&TransferState> {
	chain_state
		.transfers
		.values()
		.find(|transfer| transfer.message_identifiers().contains(&message_identifier))
}

pub fn transfers_on_channel<'a>(
	chain_state: &'a ChainState,
	channel: ChannelKey,
) -> impl Iterator<Item = &'a TransferState> {
	chain_state.transfers.values().filter(move |t| t.channel_key() == channel)
}

/// Whether a transfer record can be forgotten.
pub fn is_transfer_clearable(chain_state: &ChainState, transfer: &TransferState) -> bool {
	let channel = match chain_state.channels.get(&transfer.channel_key()) {
		Some(channel) => channel,
		None => return true,
	};

	match transfer.direction {
		TransferDirection::Sent => {
			let lock_pending = channel.our_state.lock(&transfer.secrethash()).is_some();
			(transfer.unlock.is_some() && transfer.unlock_processed.is_some()) ||
				(transfer.expired.is_some() && transfer.expired_processed.is_some()) ||
				(transfer.refund.is_some() && !lock_pending)
		},
		TransferDirection::Received =>
			transfer.is_resolved() && chain_state.block_number > transfer.expiration,
	}
}

/// A signed message waiting for its acknowledgement.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundMessage {
	pub recipient: Address,
	pub message: Message,
	pub meta: Meta,
}

impl OutboundMessage {
	fn new(recipient: Address, message: Message, meta: Meta) -> Self {
		Self { recipient, message, meta }
	}
}

fn withdraw_meta(channel: ChannelKey, total_withdraw: TokenAmount) -> Meta {
	Meta::Withdraw(WithdrawKey { channel, total_withdraw })
}

/// Every signed message that must be sent again until it is acknowledged.
pub fn pending_outbound_messages(chain_state: &ChainState) -> Vec<OutboundMessage> {
	let mut messages = vec![];
	let block_number = chain_state.block_number;

	for transfer in chain_state.transfers.values() {
		let meta = Meta::Transfer(transfer.key());
		let channel_status = chain_state.channels.get(&transfer.channel_key()).map(|c| c.status);
		let channel_usable =
			matches!(channel_status, Some(ChannelStatus::Open) | Some(ChannelStatus::Closing));

		match transfer.direction {
			TransferDirection::Sent => {
				if channel_usable &&
					transfer.transfer_processed.is_none() &&
					!transfer.is_resolved() &&
					transfer.refund.is_none() &&
					transfer.failed.is_none()
				{
					messages.push(OutboundMessage::new(
						transfer.partner,
						Message::LockedTransfer(transfer.transfer.clone()),
						meta,
					));
				}
				if let (Some(unlock), None) = (&transfer.unlock, &transfer.unlock_processed) {
					if channel_usable {
						messages.push(OutboundMessage::new(
							transfer.partner,
							Message::Unlock(unlock.clone()),
							meta,
						));
					}
				}
				if let (Some(expired), None) = (&transfer.expired, &transfer.expired_processed) {
					if channel_status.is_some() {
						messages.push(OutboundMessage::new(
							transfer.partner,
							Message::LockExpired(expired.clone()),
							meta,
						));
					}
				}
			},
			TransferDirection::Received => {
				let secret_known = chain_state.secrets.contains_key(&transfer.secrethash());
				if let Some(request) = &transfer.secret_request {
					if !transfer.secret_request_delivered &&
						!secret_known && !transfer.is_resolved() &&
						block_number < transfer.expiration
					{
						messages.push(OutboundMessage::new(
							transfer.transfer.initiator,
							Message::SecretRequest(request.clone()),
							meta,
						));
					}
				}
				if let Some(reveal) = &transfer.secret_reveal {
					if !transfer.secret_reveal_delivered && !transfer.is_resolved() {
						messages.push(OutboundMessage::new(
							transfer.partner,
							Message::SecretReveal(reveal.clone()),
							meta,
						));
					}
				}
			},
		}
	}

	for (key, channel) in chain_state.channels.iter() {
		for withdraw in channel.our_state.withdraws_pending.values() {
			let meta = withdraw_meta(*key, withdraw.total_withdraw);
			if channel.status == ChannelStatus::Open &&
				withdraw.confirmation.is_none() &&
				!withdraw.failed &&
				block_number <= withdraw.expiration
			{
				messages.push(OutboundMessage::new(
					key.partner,
					Message::WithdrawRequest(withdraw.request.clone()),
					meta,
				));
			}
		}
		for withdraw in channel.partner_state.withdraws_pending.values() {
			let meta = withdraw_meta(*key, withdraw.total_withdraw);
			if let (Some(confirmation), None) =
				(&withdraw.confirmation, &withdraw.confirmation_processed)
			{
				if block_number <= withdraw.expiration {
					messages.push(OutboundMessage::new(
						key.partner,
						Message::WithdrawConfirmation(confirmation.clone()),
						meta,
					));
				}
			}
		}
		for expired in channel.our_state.withdraws_expired.iter().filter(|e| e.processed.is_none()) {
			let meta = withdraw_meta(*key, expired.total_withdraw);
			messages.push(OutboundMessage::new(
				key.partner,
				Message::WithdrawExpired(expired.message.clone()),
				meta,
			));
		}
	}

	messages
}

/// Received transfers whose secret should be registered on-chain before the lock expires.
pub fn danger_zone_transfers(chain_state: &ChainState, margin: BlockTimeout) -> Vec<&TransferState> {
	let block_number = chain_state.block_number;
	chain_state
		.transfers
		.values()
		.filter(|t| t.direction == TransferDirection::Received)
		.filter(|t| !t.is_resolved())
		.filter(|t| {
			matches!(
				chain_state.secrets.get(&t.secrethash()),
				Some(secret) if secret.registered_block.is_none()
			)
		})
		.filter(|t| {
			chain_state
				.channels
				.get(&t.channel_key())
				.map(|c| c.partner_state.lock(&t.secrethash()).is_some())
				.unwrap_or(false)
		})
		.filter(|t| block_number < t.expiration)
		.filter(|t| t.channel_closed.is_some() || block_number.saturating_add(margin) >= t.expiration)
		.collect()
}

/// Sent transfers whose lock expired and can be removed off-chain.
pub fn expirable_transfers(chain_state: &ChainState) -> Vec<&TransferState> {
	chain_state
		.transfers
		.values()
		.filter(|t| t.direction == TransferDirection::Sent)
		.filter(|t| !t.is_resolved())
		.filter(|t| chain_state.block_number > t.expiration)
		.filter(|t| {
			matches!(
				chain_state.channels.get(&t.channel_key()),
				Some(c) if matches!(c.status, ChannelStatus::Open | ChannelStatus::Closing) &&
					c.our_state.lock(&t.secrethash()).is_some()
			)
		})
		.collect()
}

/// Our withdraw requests past their expiration.
pub fn expirable_withdraws(chain_state: &ChainState) -> Vec<(ChannelKey, &PendingWithdrawState)> {
	chain_state
		.channels
		.iter()
		.filter(|(_, channel)| channel.status == ChannelStatus::Open)
		.flat_map(|(key, channel)| {
			channel
				.our_state
				.withdraws_pending
				.values()
				.filter(|w| chain_state.block_number > w.expiration)
				.map(move |w| (*key, w))
		})
		.collect()
}

/// The peer and identifier a `Processed` reply is owed for, if the received message was accepted.
pub fn acknowledgeable_message(
	chain_state: &ChainState,
	state_change: &StateChange,
) -> Option<(Address, MessageIdentifier)> {
	match state_change {
		StateChange::ReceiveLockedTransfer(inner) => {
			let key = TransferKey::received(inner.message.lock.secrethash);
			let transfer = chain_state.transfers.get(&key)?;
			(transfer.partner == inner.sender && transfer.transfer == inner.message)
				.then(|| (inner.sender, inner.message.message_identifier))
		},
		StateChange::ReceiveTransferRefund(inner) => {
			let key = TransferKey::sent(inner.message.lock.secrethash);
			let transfer = chain_state.transfers.get(&key)?;
			(transfer.partner == inner.sender && transfer.refund.as_ref() == Some(&inner.message))
				.then(|| (inner.sender, inner.message.message_identifier))
		},
		StateChange::ReceiveUnlock(inner) => {
			let key = TransferKey::received(inner.message.secrethash());
			let transfer = chain_state.transfers.get(&key)?;
			(transfer.partner == inner.sender && transfer.unlock.as_ref() == Some(&inner.message))
				.then(|| (inner.sender, inner.message.message_identifier))
		},
		StateChange::ReceiveLockExpired(inner) => {
			let key = TransferKey::received(inner.message.secrethash);
			let transfer = chain_state.transfers.get(&key)?;
			(transfer.partner == inner.sender && transfer.expired.as_ref() == Some(&inner.message))
				.then(|| (inner.sender, inner.message.message_identifier))
		},
		StateChange::ReceiveWithdrawConfirmation(inner) => {
			let key = ChannelKey::new(inner.message.token_network_address, inner.sender);
			let channel = chain_state.channels.get(&key)?;
			let pending = channel.our_state.withdraws_pending.get(&inner.message.total_withdraw)?;
			(pending.confirmation.as_ref() == Some(&inner.message))
				.then(|| (inner.sender, inner.message.message_identifier))
		},
		StateChange::ReceiveWithdrawExpired(inner) => {
			let key = ChannelKey::new(inner.message.token_network_address, inner.sender);
			let channel = chain_state.channels.get(&key)?;
			channel
				.partner_state
				.withdraws_expired
				.iter()
				.any(|expired| expired.message == inner.message)
				.then(|| (inner.sender, inner.message.message_identifier))
		},
		_ => None,
	}
}
