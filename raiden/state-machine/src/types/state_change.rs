#![warn(clippy::missing_docs_in_private_items)]

use raiden_light_macros::IntoStateChange;
use raiden_light_messages::messages::{
	Delivered,
	LockExpired,
	LockedTransfer,
	Processed,
	RefundTransfer,
	SecretRequest,
	SecretReveal,
	Unlock,
	WithdrawConfirmation,
	WithdrawExpired,
	WithdrawRequest,
};
use raiden_light_primitives::types::{
	Address,
	BlockExpiration,
	BlockNumber,
	BlockTimeout,
	ChannelIdentifier,
	PaymentIdentifier,
	Secret,
	SecretHash,
	SettleTimeout,
	TokenAddress,
	TokenAmount,
	TokenNetworkAddress,
};
use serde::{
	Deserialize,
	Serialize,
};

use crate::types::{
	ChannelKey,
	Meta,
	TransferKey,
	WithdrawKey,
};

/// An enum containing all possible state change variants.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type")]
#[allow(clippy::large_enum_variant)]
pub enum StateChange {
	Block(Block),
	ActionChannelOpen(ActionChannelOpen),
	ContractReceiveChannelOpened(ContractReceiveChannelOpened),
	ActionChannelDeposit(ActionChannelDeposit),
	ContractReceiveChannelDeposit(ContractReceiveChannelDeposit),
	ActionChannelClose(ActionChannelClose),
	ContractReceiveChannelClosed(ContractReceiveChannelClosed),
	ActionChannelSettle(ActionChannelSettle),
	ContractReceiveChannelSettled(ContractReceiveChannelSettled),
	ActionChannelTransactionFailed(ActionChannelTransactionFailed),
	ContractReceiveChannelWithdraw(ContractReceiveChannelWithdraw),
	ContractReceiveSecretRevealed(ContractReceiveSecretRevealed),
	ActionInitTransfer(ActionInitTransfer),
	ActionTransferSecret(ActionTransferSecret),
	ActionTransferSigned(ActionTransferSigned),
	ActionTransferExpire(ActionTransferExpire),
	ActionTransferFailed(ActionTransferFailed),
	ActionTransferClear(ActionTransferClear),
	ActionSecretRegistrationFailed(ActionSecretRegistrationFailed),
	ActionUnlockSigned(ActionUnlockSigned),
	ActionLockExpiredSigned(ActionLockExpiredSigned),
	ActionSecretRequestSigned(ActionSecretRequestSigned),
	ActionSecretRevealSigned(ActionSecretRevealSigned),
	ActionProcessedSigned(ActionProcessedSigned),
	ActionWithdrawRequest(ActionWithdrawRequest),
	ActionWithdrawRequestSigned(ActionWithdrawRequestSigned),
	ActionWithdrawConfirmationSigned(ActionWithdrawConfirmationSigned),
	ActionWithdrawExpiredSigned(ActionWithdrawExpiredSigned),
	ActionWithdrawFailed(ActionWithdrawFailed),
	ReceiveLockedTransfer(ReceiveLockedTransfer),
	ReceiveTransferRefund(ReceiveTransferRefund),
	ReceiveSecretRequest(ReceiveSecretRequest),
	ReceiveSecretReveal(ReceiveSecretReveal),
	ReceiveUnlock(ReceiveUnlock),
	ReceiveLockExpired(ReceiveLockExpired),
	ReceiveWithdrawRequest(ReceiveWithdrawRequest),
	ReceiveWithdrawConfirmation(ReceiveWithdrawConfirmation),
	ReceiveWithdrawExpired(ReceiveWithdrawExpired),
	ReceiveProcessed(ReceiveProcessed),
	ReceiveDelivered(ReceiveDelivered),
}

impl StateChange {
	/// Returns a string of the inner state change's type name.
	pub fn type_name(&self) -> &'static str {
		match self {
			StateChange::Block(_) => "Block",
			StateChange::ActionChannelOpen(_) => "ActionChannelOpen",
			StateChange::ContractReceiveChannelOpened(_) => "ContractReceiveChannelOpened",
			StateChange::ActionChannelDeposit(_) => "ActionChannelDeposit",
			StateChange::ContractReceiveChannelDeposit(_) => "ContractReceiveChannelDeposit",
			StateChange::ActionChannelClose(_) => "ActionChannelClose",
			StateChange::ContractReceiveChannelClosed(_) => "ContractReceiveChannelClosed",
			StateChange::ActionChannelSettle(_) => "ActionChannelSettle",
			StateChange::ContractReceiveChannelSettled(_) => "ContractReceiveChannelSettled",
			StateChange::ActionChannelTransactionFailed(_) => "ActionChannelTransactionFailed",
			StateChange::ContractReceiveChannelWithdraw(_) => "ContractReceiveChannelWithdraw",
			StateChange::ContractReceiveSecretRevealed(_) => "ContractReceiveSecretRevealed",
			StateChange::ActionInitTransfer(_) => "ActionInitTransfer",
			StateChange::ActionTransferSecret(_) => "ActionTransferSecret",
			StateChange::ActionTransferSigned(_) => "ActionTransferSigned",
			StateChange::ActionTransferExpire(_) => "ActionTransferExpire",
			StateChange::ActionTransferFailed(_) => "ActionTransferFailed",
			StateChange::ActionTransferClear(_) => "ActionTransferClear",
			StateChange::ActionSecretRegistrationFailed(_) => "ActionSecretRegistrationFailed",
			StateChange::ActionUnlockSigned(_) => "ActionUnlockSigned",
			StateChange::ActionLockExpiredSigned(_) => "ActionLockExpiredSigned",
			StateChange::ActionSecretRequestSigned(_) => "ActionSecretRequestSigned",
			StateChange::ActionSecretRevealSigned(_) => "ActionSecretRevealSigned",
			StateChange::ActionProcessedSigned(_) => "ActionProcessedSigned",
			StateChange::ActionWithdrawRequest(_) => "ActionWithdrawRequest",
			StateChange::ActionWithdrawRequestSigned(_) => "ActionWithdrawRequestSigned",
			StateChange::ActionWithdrawConfirmationSigned(_) => "ActionWithdrawConfirmationSigned",
			StateChange::ActionWithdrawExpiredSigned(_) => "ActionWithdrawExpiredSigned",
			StateChange::ActionWithdrawFailed(_) => "ActionWithdrawFailed",
			StateChange::ReceiveLockedTransfer(_) => "ReceiveLockedTransfer",
			StateChange::ReceiveTransferRefund(_) => "ReceiveTransferRefund",
			StateChange::ReceiveSecretRequest(_) => "ReceiveSecretRequest",
			StateChange::ReceiveSecretReveal(_) => "ReceiveSecretReveal",
			StateChange::ReceiveUnlock(_) => "ReceiveUnlock",
			StateChange::ReceiveLockExpired(_) => "ReceiveLockExpired",
			StateChange::ReceiveWithdrawRequest(_) => "ReceiveWithdrawRequest",
			StateChange::ReceiveWithdrawConfirmation(_) => "ReceiveWithdrawConfirmation",
			StateChange::ReceiveWithdrawExpired(_) => "ReceiveWithdrawExpired",
			StateChange::ReceiveProcessed(_) => "ReceiveProcessed",
			StateChange::ReceiveDelivered(_) => "ReceiveDelivered",
		}
	}

	/// The routing key of the state change.
	pub fn meta(&self) -> Meta {
		match self {
			StateChange::Block(_) => Meta::Chain,
			StateChange::ActionChannelOpen(inner) => Meta::Channel(inner.channel_key()),
			StateChange::ContractReceiveChannelOpened(inner) => Meta::Channel(inner.channel_key()),
			StateChange::ActionChannelDeposit(inner) => Meta::Channel(inner.channel),
			StateChange::ContractReceiveChannelDeposit(inner) => Meta::Channel(inner.channel),
			StateChange::ActionChannelClose(inner) => Meta::Channel(inner.channel),
			StateChange::ContractReceiveChannelClosed(inner) => Meta::Channel(inner.channel),
			StateChange::ActionChannelSettle(inner) => Meta::Channel(inner.channel),
			StateChange::ContractReceiveChannelSettled(inner) => Meta::Channel(inner.channel),
			StateChange::ActionChannelTransactionFailed(inner) => Meta::Channel(inner.channel),
			StateChange::ContractReceiveChannelWithdraw(inner) => Meta::Withdraw(WithdrawKey {
				channel: inner.channel,
				total_withdraw: inner.total_withdraw,
			}),
			StateChange::ContractReceiveSecretRevealed(inner) =>
				Meta::Transfer(TransferKey::received(inner.secrethash)),
			StateChange::ActionInitTransfer(inner) =>
				Meta::Transfer(TransferKey::sent(inner.secrethash)),
			StateChange::ActionTransferSecret(inner) =>
				Meta::Transfer(TransferKey::sent(inner.secrethash)),
			StateChange::ActionTransferSigned(inner) =>
				Meta::Transfer(TransferKey::sent(inner.message.lock.secrethash)),
			StateChange::ActionTransferExpire(inner) =>
				Meta::Transfer(TransferKey::sent(inner.secrethash)),
			StateChange::ActionTransferFailed(inner) =>
				Meta::Transfer(TransferKey::sent(inner.secrethash)),
			StateChange::ActionTransferClear(inner) => Meta::Transfer(inner.key),
			StateChange::ActionSecretRegistrationFailed(inner) =>
				Meta::Transfer(TransferKey::received(inner.secrethash)),
			StateChange::ActionUnlockSigned(inner) =>
				Meta::Transfer(TransferKey::sent(inner.secrethash)),
			StateChange::ActionLockExpiredSigned(inner) =>
				Meta::Transfer(TransferKey::sent(inner.secrethash)),
			StateChange::ActionSecretRequestSigned(inner) =>
				Meta::Transfer(TransferKey::received(inner.secrethash)),
			StateChange::ActionSecretRevealSigned(inner) => Meta::Transfer(inner.key),
			StateChange::ActionProcessedSigned(inner) =>
				Meta::Message(inner.message.message_identifier),
			StateChange::ActionWithdrawRequest(inner) => Meta::Withdraw(WithdrawKey {
				channel: inner.channel,
				total_withdraw: inner.total_withdraw,
			}),
			StateChange::ActionWithdrawRequestSigned(inner) => Meta::Withdraw(WithdrawKey {
				channel: inner.channel,
				total_withdraw: inner.message.total_withdraw,
			}),
			StateChange::ActionWithdrawConfirmationSigned(inner) => Meta::Withdraw(WithdrawKey {
				channel: inner.channel,
				total_withdraw: inner.message.total_withdraw,
			}),
			StateChange::ActionWithdrawExpiredSigned(inner) => Meta::Withdraw(WithdrawKey {
				channel: inner.channel,
				total_withdraw: inner.message.total_withdraw,
			}),
			StateChange::ActionWithdrawFailed(inner) => Meta::Withdraw(WithdrawKey {
				channel: inner.channel,
				total_withdraw: inner.total_withdraw,
			}),
			StateChange::ReceiveLockedTransfer(inner) =>
				Meta::Transfer(TransferKey::received(inner.message.lock.secrethash)),
			StateChange::ReceiveTransferRefund(inner) =>
				Meta::Transfer(TransferKey::sent(inner.message.lock.secrethash)),
			StateChange::ReceiveSecretRequest(inner) =>
				Meta::Transfer(TransferKey::sent(inner.message.secrethash)),
			StateChange::ReceiveSecretReveal(inner) =>
				Meta::Message(inner.message.message_identifier),
			StateChange::ReceiveUnlock(inner) =>
				Meta::Transfer(TransferKey::received(inner.message.secrethash())),
			StateChange::ReceiveLockExpired(inner) =>
				Meta::Transfer(TransferKey::received(inner.message.secrethash)),
			StateChange::ReceiveWithdrawRequest(inner) => Meta::Withdraw(WithdrawKey {
				channel: ChannelKey::new(inner.message.token_network_address, inner.sender),
				total_withdraw: inner.message.total_withdraw,
			}),
			StateChange::ReceiveWithdrawConfirmation(inner) => Meta::Withdraw(WithdrawKey {
				channel: ChannelKey::new(inner.message.token_network_address, inner.sender),
				total_withdraw: inner.message.total_withdraw,
			}),
			StateChange::ReceiveWithdrawExpired(inner) => Meta::Withdraw(WithdrawKey {
				channel: ChannelKey::new(inner.message.token_network_address, inner.sender),
				total_withdraw: inner.message.total_withdraw,
			}),
			StateChange::ReceiveProcessed(inner) =>
				Meta::Message(inner.message.message_identifier),
			StateChange::ReceiveDelivered(inner) =>
				Meta::Message(inner.message.delivered_message_identifier),
		}
	}

	/// Whether the state change carries a message received from a peer.
	pub fn is_received_message(&self) -> bool {
		matches!(
			self,
			StateChange::ReceiveLockedTransfer(_) |
				StateChange::ReceiveTransferRefund(_) |
				StateChange::ReceiveSecretRequest(_) |
				StateChange::ReceiveSecretReveal(_) |
				StateChange::ReceiveUnlock(_) |
				StateChange::ReceiveLockExpired(_) |
				StateChange::ReceiveWithdrawRequest(_) |
				StateChange::ReceiveWithdrawConfirmation(_) |
				StateChange::ReceiveWithdrawExpired(_) |
				StateChange::ReceiveProcessed(_) |
				StateChange::ReceiveDelivered(_)
		)
	}

	/// Whether the state change reports a confirmed on-chain event.
	pub fn is_contract_receive(&self) -> bool {
		matches!(
			self,
			StateChange::ContractReceiveChannelOpened(_) |
				StateChange::ContractReceiveChannelDeposit(_) |
				StateChange::ContractReceiveChannelClosed(_) |
				StateChange::ContractReceiveChannelSettled(_) |
				StateChange::ContractReceiveChannelWithdraw(_) |
				StateChange::ContractReceiveSecretRevealed(_)
		)
	}

	/// Block number of an on-chain event.
	pub fn block_number(&self) -> Option<BlockNumber> {
		match self {
			StateChange::Block(inner) => Some(inner.block_number),
			StateChange::ContractReceiveChannelOpened(inner) => Some(inner.block_number),
			StateChange::ContractReceiveChannelDeposit(inner) => Some(inner.block_number),
			StateChange::ContractReceiveChannelClosed(inner) => Some(inner.block_number),
			StateChange::ContractReceiveChannelSettled(inner) => Some(inner.block_number),
			StateChange::ContractReceiveChannelWithdraw(inner) => Some(inner.block_number),
			StateChange::ContractReceiveSecretRevealed(inner) => Some(inner.block_number),
			_ => None,
		}
	}
}

/// A new confirmed block.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct Block {
	pub block_number: BlockNumber,
}

/// Request to open a channel with `partner`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionChannelOpen {
	pub token_network_address: TokenNetworkAddress,
	pub token_address: TokenAddress,
	pub partner: Address,
	pub settle_timeout: Option<SettleTimeout>,
	/// Deposit submitted once the channel is confirmed open.
	pub total_deposit: TokenAmount,
}

impl ActionChannelOpen {
	pub fn channel_key(&self) -> ChannelKey {
		ChannelKey::new(self.token_network_address, self.partner)
	}
}

/// A channel with us was opened on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelOpened {
	pub token_network_address: TokenNetworkAddress,
	pub token_address: TokenAddress,
	pub partner: Address,
	pub channel_identifier: ChannelIdentifier,
	pub settle_timeout: SettleTimeout,
	pub block_number: BlockNumber,
}

impl ContractReceiveChannelOpened {
	pub fn channel_key(&self) -> ChannelKey {
		ChannelKey::new(self.token_network_address, self.partner)
	}
}

/// Request to raise our deposit to `total_deposit`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionChannelDeposit {
	pub channel: ChannelKey,
	pub total_deposit: TokenAmount,
}

/// A participant's deposit was raised on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelDeposit {
	pub channel: ChannelKey,
	pub participant: Address,
	pub total_deposit: TokenAmount,
	pub block_number: BlockNumber,
}

/// Request to close a channel.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionChannelClose {
	pub channel: ChannelKey,
}

/// A channel was closed on-chain, by either participant.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelClosed {
	pub channel: ChannelKey,
	pub channel_identifier: ChannelIdentifier,
	pub closing_participant: Address,
	pub block_number: BlockNumber,
}

/// Request to settle a settleable channel.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionChannelSettle {
	pub channel: ChannelKey,
}

/// A channel was settled on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelSettled {
	pub channel: ChannelKey,
	pub channel_identifier: ChannelIdentifier,
	pub block_number: BlockNumber,
}

/// The on-chain transactions submitted for a channel.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ChannelTransaction {
	Open,
	Deposit,
	Close,
	Settle,
}

/// A channel transaction failed after its retries ran out.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionChannelTransactionFailed {
	pub channel: ChannelKey,
	pub transaction: ChannelTransaction,
	pub reason: String,
}

/// A participant's withdraw was executed on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveChannelWithdraw {
	pub channel: ChannelKey,
	pub participant: Address,
	pub total_withdraw: TokenAmount,
	pub block_number: BlockNumber,
}

/// A secret was registered on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ContractReceiveSecretRevealed {
	pub secrethash: SecretHash,
	pub secret: Secret,
	pub block_number: BlockNumber,
}

/// Request to pay `value` to `target`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionInitTransfer {
	pub token_network_address: TokenNetworkAddress,
	pub target: Address,
	pub value: TokenAmount,
	pub fee: TokenAmount,
	pub payment_identifier: PaymentIdentifier,
	pub secrethash: SecretHash,
	/// Absent when the secret is held by someone else.
	pub secret: Option<Secret>,
	/// Candidate routes, each starting with the next hop. Empty means a direct transfer.
	pub paths: Vec<Vec<Address>>,
	pub lock_timeout: Option<BlockTimeout>,
}

/// Cache the secret of a transfer we are about to send.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionTransferSecret {
	pub secrethash: SecretHash,
	pub secret: Secret,
}

/// A locked transfer we signed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionTransferSigned {
	pub message: LockedTransfer,
	pub fee: TokenAmount,
	pub partner: Address,
}

/// Request to expire the lock of a sent transfer.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionTransferExpire {
	pub secrethash: SecretHash,
}

/// A sent transfer cannot complete.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionTransferFailed {
	pub secrethash: SecretHash,
	pub reason: String,
}

/// The secret of a received transfer could not be registered on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionSecretRegistrationFailed {
	pub secrethash: SecretHash,
	pub reason: String,
}

/// Forget a finished transfer.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionTransferClear {
	pub key: TransferKey,
}

/// An unlock we signed for a sent transfer.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionUnlockSigned {
	pub secrethash: SecretHash,
	pub message: Unlock,
}

/// A lock expiration we signed for a sent transfer.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionLockExpiredSigned {
	pub secrethash: SecretHash,
	pub message: LockExpired,
}

/// A secret request we signed for a transfer paid to us.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionSecretRequestSigned {
	pub secrethash: SecretHash,
	pub message: SecretRequest,
}

/// A secret reveal we signed, towards the payee of `key` when sent or its payer when received.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionSecretRevealSigned {
	pub key: TransferKey,
	pub message: SecretReveal,
}

/// A processed reply we signed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionProcessedSigned {
	pub recipient: Address,
	pub message: Processed,
}

/// Request to withdraw up to `total_withdraw` from our deposit.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionWithdrawRequest {
	pub channel: ChannelKey,
	pub total_withdraw: TokenAmount,
	pub expiration: Option<BlockExpiration>,
}

/// A withdraw request we signed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionWithdrawRequestSigned {
	pub channel: ChannelKey,
	pub message: WithdrawRequest,
}

/// A withdraw confirmation we signed for the partner's request.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionWithdrawConfirmationSigned {
	pub channel: ChannelKey,
	pub message: WithdrawConfirmation,
}

/// A withdraw expiration we signed for our unconfirmed request.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionWithdrawExpiredSigned {
	pub channel: ChannelKey,
	pub message: WithdrawExpired,
}

/// Our confirmed withdraw could not be submitted on-chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ActionWithdrawFailed {
	pub channel: ChannelKey,
	pub total_withdraw: TokenAmount,
	pub reason: String,
}

/// A locked transfer from a partner.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveLockedTransfer {
	pub sender: Address,
	pub message: LockedTransfer,
}

/// A refund of a transfer we sent.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveTransferRefund {
	pub sender: Address,
	pub message: RefundTransfer,
}

/// The payee of a sent transfer asks for its secret.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveSecretRequest {
	pub sender: Address,
	pub message: SecretRequest,
}

/// A peer revealed a secret.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveSecretReveal {
	pub sender: Address,
	pub message: SecretReveal,
}

/// The payer unlocked a transfer to us.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveUnlock {
	pub sender: Address,
	pub message: Unlock,
}

/// The payer expired the lock of a transfer to us.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveLockExpired {
	pub sender: Address,
	pub message: LockExpired,
}

/// The partner asks us to confirm a withdraw of theirs.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveWithdrawRequest {
	pub sender: Address,
	pub message: WithdrawRequest,
}

/// The partner confirmed our withdraw request.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveWithdrawConfirmation {
	pub sender: Address,
	pub message: WithdrawConfirmation,
}

/// The partner's withdraw request expired unconfirmed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveWithdrawExpired {
	pub sender: Address,
	pub message: WithdrawExpired,
}

/// A peer processed one of our messages.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveProcessed {
	pub sender: Address,
	pub message: Processed,
}

/// A peer received one of our messages.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, IntoStateChange)]
pub struct ReceiveDelivered {
	pub sender: Address,
	pub message: Delivered,
}
