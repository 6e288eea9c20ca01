use std::sync::Arc;

use raiden_light_messages::messages::Message;
use raiden_light_primitives::types::Address;
use raiden_light_state_machine::types::{
	ChainState,
	ReceiveDelivered,
	ReceiveLockExpired,
	ReceiveLockedTransfer,
	ReceiveProcessed,
	ReceiveSecretRequest,
	ReceiveSecretReveal,
	ReceiveTransferRefund,
	ReceiveUnlock,
	ReceiveWithdrawConfirmation,
	ReceiveWithdrawExpired,
	ReceiveWithdrawRequest,
	StateChange,
};
use tokio::sync::{
	broadcast,
	mpsc,
	oneshot,
	watch,
};

use crate::{
	errors::EngineError,
	transitioner::{
		Dispatch,
		Reduced,
	},
};

/// Cloneable input handle of the transitioner, also giving read access to its output.
#[derive(Clone)]
pub struct Dispatcher {
	sender: mpsc::Sender<Dispatch>,
	reduced: broadcast::Sender<Reduced>,
	state: watch::Receiver<Arc<ChainState>>,
}

impl Dispatcher {
	pub(crate) fn new(
		sender: mpsc::Sender<Dispatch>,
		reduced: broadcast::Sender<Reduced>,
		state: watch::Receiver<Arc<ChainState>>,
	) -> Self {
		Self { sender, reduced, state }
	}

	/// Queue a state change without waiting for it to be reduced.
	pub async fn dispatch(&self, state_change: impl Into<StateChange>) -> Result<(), EngineError> {
		self.sender
			.send(Dispatch { state_changes: vec![state_change.into()], ack: None })
			.await
			.map_err(|_| EngineError::Stopped)
	}

	/// Queue a state change and wait for its result.
	pub async fn dispatch_and_wait(
		&self,
		state_change: impl Into<StateChange>,
	) -> Result<Reduced, EngineError> {
		self.dispatch_all(vec![state_change.into()])
			.await?
			.pop()
			.ok_or(EngineError::Stopped)
	}

	/// Queue state changes to be reduced back to back and wait for their results.
	pub async fn dispatch_all(
		&self,
		state_changes: Vec<StateChange>,
	) -> Result<Vec<Reduced>, EngineError> {
		let (ack, result) = oneshot::channel();
		self.sender
			.send(Dispatch { state_changes, ack: Some(ack) })
			.await
			.map_err(|_| EngineError::Stopped)?;
		result.await.map_err(|_| EngineError::Stopped)
	}

	/// The latest reduced state.
	pub fn state(&self) -> Arc<ChainState> {
		self.state.borrow().clone()
	}

	pub fn state_receiver(&self) -> watch::Receiver<Arc<ChainState>> {
		self.state.clone()
	}

	/// Every result reduced from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<Reduced> {
		self.reduced.subscribe()
	}
}

/// The state change for a message received from `sender`.
pub fn message_to_state_change(sender: Address, message: Message) -> StateChange {
	match message {
		Message::LockedTransfer(message) => ReceiveLockedTransfer { sender, message }.into(),
		Message::RefundTransfer(message) => ReceiveTransferRefund { sender, message }.into(),
		Message::SecretRequest(message) => ReceiveSecretRequest { sender, message }.into(),
		Message::SecretReveal(message) => ReceiveSecretReveal { sender, message }.into(),
		Message::Unlock(message) => ReceiveUnlock { sender, message }.into(),
		Message::LockExpired(message) => ReceiveLockExpired { sender, message }.into(),
		Message::WithdrawRequest(message) => ReceiveWithdrawRequest { sender, message }.into(),
		Message::WithdrawConfirmation(message) =>
			ReceiveWithdrawConfirmation { sender, message }.into(),
		Message::WithdrawExpired(message) => ReceiveWithdrawExpired { sender, message }.into(),
		Message::Processed(message) => ReceiveProcessed { sender, message }.into(),
		Message::Delivered(message) => ReceiveDelivered { sender, message }.into(),
	}
}
