use std::{
	collections::HashMap,
	sync::Arc,
};

use async_trait::async_trait;
use raiden_light_blockchain::signer::sign;
use raiden_light_messages::messages::{
	Delivered,
	Message,
	Processed,
};
use raiden_light_primitives::types::{
	Address,
	MessageIdentifier,
	SecretHash,
};
use raiden_light_state_machine::{
	types::{
		ActionProcessedSigned,
		ChainState,
		StateChange,
	},
	views,
};
use tracing::{
	debug,
	error,
};

use super::{
	Context,
	Process,
};
use crate::{
	errors::EngineError,
	transitioner::Reduced,
};

/// Answers accepted messages: `Processed` for balance proofs and withdraw replies, `Delivered`
/// for secret messages. Duplicates get the reply signed the first time.
pub struct AckProcess {
	ctx: Context,
	/// Signed `Delivered` replies, kept while a transfer with the same secrethash is in state.
	delivered: HashMap<MessageIdentifier, (SecretHash, Delivered)>,
}

impl AckProcess {
	pub fn new(ctx: Context) -> Self {
		Self { ctx, delivered: HashMap::new() }
	}

	async fn processed(
		&self,
		recipient: Address,
		message_identifier: MessageIdentifier,
	) -> Result<Processed, EngineError> {
		if let Some(processed) = self.ctx.dispatcher.state().processed.get(&message_identifier) {
			return Ok(processed.clone())
		}

		let processed = sign(self.ctx.signer.as_ref(), Processed::new(message_identifier)).await?;
		let reduced = self
			.ctx
			.dispatcher
			.dispatch_and_wait(ActionProcessedSigned { recipient, message: processed.clone() })
			.await?
			.accepted()?;
		// A concurrent duplicate may have been cached first.
		Ok(reduced.state.processed.get(&message_identifier).cloned().unwrap_or(processed))
	}

	async fn delivered(
		&mut self,
		secrethash: SecretHash,
		message_identifier: MessageIdentifier,
	) -> Result<Delivered, EngineError> {
		if let Some((_, delivered)) = self.delivered.get(&message_identifier) {
			return Ok(delivered.clone())
		}
		let delivered = sign(self.ctx.signer.as_ref(), Delivered::new(message_identifier)).await?;
		self.delivered.insert(message_identifier, (secrethash, delivered.clone()));
		Ok(delivered)
	}


	async fn reply(&self, recipient: Address, message: Message) {
		if let Err(e) = self.ctx.transport.send(recipient, &message).await {
			debug!(
				message = "Could not send reply",
				kind = message.type_name(),
				recipient = format!("{:#x}", recipient),
				error = format!("{:?}", e),
			);
		}
	}
}

/// Drop the receipts of secret messages whose transfers are gone from state.
pub(crate) fn prune_delivered(
	delivered: &mut HashMap<MessageIdentifier, (SecretHash, Delivered)>,
	state: &ChainState,
) {
	delivered
		.retain(|_, (secrethash, _)| state.transfers.keys().any(|key| key.secrethash == *secrethash));
}

/// The sender, secrethash and identifier of an accepted secret message.
fn deliverable_message(reduced: &Reduced) -> Option<(Address, SecretHash, MessageIdentifier)> {
	if reduced.rejection().is_some() {
		return None
	}
	match &reduced.state_change {
		StateChange::ReceiveSecretRequest(inner) =>
			Some((inner.sender, inner.message.secrethash, inner.message.message_identifier)),
		StateChange::ReceiveSecretReveal(inner) =>
			Some((inner.sender, inner.message.secrethash(), inner.message.message_identifier)),
		_ => None,
	}
}

#[async_trait]
impl Process for AckProcess {
	fn name(&self) -> &'static str {
		"ack"
	}

	async fn reconcile(&mut self, state: Arc<ChainState>) {
		prune_delivered(&mut self.delivered, &state);
	}

	async fn on_reduced(&mut self, reduced: Reduced) {
		if reduced.changed {
			prune_delivered(&mut self.delivered, &reduced.state);
		}

		if let Some((recipient, message_identifier)) =
			views::acknowledgeable_message(&reduced.state, &reduced.state_change)
		{
			match self.processed(recipient, message_identifier).await {
				Ok(processed) => self.reply(recipient, Message::Processed(processed)).await,
				Err(e) => error!(
					message = "Could not sign processed",
					message_identifier = message_identifier,
					error = format!("{:?}", e),
				),
			}
		}

		if let Some((recipient, secrethash, message_identifier)) = deliverable_message(&reduced) {
			if recipient == reduced.state.our_address {
				return
			}
			match self.delivered(secrethash, message_identifier).await {
				Ok(delivered) => self.reply(recipient, Message::Delivered(delivered)).await,
				Err(e) => error!(
					message = "Could not sign delivered",
					message_identifier = message_identifier,
					error = format!("{:?}", e),
				),
			}
		}
	}
}
