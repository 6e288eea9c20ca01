use std::{
	collections::HashSet,
	sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use raiden_light_blockchain::{
	signer::sign,
	transactions::{
		RegisterSecretParams,
		Transaction,
	},
};
use raiden_light_messages::messages::Message;
use raiden_light_primitives::types::{
	Address,
	SecretHash,
};
use raiden_light_state_machine::{
	machine::secret::{
		make_secret_request,
		make_secret_reveal,
	},
	types::{
		ActionSecretRegistrationFailed,
		ActionSecretRequestSigned,
		ActionSecretRevealSigned,
		ChainState,
		Meta,
		StateChange,
		TransferDirection,
		TransferKey,
		TransferState,
	},
	views,
};
use tracing::{
	debug,
	error,
	info,
};

use super::{
	rejected,
	Context,
	Process,
};
use crate::{
	errors::EngineError,
	transitioner::Reduced,
};

/// Runs our side of the secret protocol.
///
/// As payer we reveal the secret to the payee that requested it. As payee we request the
/// secret from the initiator, reveal it back to the payer once known, and register it
/// on-chain when the lock gets close to expiring.
pub struct SecretProcess {
	ctx: Context,
	/// Registrations submitted or in progress. A failed one is released to be tried again.
	registering: Arc<Mutex<HashSet<SecretHash>>>,
}

impl SecretProcess {
	pub fn new(ctx: Context) -> Self {
		Self { ctx, registering: Arc::new(Mutex::new(HashSet::new())) }
	}

	/// Answer the payee's secret request, sending the same reveal for every duplicate.
	async fn answer_request(
		&self,
		requester: Address,
		secrethash: SecretHash,
	) -> Result<(), EngineError> {
		let key = TransferKey::sent(secrethash);
		let state = self.ctx.dispatcher.state();
		let transfer = match state.transfers.get(&key) {
			Some(transfer) => transfer,
			None => return Ok(()),
		};

		let reveal = match &transfer.secret_reveal {
			Some(reveal) => reveal.clone(),
			None => {
				if transfer.is_resolved() || state.secret(&secrethash).is_none() {
					debug!(
						message = "Secret requested for a transfer we cannot reveal",
						secrethash = format!("{:#x}", secrethash),
					);
					return Ok(())
				}
				let message = make_secret_reveal(&state, key)
					.map_err(|r| rejected(Meta::Transfer(key), r))?;
				let message = sign(self.ctx.signer.as_ref(), message).await?;
				self.ctx
					.dispatcher
					.dispatch_and_wait(ActionSecretRevealSigned { key, message: message.clone() })
					.await?
					.accepted()?;
				info!(message = "Secret revealed to payee", secrethash = format!("{:#x}", secrethash));
				message
			},
		};
		self.ctx.transport.send(requester, &Message::SecretReveal(reveal)).await?;
		Ok(())
	}

	async fn request_secret(&self, secrethash: SecretHash) -> Result<(), EngineError> {
		let key = TransferKey::received(secrethash);
		let message = make_secret_request(&self.ctx.dispatcher.state(), secrethash)
			.map_err(|r| rejected(Meta::Transfer(key), r))?;
		let message = sign(self.ctx.signer.as_ref(), message).await?;
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionSecretRequestSigned { secrethash, message })
			.await?
			.accepted()?;
		debug!(message = "Secret requested", secrethash = format!("{:#x}", secrethash));
		Ok(())
	}

	async fn reveal_to_payer(&self, secrethash: SecretHash) -> Result<(), EngineError> {
		let key = TransferKey::received(secrethash);
		let message = make_secret_reveal(&self.ctx.dispatcher.state(), key)
			.map_err(|r| rejected(Meta::Transfer(key), r))?;
		let message = sign(self.ctx.signer.as_ref(), message).await?;
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionSecretRevealSigned { key, message })
			.await?
			.accepted()?;
		debug!(message = "Secret revealed to payer", secrethash = format!("{:#x}", secrethash));
		Ok(())
	}

	fn register(&self, state: &ChainState, secrethash: SecretHash) {
		let secret = match state.secret(&secrethash) {
			Some(secret) => secret.clone(),
			None => return,
		};
		if !self.registering.lock().insert(secrethash) {
			return
		}
		info!(message = "Registering secret on-chain", secrethash = format!("{:#x}", secrethash));

		let ctx = self.ctx.clone();
		let registering = self.registering.clone();
		tokio::spawn(async move {
			let transaction = Transaction::RegisterSecret(RegisterSecretParams { secret });
			if let Err(e) = ctx.submit(transaction).await {
				error!(
					message = "Could not register secret",
					secrethash = format!("{:#x}", secrethash),
					error = format!("{:?}", e),
				);
				registering.lock().remove(&secrethash);
				let failed = ActionSecretRegistrationFailed { secrethash, reason: e.to_string() };
				if let Err(e) = ctx.dispatcher.dispatch(failed).await {
					debug!(message = "Could not report failed registration", error = format!("{:?}", e));
				}
			}
		});
	}

	/// Forget registrations which landed on-chain or whose transfer is gone.
	fn prune(&self, state: &ChainState) {
		self.registering.lock().retain(|secrethash| {
			state.transfers.contains_key(&TransferKey::received(*secrethash)) &&
				state
					.secrets
					.get(secrethash)
					.map(|known| known.registered_block.is_none())
					.unwrap_or(true)
		});
	}
}

/// A received transfer paid to us which still needs its secret.
fn needs_request(state: &ChainState, transfer: &TransferState) -> bool {
	transfer.direction == TransferDirection::Received &&
		transfer.transfer.target == state.our_address &&
		transfer.secret_request.is_none() &&
		!transfer.is_resolved() &&
		state.secret(&transfer.secrethash()).is_none()
}

/// A received transfer whose payer should learn the secret from us.
fn needs_reveal(state: &ChainState, transfer: &TransferState) -> bool {
	transfer.direction == TransferDirection::Received &&
		transfer.secret_reveal.is_none() &&
		!transfer.is_resolved() &&
		transfer.channel_closed.is_none() &&
		state.secret(&transfer.secrethash()).is_some()
}

#[async_trait]
impl Process for SecretProcess {
	fn name(&self) -> &'static str {
		"secret"
	}

	async fn reconcile(&mut self, state: Arc<ChainState>) {
		let requests: Vec<SecretHash> = state
			.transfers
			.values()
			.filter(|t| needs_request(&state, t))
			.map(|t| t.secrethash())
			.collect();
		for secrethash in requests {
			if let Err(e) = self.request_secret(secrethash).await {
				debug!(
					message = "Could not request secret",
					secrethash = format!("{:#x}", secrethash),
					error = format!("{:?}", e),
				);
			}
		}

		let reveals: Vec<SecretHash> = state
			.transfers
			.values()
			.filter(|t| needs_reveal(&state, t))
			.map(|t| t.secrethash())
			.collect();
		for secrethash in reveals {
			if let Err(e) = self.reveal_to_payer(secrethash).await {
				debug!(
					message = "Could not reveal secret",
					secrethash = format!("{:#x}", secrethash),
					error = format!("{:?}", e),
				);
			}
		}

		let endangered: Vec<SecretHash> =
			views::danger_zone_transfers(&state, self.ctx.config.secret_registration_margin())
				.into_iter()
				.map(|t| t.secrethash())
				.collect();
		self.prune(&state);
		for secrethash in endangered {
			self.register(&state, secrethash);
		}
	}

	async fn on_reduced(&mut self, reduced: Reduced) {
		if let StateChange::ReceiveSecretRequest(inner) = &reduced.state_change {
			if reduced.rejection().is_none() {
				if let Err(e) = self.answer_request(inner.sender, inner.message.secrethash).await {
					error!(
						message = "Could not answer secret request",
						secrethash = format!("{:#x}", inner.message.secrethash),
						error = format!("{:?}", e),
					);
				}
			}
		}
		if reduced.changed {
			let state = self.ctx.dispatcher.state();
			self.reconcile(state).await;
		}
	}
}
