use std::sync::Arc;

use async_trait::async_trait;
use raiden_light_blockchain::signer::sign;
use raiden_light_messages::messages::LockedTransfer;
use raiden_light_primitives::types::SecretHash;
use raiden_light_state_machine::{
	errors::ErrorCode,
	machine::transfer::{
		make_lock_expired,
		make_locked_transfer,
		make_unlock,
	},
	types::{
		ActionInitTransfer,
		ActionLockExpiredSigned,
		ActionTransferExpire,
		ActionTransferSigned,
		ActionUnlockSigned,
		ChainState,
		ChannelKey,
		Meta,
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

/// The transfer already signed for `init`, if any.
fn signed_transfer(
	state: &ChainState,
	init: &ActionInitTransfer,
) -> Result<Option<LockedTransfer>, EngineError> {
	let key = TransferKey::sent(init.secrethash);
	match state.transfers.get(&key) {
		Some(transfer) if transfer.transfer.target == init.target && transfer.value() == init.value =>
			Ok(Some(transfer.transfer.clone())),
		Some(_) => Err(EngineError::Rejected {
			meta: Meta::Transfer(key),
			code: ErrorCode::TransferConflict,
			reason: "Another transfer with this secrethash was already sent".to_owned(),
		}),
		None => Ok(None),
	}
}

/// Sign the locked transfer of an accepted payment intent.
///
/// Concurrent calls for the same secrethash share one signature, later calls get the cached one.
pub async fn sign_transfer(
	ctx: &Context,
	init: ActionInitTransfer,
) -> Result<LockedTransfer, EngineError> {
	let inner = ctx.clone();
	ctx.transfers
		.run(init.secrethash, async move { sign_transfer_once(&inner, init).await })
		.await
}

async fn sign_transfer_once(
	ctx: &Context,
	init: ActionInitTransfer,
) -> Result<LockedTransfer, EngineError> {
	let meta = Meta::Transfer(TransferKey::sent(init.secrethash));
	if let Some(transfer) = signed_transfer(&ctx.dispatcher.state(), &init)? {
		return Ok(transfer)
	}
	let (_, partner) =
		make_locked_transfer(&ctx.dispatcher.state(), &init).map_err(|r| rejected(meta, r))?;

	let _guard = ctx
		.channel_locks
		.lock(ChannelKey::new(init.token_network_address, partner))
		.await;
	let state = ctx.dispatcher.state();
	if let Some(transfer) = signed_transfer(&state, &init)? {
		return Ok(transfer)
	}
	let (message, partner) = make_locked_transfer(&state, &init).map_err(|r| rejected(meta, r))?;
	let message = sign(ctx.signer.as_ref(), message).await?;
	ctx.dispatcher
		.dispatch_and_wait(ActionTransferSigned { message: message.clone(), fee: init.fee, partner })
		.await?
		.accepted()?;

	info!(
		message = "Transfer signed",
		secrethash = format!("{:#x}", init.secrethash),
		partner = format!("{:#x}", partner),
		amount = message.lock.amount.to_string(),
	);
	Ok(message)
}

/// Unlocks sent transfers once their payee proved it knows the secret, and expires the ones
/// whose lock ran out.
pub struct TransferProcess {
	ctx: Context,
}

impl TransferProcess {
	pub fn new(ctx: Context) -> Self {
		Self { ctx }
	}

	async fn unlock(&self, transfer: &TransferState) -> Result<(), EngineError> {
		let secrethash = transfer.secrethash();
		let meta = Meta::Transfer(transfer.key());
		let _guard = self.ctx.channel_locks.lock(transfer.channel_key()).await;

		let state = self.ctx.dispatcher.state();
		match state.transfers.get(&transfer.key()) {
			Some(current) if needs_unlock(&state, current) => {},
			_ => return Ok(()),
		}
		let message = make_unlock(&state, secrethash).map_err(|r| rejected(meta, r))?;
		let message = sign(self.ctx.signer.as_ref(), message).await?;
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionUnlockSigned { secrethash, message })
			.await?
			.accepted()?;
		info!(message = "Transfer unlocked", secrethash = format!("{:#x}", secrethash));
		Ok(())
	}

	async fn expire(&self, secrethash: SecretHash, channel: ChannelKey) -> Result<(), EngineError> {
		let meta = Meta::Transfer(TransferKey::sent(secrethash));
		self.ctx.dispatcher.dispatch_and_wait(ActionTransferExpire { secrethash }).await?.accepted()?;

		let _guard = self.ctx.channel_locks.lock(channel).await;
		let state = self.ctx.dispatcher.state();
		if state
			.transfers
			.get(&TransferKey::sent(secrethash))
			.map(|t| t.expired.is_some())
			.unwrap_or(true)
		{
			return Ok(())
		}
		let message = make_lock_expired(&state, secrethash).map_err(|r| rejected(meta, r))?;
		let message = sign(self.ctx.signer.as_ref(), message).await?;
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionLockExpiredSigned { secrethash, message })
			.await?
			.accepted()?;
		info!(message = "Transfer expired", secrethash = format!("{:#x}", secrethash));
		Ok(())
	}
}

/// Whether a sent transfer is ready to be unlocked.
fn needs_unlock(state: &ChainState, transfer: &TransferState) -> bool {
	transfer.direction == TransferDirection::Sent &&
		transfer.partner_revealed &&
		!transfer.is_resolved() &&
		transfer.refund.is_none() &&
		state.block_number <= transfer.expiration &&
		state.secret(&transfer.secrethash()).is_some()
}

#[async_trait]
impl Process for TransferProcess {
	fn name(&self) -> &'static str {
		"transfer"
	}

	async fn reconcile(&mut self, state: Arc<ChainState>) {
		let unlockable: Vec<TransferState> =
			state.transfers.values().filter(|t| needs_unlock(&state, t)).cloned().collect();
		for transfer in unlockable {
			if let Err(e) = self.unlock(&transfer).await {
				error!(
					message = "Could not unlock transfer",
					secrethash = format!("{:#x}", transfer.secrethash()),
					error = format!("{:?}", e),
				);
			}
		}

		let expirable: Vec<(SecretHash, ChannelKey)> = views::expirable_transfers(&state)
			.into_iter()
			.map(|t| (t.secrethash(), t.channel_key()))
			.collect();
		for (secrethash, channel) in expirable {
			if let Err(e) = self.expire(secrethash, channel).await {
				debug!(
					message = "Could not expire transfer",
					secrethash = format!("{:#x}", secrethash),
					error = format!("{:?}", e),
				);
			}
		}
	}

	async fn on_reduced(&mut self, reduced: Reduced) {
		if !reduced.changed {
			return
		}
		let state = self.ctx.dispatcher.state();
		self.reconcile(state).await;
	}
}
