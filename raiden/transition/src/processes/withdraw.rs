use std::{
	collections::HashSet,
	sync::Arc,
};

use async_trait::async_trait;
use raiden_light_blockchain::{
	signer::sign,
	transactions::{
		set_total_withdraw_params,
		Transaction,
	},
};
use raiden_light_messages::messages::WithdrawRequest;
use raiden_light_primitives::types::TokenAmount;
use raiden_light_state_machine::{
	machine::withdraw::{
		make_withdraw_confirmation,
		make_withdraw_expired,
		make_withdraw_request,
	},
	types::{
		ActionWithdrawConfirmationSigned,
		ActionWithdrawExpiredSigned,
		ActionWithdrawFailed,
		ActionWithdrawRequest,
		ActionWithdrawRequestSigned,
		ChainState,
		ChannelKey,
		ChannelStatus,
		Meta,
		WithdrawKey,
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

/// Sign our withdraw request for an accepted withdraw intent. Repeated intents get the pending
/// request back.
pub async fn request_withdraw(
	ctx: &Context,
	action: ActionWithdrawRequest,
) -> Result<WithdrawRequest, EngineError> {
	let key = WithdrawKey { channel: action.channel, total_withdraw: action.total_withdraw };
	let inner = ctx.clone();
	ctx.withdraws.run(key, async move { request_withdraw_once(&inner, action).await }).await
}

async fn request_withdraw_once(
	ctx: &Context,
	action: ActionWithdrawRequest,
) -> Result<WithdrawRequest, EngineError> {
	let meta = Meta::Withdraw(WithdrawKey {
		channel: action.channel,
		total_withdraw: action.total_withdraw,
	});
	let _guard = ctx.channel_locks.lock(action.channel).await;

	let state = ctx.dispatcher.state();
	if let Some(pending) = views::get_channel(&state, &action.channel)
		.and_then(|channel| channel.our_state.withdraws_pending.get(&action.total_withdraw))
	{
		return Ok(pending.request.clone())
	}
	let message = make_withdraw_request(&state, &action).map_err(|r| rejected(meta, r))?;
	let message = sign(ctx.signer.as_ref(), message).await?;
	ctx.dispatcher
		.dispatch_and_wait(ActionWithdrawRequestSigned {
			channel: action.channel,
			message: message.clone(),
		})
		.await?
		.accepted()?;
	info!(
		message = "Withdraw requested",
		channel = action.channel.to_string(),
		total_withdraw = action.total_withdraw.to_string(),
	);
	Ok(message)
}

/// Keep the keys of withdraws still pending on our side.
pub(crate) fn prune_withdraw_keys(keys: &mut HashSet<WithdrawKey>, state: &ChainState) {
	keys.retain(|key| {
		views::get_channel(state, &key.channel)
			.map(|channel| channel.our_state.withdraws_pending.contains_key(&key.total_withdraw))
			.unwrap_or(false)
	});
}

/// Confirms the partner's withdraw requests, submits our confirmed ones on-chain and expires
/// our requests left unconfirmed.
pub struct WithdrawProcess {
	ctx: Context,
	/// Keys of our pending withdraws already handed to the chain or to expiry. Released once the
	/// withdraw leaves the pending set, or on a failed expiry.
	submitted: HashSet<WithdrawKey>,
	expiring: HashSet<WithdrawKey>,
}

impl WithdrawProcess {
	pub fn new(ctx: Context) -> Self {
		Self { ctx, submitted: HashSet::new(), expiring: HashSet::new() }
	}

	async fn confirm(&self, channel: ChannelKey, total_withdraw: TokenAmount) -> Result<(), EngineError> {
		let meta = Meta::Withdraw(WithdrawKey { channel, total_withdraw });
		let _guard = self.ctx.channel_locks.lock(channel).await;

		let state = self.ctx.dispatcher.state();
		let message = make_withdraw_confirmation(&state, &channel, total_withdraw)
			.map_err(|r| rejected(meta, r))?;
		let message = sign(self.ctx.signer.as_ref(), message).await?;
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionWithdrawConfirmationSigned { channel, message })
			.await?
			.accepted()?;
		info!(
			message = "Partner withdraw confirmed",
			channel = channel.to_string(),
			total_withdraw = total_withdraw.to_string(),
		);
		Ok(())
	}

	async fn expire(&self, channel: ChannelKey, total_withdraw: TokenAmount) -> Result<(), EngineError> {
		let meta = Meta::Withdraw(WithdrawKey { channel, total_withdraw });
		let _guard = self.ctx.channel_locks.lock(channel).await;

		let state = self.ctx.dispatcher.state();
		let message = make_withdraw_expired(&state, &channel, total_withdraw)
			.map_err(|r| rejected(meta, r))?;
		let message = sign(self.ctx.signer.as_ref(), message).await?;
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionWithdrawExpiredSigned { channel, message })
			.await?
			.accepted()?;
		info!(
			message = "Withdraw expired",
			channel = channel.to_string(),
			total_withdraw = total_withdraw.to_string(),
		);
		Ok(())
	}

	fn submit(&mut self, state: &ChainState, key: WithdrawKey) {
		if !self.submitted.insert(key) {
			return
		}
		let params = match views::get_channel(state, &key.channel)
			.and_then(|channel| channel.our_state.withdraws_pending.get(&key.total_withdraw))
			.map(set_total_withdraw_params)
		{
			Some(Ok(params)) => params,
			Some(Err(e)) => {
				error!(message = "Could not build withdraw", error = format!("{:?}", e));
				return
			},
			None => return,
		};

		let ctx = self.ctx.clone();
		tokio::spawn(async move {
			if let Err(e) = ctx.submit(Transaction::SetTotalWithdraw(params)).await {
				let failed = ActionWithdrawFailed {
					channel: key.channel,
					total_withdraw: key.total_withdraw,
					reason: e.to_string(),
				};
				if let Err(e) = ctx.dispatcher.dispatch(failed).await {
					debug!(message = "Could not report failed withdraw", error = format!("{:?}", e));
				}
			}
		});
	}
}

#[async_trait]
impl Process for WithdrawProcess {
	fn name(&self) -> &'static str {
		"withdraw"
	}

	async fn reconcile(&mut self, state: Arc<ChainState>) {
		prune_withdraw_keys(&mut self.submitted, &state);
		prune_withdraw_keys(&mut self.expiring, &state);
		let block_number = state.block_number;
		let mut confirmations = vec![];
		let mut confirmed = vec![];
		for (key, channel) in state.channels.iter() {
			if channel.status != ChannelStatus::Open {
				continue
			}
			for pending in channel.partner_state.withdraws_pending.values() {
				if pending.confirmation.is_none() && block_number <= pending.expiration {
					confirmations.push((*key, pending.total_withdraw));
				}
			}
			for pending in channel.our_state.withdraws_pending.values() {
				if pending.confirmation.is_some() && !pending.failed {
					confirmed.push(WithdrawKey { channel: *key, total_withdraw: pending.total_withdraw });
				}
			}
		}

		for (channel, total_withdraw) in confirmations {
			if let Err(e) = self.confirm(channel, total_withdraw).await {
				debug!(
					message = "Could not confirm withdraw",
					channel = channel.to_string(),
					error = format!("{:?}", e),
				);
			}
		}

		for key in confirmed {
			self.submit(&state, key);
		}

		let expirable: Vec<WithdrawKey> = views::expirable_withdraws(&state)
			.into_iter()
			.map(|(channel, pending)| WithdrawKey { channel, total_withdraw: pending.total_withdraw })
			.collect();
		for key in expirable {
			if !self.expiring.insert(key) {
				continue
			}
			if let Err(e) = self.expire(key.channel, key.total_withdraw).await {
				self.expiring.remove(&key);
				debug!(
					message = "Could not expire withdraw",
					channel = key.channel.to_string(),
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
