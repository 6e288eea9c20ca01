use std::{
	collections::HashMap,
	future::Future,
	sync::Arc,
};

use async_trait::async_trait;
use raiden_light_blockchain::transactions::{
	close_channel_params,
	settle_channel_params,
	OpenChannelParams,
	SetTotalDepositParams,
	Transaction,
};
use raiden_light_primitives::types::TokenAmount;
use raiden_light_state_machine::{
	errors::{
		ErrorCode,
		Rejection,
	},
	types::{
		ActionChannelDeposit,
		ActionChannelTransactionFailed,
		ChainState,
		ChannelKey,
		ChannelState,
		ChannelTransaction,
		Meta,
		StateChange,
	},
	views,
};
use tracing::{
	debug,
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

fn channel(state: &ChainState, key: ChannelKey) -> Result<&ChannelState, EngineError> {
	views::get_channel(state, &key).ok_or_else(|| {
		rejected(
			Meta::Channel(key),
			Rejection::new(ErrorCode::ChannelNotFound, format!("Channel {} not found", key)),
		)
	})
}

/// Submits the on-chain transactions of accepted channel intents.
pub struct ChannelProcess {
	ctx: Context,
	/// Deposits to make once a channel we open is confirmed.
	deposits: HashMap<ChannelKey, TokenAmount>,
}

impl ChannelProcess {
	pub fn new(ctx: Context) -> Self {
		Self { ctx, deposits: HashMap::new() }
	}

	/// Build and submit a transaction in the background. Opens, closes and settles run at most
	/// once at a time per channel. A failure is reported back to the state machine.
	fn spawn<F>(&self, channel: ChannelKey, kind: ChannelTransaction, build: F)
	where
		F: Future<Output = Result<Transaction, EngineError>> + Send + 'static,
	{
		let ctx = self.ctx.clone();
		tokio::spawn(async move {
			let submit = {
				let ctx = ctx.clone();
				async move {
					let transaction = build.await?;
					ctx.submit(transaction).await
				}
			};
			let result = match kind {
				ChannelTransaction::Deposit => submit.await,
				_ => ctx.channel_transactions.run((channel, kind), submit).await,
			};

			match result {
				Ok(_) | Err(EngineError::Stopped) => {},
				Err(e) => {
					let failed = ActionChannelTransactionFailed {
						channel,
						transaction: kind,
						reason: e.to_string(),
					};
					if let Err(e) = ctx.dispatcher.dispatch(failed).await {
						debug!(message = "Could not report failed transaction", error = format!("{:?}", e));
					}
				},
			}
		});
	}

	fn open(&mut self, state: &ChainState, key: ChannelKey, total_deposit: TokenAmount) {
		let settle_timeout = match views::get_channel(state, &key) {
			Some(channel) => channel.settle_timeout,
			None => return,
		};
		if !total_deposit.is_zero() {
			self.deposits.insert(key, total_deposit);
		}
		info!(message = "Opening channel", channel = key.to_string());
		let params = OpenChannelParams {
			token_network_address: key.token_network_address,
			partner: key.partner,
			settle_timeout,
		};
		self.spawn(key, ChannelTransaction::Open, async move { Ok(Transaction::OpenChannel(params)) });
	}

	fn deposit(&self, state: &ChainState, key: ChannelKey, total_deposit: TokenAmount) {
		let params = channel(state, key).and_then(|channel| {
			let canonical_identifier = channel.canonical_identifier().ok_or_else(|| {
				rejected(
					Meta::Channel(key),
					Rejection::new(ErrorCode::ChannelNotOpen, "Channel has no identifier"),
				)
			})?;
			Ok(SetTotalDepositParams {
				canonical_identifier,
				participant: channel.our_state.address,
				partner: channel.partner_state.address,
				total_deposit,
			})
		});
		info!(
			message = "Depositing",
			channel = key.to_string(),
			total_deposit = total_deposit.to_string(),
		);
		self.spawn(key, ChannelTransaction::Deposit, async move {
			Ok(Transaction::SetTotalDeposit(params?))
		});
	}

	fn close(&self, key: ChannelKey) {
		info!(message = "Closing channel", channel = key.to_string());
		let ctx = self.ctx.clone();
		self.spawn(key, ChannelTransaction::Close, async move {
			let state = ctx.dispatcher.state();
			let params = close_channel_params(channel(&state, key)?, ctx.signer.as_ref()).await?;
			Ok(Transaction::CloseChannel(params))
		});
	}

	fn settle(&self, key: ChannelKey) {
		info!(message = "Settling channel", channel = key.to_string());
		let ctx = self.ctx.clone();
		self.spawn(key, ChannelTransaction::Settle, async move {
			let state = ctx.dispatcher.state();
			let params = settle_channel_params(channel(&state, key)?)?;
			Ok(Transaction::SettleChannel(params))
		});
	}
}

#[async_trait]
impl Process for ChannelProcess {
	fn name(&self) -> &'static str {
		"channel"
	}

	async fn reconcile(&mut self, _state: Arc<ChainState>) {}

	async fn on_reduced(&mut self, reduced: Reduced) {
		if reduced.rejection().is_some() {
			if let StateChange::ActionChannelTransactionFailed(inner) = &reduced.state_change {
				if inner.transaction == ChannelTransaction::Open {
					self.deposits.remove(&inner.channel);
				}
			}
			return
		}

		let state = &reduced.state;
		match &reduced.state_change {
			StateChange::ActionChannelOpen(inner) =>
				self.open(state, inner.channel_key(), inner.total_deposit),
			StateChange::ContractReceiveChannelOpened(inner) => {
				let key = inner.channel_key();
				if let Some(total_deposit) = self.deposits.remove(&key) {
					let deposit = ActionChannelDeposit { channel: key, total_deposit };
					if let Err(e) = self.ctx.dispatcher.dispatch(deposit).await {
						debug!(message = "Could not request deposit", error = format!("{:?}", e));
					}
				}
			},
			StateChange::ActionChannelDeposit(inner) =>
				self.deposit(state, inner.channel, inner.total_deposit),
			StateChange::ActionChannelClose(inner) => self.close(inner.channel),
			StateChange::ActionChannelSettle(inner) => self.settle(inner.channel),
			_ => {},
		}
	}
}
