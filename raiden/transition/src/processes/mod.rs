use std::{
	sync::Arc,
	time::Duration,
};

use async_trait::async_trait;
use raiden_light_blockchain::{
	errors::TransactionError,
	signer::Signer,
	transactions::{
		Transaction,
		TransactionSender,
	},
};
use raiden_light_messages::messages::{
	LockedTransfer,
	WithdrawRequest,
};
use raiden_light_primitives::types::{
	SecretHash,
	TransactionHash,
};
use raiden_light_state_machine::{
	errors::Rejection,
	types::{
		ChainState,
		ChannelKey,
		ChannelTransaction,
		Meta,
		WithdrawKey,
	},
};
use raiden_light_transport::Transport;
use tokio::sync::{
	broadcast::{
		self,
		error::RecvError,
	},
	watch,
};
use tracing::{
	debug,
	error,
	info,
	warn,
};

use crate::{
	config::EngineConfig,
	dispatcher::Dispatcher,
	errors::EngineError,
	inflight::InFlight,
	locks::KeyedLocks,
	ticker::Ticker,
	transitioner::Reduced,
};

/// Replies acknowledging received messages.
pub mod ack;
/// Channel lifecycle transactions.
pub mod channel;
/// Periodic redelivery of unacknowledged messages.
pub mod retry;
/// Secret requests, reveals and registration.
pub mod secret;
/// Locked transfers, unlocks and expirations.
pub mod transfer;
/// Withdraw requests, confirmations and expirations.
pub mod withdraw;

/// Shared stop flag of the engine. Once triggered it stays triggered.
#[derive(Clone)]
pub struct Shutdown {
	sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
	fn default() -> Self {
		let (sender, _) = watch::channel(false);
		Self { sender: Arc::new(sender) }
	}
}

impl Shutdown {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn trigger(&self) {
		self.sender.send_replace(true);
	}

	pub fn is_triggered(&self) -> bool {
		*self.sender.borrow()
	}

	pub fn subscribe(&self) -> ShutdownSignal {
		ShutdownSignal(self.sender.subscribe())
	}
}

pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
	/// Resolves once shutdown is triggered.
	pub async fn wait(&mut self) {
		while !*self.0.borrow() {
			if self.0.changed().await.is_err() {
				return
			}
		}
	}
}

/// What every process gets to work with.
#[derive(Clone)]
pub struct Context {
	pub dispatcher: Dispatcher,
	pub signer: Arc<dyn Signer>,
	pub transport: Arc<dyn Transport>,
	pub transactions: Arc<dyn TransactionSender>,
	pub config: Arc<EngineConfig>,
	pub shutdown: Shutdown,
	/// Serializes balance proof signing per channel.
	pub channel_locks: Arc<KeyedLocks<ChannelKey>>,
	pub transfers: Arc<InFlight<SecretHash, Result<LockedTransfer, EngineError>>>,
	pub withdraws: Arc<InFlight<WithdrawKey, Result<WithdrawRequest, EngineError>>>,
	pub channel_transactions:
		Arc<InFlight<(ChannelKey, ChannelTransaction), Result<TransactionHash, EngineError>>>,
}

impl Context {
	pub fn new(
		dispatcher: Dispatcher,
		signer: Arc<dyn Signer>,
		transport: Arc<dyn Transport>,
		transactions: Arc<dyn TransactionSender>,
		config: Arc<EngineConfig>,
		shutdown: Shutdown,
	) -> Self {
		Self {
			dispatcher,
			signer,
			transport,
			transactions,
			config,
			shutdown,
			channel_locks: Arc::new(KeyedLocks::new()),
			transfers: Arc::new(InFlight::new()),
			withdraws: Arc::new(InFlight::new()),
			channel_transactions: Arc::new(InFlight::new()),
		}
	}

	/// Submit a transaction, retrying transient failures. A fatal failure shuts the engine down.
	pub async fn submit(&self, transaction: Transaction) -> Result<TransactionHash, EngineError> {
		let mut attempt = 0;
		loop {
			if self.shutdown.is_triggered() {
				return Err(EngineError::Stopped)
			}
			match transaction.submit(self.transactions.as_ref()).await {
				Ok(hash) => {
					info!(
						message = "Transaction submitted",
						transaction = transaction.name(),
						hash = format!("{:#x}", hash),
					);
					return Ok(hash)
				},
				Err(e) if e.is_transient() && attempt < self.config.transaction_retries => {
					attempt += 1;
					warn!(
						message = "Transaction failed, retrying",
						transaction = transaction.name(),
						attempt = attempt,
						error = format!("{:?}", e),
					);
					tokio::time::sleep(Duration::from_millis(self.config.transaction_retry_delay_ms))
						.await;
				},
				Err(e) => {
					error!(
						message = "Transaction failed",
						transaction = transaction.name(),
						error = format!("{:?}", e),
					);
					if matches!(e, TransactionError::Fatal(_)) {
						self.shutdown.trigger();
					}
					return Err(e.into())
				},
			}
		}
	}
}

pub(crate) fn rejected(meta: Meta, rejection: Rejection) -> EngineError {
	EngineError::Rejected { meta, code: rejection.code, reason: rejection.reason }
}

/// A long running reaction to reduced state changes.
#[async_trait]
pub trait Process: Send {
	fn name(&self) -> &'static str;

	/// Catch up with `state`, on start and whenever reduced notifications were missed.
	async fn reconcile(&mut self, state: Arc<ChainState>);

	async fn on_reduced(&mut self, reduced: Reduced);

	async fn on_tick(&mut self) {}
}

/// Drive `process` until shutdown or until the transitioner is gone.
pub async fn run_process<P: Process>(
	mut process: P,
	mut reduced: broadcast::Receiver<Reduced>,
	mut ticker: Option<Ticker>,
	mut shutdown: ShutdownSignal,
	state: watch::Receiver<Arc<ChainState>>,
) {
	debug!(message = "Process started", process = process.name());
	let latest = state.borrow().clone();
	process.reconcile(latest).await;

	loop {
		tokio::select! {
			biased;
			_ = shutdown.wait() => break,
			result = reduced.recv() => match result {
				Ok(reduced) => process.on_reduced(reduced).await,
				Err(RecvError::Lagged(skipped)) => {
					warn!(message = "Process lagged", process = process.name(), skipped = skipped);
					let latest = state.borrow().clone();
					process.reconcile(latest).await;
				},
				Err(RecvError::Closed) => break,
			},
			ticked = next_tick(&mut ticker) => {
				if ticked {
					process.on_tick().await;
				} else {
					ticker = None;
				}
			},
		}
	}
	debug!(message = "Process stopped", process = process.name());
}

async fn next_tick(ticker: &mut Option<Ticker>) -> bool {
	match ticker {
		Some(ticker) => ticker.tick().await,
		None => futures::future::pending().await,
	}
}
