use std::{
	sync::Arc,
	time::Duration,
};

use raiden_light_blockchain::{
	signer::Signer,
	transactions::TransactionSender,
	watcher::ChainWatcher,
};
use raiden_light_messages::messages::{
	LockedTransfer,
	WithdrawRequest,
};
use raiden_light_primitives::{
	hashing::hash_secret,
	types::{
		Address,
		BlockExpiration,
		BlockNumber,
		BlockTimeout,
		Bytes,
		ChainID,
		PaymentIdentifier,
		Secret,
		SecretHash,
		SettleTimeout,
		TokenAddress,
		TokenAmount,
		TokenNetworkAddress,
	},
};
use raiden_light_state_machine::{
	constants::SECRET_LENGTH,
	types::{
		ActionChannelClose,
		ActionChannelDeposit,
		ActionChannelOpen,
		ActionChannelSettle,
		ActionInitTransfer,
		ActionTransferClear,
		ActionWithdrawRequest,
		ChainState,
		ChannelKey,
		TransferKey,
	},
};
use raiden_light_transport::{
	IncomingMessage,
	Transport,
};
use rand::{
	distributions::Alphanumeric,
	thread_rng,
	Rng,
};
use tokio::{
	sync::{
		broadcast,
		mpsc,
	},
	task::JoinHandle,
};
use tracing::{
	debug,
	error,
	info,
};

use crate::{
	config::EngineConfig,
	dispatcher::{
		message_to_state_change,
		Dispatcher,
	},
	errors::EngineError,
	manager::{
		SnapshotStorage,
		StateManager,
	},
	processes::{
		ack::AckProcess,
		channel::ChannelProcess,
		retry::RetryProcess,
		run_process,
		secret::SecretProcess,
		transfer::{
			sign_transfer,
			TransferProcess,
		},
		withdraw::{
			request_withdraw,
			WithdrawProcess,
		},
		Context,
		Process,
		Shutdown,
		ShutdownSignal,
	},
	ticker::Ticker,
	transitioner::{
		Reduced,
		Transitioner,
	},
};

/// The collaborators the engine runs against.
pub struct Components {
	pub signer: Arc<dyn Signer>,
	pub transport: Arc<dyn Transport>,
	/// Messages received by the transport.
	pub inbound: mpsc::Receiver<IncomingMessage>,
	pub transactions: Arc<dyn TransactionSender>,
	pub chain_watcher: Box<dyn ChainWatcher>,
	pub storage: Arc<dyn SnapshotStorage>,
	/// Retry cadence. Defaults to the configured retry interval.
	pub ticker: Option<Ticker>,
}

/// A payment to send.
#[derive(Clone, Debug)]
pub struct TransferRequest {
	pub token_network_address: TokenNetworkAddress,
	pub target: Address,
	pub value: TokenAmount,
	pub fee: TokenAmount,
	/// Random when absent.
	pub payment_identifier: Option<PaymentIdentifier>,
	/// Generated when both the secret and its hash are absent.
	pub secret: Option<Secret>,
	/// For a payment whose secret is held by someone else.
	pub secrethash: Option<SecretHash>,
	pub paths: Vec<Vec<Address>>,
	pub lock_timeout: Option<BlockTimeout>,
}

impl TransferRequest {
	/// A direct payment with a generated secret.
	pub fn new(token_network_address: TokenNetworkAddress, target: Address, value: TokenAmount) -> Self {
		Self {
			token_network_address,
			target,
			value,
			fee: TokenAmount::zero(),
			payment_identifier: None,
			secret: None,
			secrethash: None,
			paths: vec![],
			lock_timeout: None,
		}
	}
}

fn random_secret() -> Secret {
	Bytes(thread_rng().sample_iter(&Alphanumeric).take(SECRET_LENGTH).collect::<Vec<u8>>())
}

/// A running light client: the transitioner, every protocol process and the adapters
/// feeding inbound messages and chain events into the state machine.
pub struct RaidenEngine {
	ctx: Context,
	transitioner: JoinHandle<StateManager>,
	tasks: Vec<JoinHandle<()>>,
}

impl RaidenEngine {
	/// Restore or initialize the state and start every task.
	pub async fn start(
		config: EngineConfig,
		chain_id: ChainID,
		start_block: BlockNumber,
		components: Components,
	) -> Result<Self, EngineError> {
		config.validate()?;
		let Components {
			signer,
			transport,
			inbound,
			transactions,
			mut chain_watcher,
			storage,
			ticker,
		} = components;

		let our_address = signer.address();
		let initial = ChainState::new(
			chain_id,
			our_address,
			start_block,
			config.reveal_timeout(),
			config.settle_timeout(),
			config.withdraw_margin(),
		);
		let state_manager =
			StateManager::restore_or_init(storage, config.snapshot_interval, initial)?;
		chain_watcher.start_from(state_manager.current_state.block_number);

		let ticker = ticker.unwrap_or_else(|| {
			Ticker::interval(Duration::from_millis(config.transport.retry_interval_ms))
		});
		let (transitioner, dispatcher) = Transitioner::new(state_manager, config.stream_capacity);
		let shutdown = Shutdown::new();
		let ctx = Context::new(
			dispatcher.clone(),
			signer,
			transport,
			transactions,
			Arc::new(config),
			shutdown.clone(),
		);

		let transitioner = tokio::spawn(transitioner.run(shutdown.subscribe()));
		let tasks = vec![
			spawn_process(&ctx, AckProcess::new(ctx.clone()), None),
			spawn_process(&ctx, ChannelProcess::new(ctx.clone()), None),
			spawn_process(&ctx, TransferProcess::new(ctx.clone()), None),
			spawn_process(&ctx, SecretProcess::new(ctx.clone()), None),
			spawn_process(&ctx, WithdrawProcess::new(ctx.clone()), None),
			spawn_process(&ctx, RetryProcess::new(ctx.clone()), Some(ticker)),
			tokio::spawn(forward_inbound(dispatcher.clone(), inbound, shutdown.subscribe())),
			tokio::spawn(forward_chain(
				dispatcher,
				chain_watcher,
				shutdown.clone(),
				shutdown.subscribe(),
			)),
		];

		info!(message = "Engine started", address = format!("{:#x}", our_address));
		Ok(Self { ctx, transitioner, tasks })
	}

	pub fn address(&self) -> Address {
		self.ctx.signer.address()
	}

	pub fn state(&self) -> Arc<ChainState> {
		self.ctx.dispatcher.state()
	}

	/// Every state change reduced from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<Reduced> {
		self.ctx.dispatcher.subscribe()
	}

	pub fn dispatcher(&self) -> Dispatcher {
		self.ctx.dispatcher.clone()
	}

	/// Whether the engine was asked to stop, possibly by a fatal failure.
	pub fn is_stopping(&self) -> bool {
		self.ctx.shutdown.is_triggered()
	}

	/// Open a channel, depositing `total_deposit` once it is confirmed open.
	pub async fn open_channel(
		&self,
		token_network_address: TokenNetworkAddress,
		token_address: TokenAddress,
		partner: Address,
		settle_timeout: Option<SettleTimeout>,
		total_deposit: TokenAmount,
	) -> Result<ChannelKey, EngineError> {
		let action = ActionChannelOpen {
			token_network_address,
			token_address,
			partner,
			settle_timeout,
			total_deposit,
		};
		let key = action.channel_key();
		self.ctx.dispatcher.dispatch_and_wait(action).await?.accepted()?;
		Ok(key)
	}

	/// Raise our deposit to `total_deposit`.
	pub async fn deposit(&self, channel: ChannelKey, total_deposit: TokenAmount) -> Result<(), EngineError> {
		self.ctx
			.dispatcher
			.dispatch_and_wait(ActionChannelDeposit { channel, total_deposit })
			.await?
			.accepted()?;
		Ok(())
	}

	pub async fn close(&self, channel: ChannelKey) -> Result<(), EngineError> {
		self.ctx.dispatcher.dispatch_and_wait(ActionChannelClose { channel }).await?.accepted()?;
		Ok(())
	}

	pub async fn settle(&self, channel: ChannelKey) -> Result<(), EngineError> {
		self.ctx.dispatcher.dispatch_and_wait(ActionChannelSettle { channel }).await?.accepted()?;
		Ok(())
	}

	/// Send a payment and return its signed locked transfer.
	pub async fn transfer(&self, request: TransferRequest) -> Result<LockedTransfer, EngineError> {
		let (secret, secrethash) = match (request.secret, request.secrethash) {
			(Some(secret), _) => {
				let secrethash = hash_secret(&secret.0);
				(Some(secret), secrethash)
			},
			(None, Some(secrethash)) => (None, secrethash),
			(None, None) => {
				let secret = random_secret();
				let secrethash = hash_secret(&secret.0);
				(Some(secret), secrethash)
			},
		};

		let init = ActionInitTransfer {
			token_network_address: request.token_network_address,
			target: request.target,
			value: request.value,
			fee: request.fee,
			payment_identifier: request
				.payment_identifier
				.unwrap_or_else(|| PaymentIdentifier::from(thread_rng().gen::<u64>())),
			secrethash,
			secret,
			paths: request.paths,
			lock_timeout: request.lock_timeout,
		};
		self.ctx.dispatcher.dispatch_and_wait(init.clone()).await?.accepted()?;
		let result = sign_transfer(&self.ctx, init).await;
		let key = TransferKey::sent(secrethash);
		if result.is_err() && !self.state().transfers.contains_key(&key) {
			// The intent was accepted with its secret but no transfer came out of it.
			let _ = self.ctx.dispatcher.dispatch_and_wait(ActionTransferClear { key }).await;
		}
		result
	}

	/// Withdraw from our deposit up to `total_withdraw`.
	pub async fn withdraw(
		&self,
		channel: ChannelKey,
		total_withdraw: TokenAmount,
		expiration: Option<BlockExpiration>,
	) -> Result<WithdrawRequest, EngineError> {
		let expiration = expiration.unwrap_or_else(|| {
			self.state().block_number + self.ctx.config.withdraw_expiry_blocks()
		});
		let action = ActionWithdrawRequest { channel, total_withdraw, expiration: Some(expiration) };
		self.ctx.dispatcher.dispatch_and_wait(action.clone()).await?.accepted()?;
		request_withdraw(&self.ctx, action).await
	}

	/// Forget a finished transfer.
	pub async fn clear_transfer(&self, key: TransferKey) -> Result<(), EngineError> {
		self.ctx.dispatcher.dispatch_and_wait(ActionTransferClear { key }).await?.accepted()?;
		Ok(())
	}

	/// Stop every task and return the final state, which is also stored as a snapshot.
	pub async fn shutdown(self) -> Result<ChainState, EngineError> {
		self.ctx.shutdown.trigger();
		for task in self.tasks {
			if let Err(e) = task.await {
				error!(message = "Task failed", error = format!("{:?}", e));
			}
		}
		let state_manager = self
			.transitioner
			.await
			.map_err(|e| EngineError::Task(format!("{:?}", e)))?;
		info!("Engine stopped");
		Ok(state_manager.current_state)
	}
}

fn spawn_process<P: Process + 'static>(
	ctx: &Context,
	process: P,
	ticker: Option<Ticker>,
) -> JoinHandle<()> {
	tokio::spawn(run_process(
		process,
		ctx.dispatcher.subscribe(),
		ticker,
		ctx.shutdown.subscribe(),
		ctx.dispatcher.state_receiver(),
	))
}

async fn forward_inbound(
	dispatcher: Dispatcher,
	mut inbound: mpsc::Receiver<IncomingMessage>,
	mut shutdown: ShutdownSignal,
) {
	loop {
		tokio::select! {
			biased;
			_ = shutdown.wait() => break,
			incoming = inbound.recv() => match incoming {
				Some(incoming) => {
					debug!(
						message = "Message received",
						kind = incoming.message.type_name(),
						sender = format!("{:#x}", incoming.sender),
					);
					let state_change = message_to_state_change(incoming.sender, incoming.message);
					if dispatcher.dispatch(state_change).await.is_err() {
						break
					}
				},
				None => break,
			},
		}
	}
}

async fn forward_chain(
	dispatcher: Dispatcher,
	mut watcher: Box<dyn ChainWatcher>,
	shutdown: Shutdown,
	mut signal: ShutdownSignal,
) {
	loop {
		tokio::select! {
			biased;
			_ = signal.wait() => break,
			next = watcher.next() => match next {
				Ok(Some(state_changes)) => {
					for state_change in state_changes {
						if dispatcher.dispatch(state_change).await.is_err() {
							return
						}
					}
				},
				Ok(None) => break,
				Err(e) => {
					error!(message = "Chain watcher failed", error = format!("{:?}", e));
					shutdown.trigger();
					break
				},
			},
		}
	}
}
