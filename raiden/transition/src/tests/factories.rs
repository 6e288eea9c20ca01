use std::{
	collections::{
		HashMap,
		VecDeque,
	},
	sync::Arc,
	time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use raiden_light_blockchain::{
	errors::TransactionError,
	keys::PrivateKey,
	transactions::{
		CloseChannelParams,
		OpenChannelParams,
		RegisterSecretParams,
		SetTotalDepositParams,
		SetTotalWithdrawParams,
		SettleChannelParams,
		Transaction,
		TransactionSender,
	},
	watcher::{
		ChainUpdate,
		ConfirmedChainWatcher,
	},
};
use raiden_light_messages::messages::Message;
use raiden_light_primitives::{
	hashing::hash_secret,
	types::{
		Address,
		BlockNumber,
		ChainID,
		ChannelIdentifier,
		TokenAddress,
		TokenAmount,
		TokenNetworkAddress,
		TransactionHash,
	},
};
use raiden_light_state_machine::types::{
	ChainState,
	ChannelKey,
	ContractReceiveChannelClosed,
	ContractReceiveChannelDeposit,
	ContractReceiveChannelOpened,
	ContractReceiveChannelSettled,
	ContractReceiveChannelWithdraw,
	ContractReceiveSecretRevealed,
	StateChange,
};
use raiden_light_transport::memory::{
	MemoryNetwork,
	MemoryTransport,
};
use tokio::sync::mpsc;

use crate::{
	config::EngineConfig,
	engine::{
		Components,
		RaidenEngine,
	},
	errors::EngineError,
	manager::MemorySnapshotStorage,
	ticker::{
		ManualTick,
		Ticker,
	},
};

pub const START_BLOCK: u64 = 100;
pub const CHAIN_ID: u64 = 1337;
const WAIT: Duration = Duration::from_secs(5);

pub fn private_key(name: &[u8]) -> PrivateKey {
	let mut raw = [0u8; 32];
	raw[..name.len()].copy_from_slice(name);
	PrivateKey::from_raw(&raw).expect("Key should be valid")
}

pub fn token_network_address() -> TokenNetworkAddress {
	Address::repeat_byte(9)
}

pub fn token_address() -> TokenAddress {
	Address::repeat_byte(8)
}

pub fn test_config() -> EngineConfig {
	EngineConfig {
		reveal_timeout: 5,
		settle_timeout: 20,
		confirmation_blocks: 0,
		transaction_retry_delay_ms: 10,
		..Default::default()
	}
}

/// The other participant of a channel, if `address` takes part in it.
fn other(participants: (Address, Address), address: Address) -> Option<Address> {
	if address == participants.0 {
		Some(participants.1)
	} else if address == participants.1 {
		Some(participants.0)
	} else {
		None
	}
}

#[derive(Default)]
struct ChainInner {
	block: u64,
	next_channel: u64,
	channels: HashMap<ChannelIdentifier, (Address, Address)>,
	watchers: HashMap<Address, mpsc::Sender<ChainUpdate>>,
	calls: Vec<(Address, Transaction)>,
	failures: VecDeque<TransactionError>,
}

impl ChainInner {
	fn record(&mut self, sender: Address, transaction: Transaction) -> Result<(), TransactionError> {
		self.calls.push((sender, transaction));
		match self.failures.pop_front() {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	fn participants(
		&self,
		channel_identifier: ChannelIdentifier,
	) -> Result<(Address, Address), TransactionError> {
		self.channels
			.get(&channel_identifier)
			.copied()
			.ok_or_else(|| TransactionError::Rejected(format!("No channel {}", channel_identifier)))
	}

	/// Mine one block holding the event each watcher sees, if any.
	fn mine_with<F>(&mut self, event: F) -> TransactionHash
	where
		F: Fn(Address, BlockNumber) -> Option<StateChange>,
	{
		self.block += 1;
		let block_number = BlockNumber::from(self.block);
		for (address, watcher) in self.watchers.iter() {
			if let Some(state_change) = event(*address, block_number) {
				let _ = watcher.try_send(ChainUpdate::Event(state_change));
			}
			let _ = watcher.try_send(ChainUpdate::NewHead(block_number));
		}
		TransactionHash::from_low_u64_be(self.block)
	}
}

/// A fake chain shared by every node of a test. Each transaction is mined in its own block
/// and every watcher sees the events of the channels it takes part in.
#[derive(Clone)]
pub struct MockChain {
	inner: Arc<Mutex<ChainInner>>,
}

impl MockChain {
	pub fn new() -> Self {
		let inner = ChainInner { block: START_BLOCK, ..Default::default() };
		Self { inner: Arc::new(Mutex::new(inner)) }
	}

	/// A watcher reporting to `address` without confirmation delay.
	pub fn watch(&self, address: Address) -> ConfirmedChainWatcher<mpsc::Receiver<ChainUpdate>> {
		let (sender, receiver) = mpsc::channel(1024);
		self.inner.lock().watchers.insert(address, sender);
		ConfirmedChainWatcher::new(receiver, 0)
	}

	pub fn transactions(&self, node: Address) -> MockTransactions {
		MockTransactions { chain: self.clone(), node }
	}

	/// Make the next submitted transactions fail, in order.
	pub fn fail_next(&self, error: TransactionError) {
		self.inner.lock().failures.push_back(error);
	}

	pub fn calls(&self) -> Vec<(Address, Transaction)> {
		self.inner.lock().calls.clone()
	}

	pub fn block(&self) -> u64 {
		self.inner.lock().block
	}

	pub fn mine(&self, blocks: u64) {
		let mut inner = self.inner.lock();
		for _ in 0..blocks {
			inner.mine_with(|_, _| None);
		}
	}
}

/// Submits transactions to a `MockChain` on behalf of `node`.
pub struct MockTransactions {
	chain: MockChain,
	node: Address,
}

#[async_trait]
impl TransactionSender for MockTransactions {
	async fn open_channel(
		&self,
		params: OpenChannelParams,
	) -> Result<TransactionHash, TransactionError> {
		let mut chain = self.chain.inner.lock();
		chain.record(self.node, Transaction::OpenChannel(params.clone()))?;
		chain.next_channel += 1;
		let channel_identifier = ChannelIdentifier::from(chain.next_channel);
		let participants = (self.node, params.partner);
		chain.channels.insert(channel_identifier, participants);
		Ok(chain.mine_with(|address, block_number| {
			other(participants, address).map(|partner| {
				ContractReceiveChannelOpened {
					token_network_address: params.token_network_address,
					token_address: token_address(),
					partner,
					channel_identifier,
					settle_timeout: params.settle_timeout,
					block_number,
				}
				.into()
			})
		}))
	}

	async fn set_total_deposit(
		&self,
		params: SetTotalDepositParams,
	) -> Result<TransactionHash, TransactionError> {
		let mut chain = self.chain.inner.lock();
		chain.record(self.node, Transaction::SetTotalDeposit(params.clone()))?;
		let canonical_identifier = params.canonical_identifier.clone();
		let participants = chain.participants(canonical_identifier.channel_identifier)?;
		Ok(chain.mine_with(|address, block_number| {
			other(participants, address).map(|partner| {
				ContractReceiveChannelDeposit {
					channel: ChannelKey::new(canonical_identifier.token_network_address, partner),
					participant: params.participant,
					total_deposit: params.total_deposit,
					block_number,
				}
				.into()
			})
		}))
	}

	async fn close_channel(
		&self,
		params: CloseChannelParams,
	) -> Result<TransactionHash, TransactionError> {
		let mut chain = self.chain.inner.lock();
		chain.record(self.node, Transaction::CloseChannel(params.clone()))?;
		let canonical_identifier = params.canonical_identifier.clone();
		let participants = chain.participants(canonical_identifier.channel_identifier)?;
		let closing_participant = self.node;
		Ok(chain.mine_with(|address, block_number| {
			other(participants, address).map(|partner| {
				ContractReceiveChannelClosed {
					channel: ChannelKey::new(canonical_identifier.token_network_address, partner),
					channel_identifier: canonical_identifier.channel_identifier,
					closing_participant,
					block_number,
				}
				.into()
			})
		}))
	}

	async fn settle_channel(
		&self,
		params: SettleChannelParams,
	) -> Result<TransactionHash, TransactionError> {
		let mut chain = self.chain.inner.lock();
		chain.record(self.node, Transaction::SettleChannel(params.clone()))?;
		let canonical_identifier = params.canonical_identifier.clone();
		let participants = chain.participants(canonical_identifier.channel_identifier)?;
		Ok(chain.mine_with(|address, block_number| {
			other(participants, address).map(|partner| {
				ContractReceiveChannelSettled {
					channel: ChannelKey::new(canonical_identifier.token_network_address, partner),
					channel_identifier: canonical_identifier.channel_identifier,
					block_number,
				}
				.into()
			})
		}))
	}

	async fn set_total_withdraw(
		&self,
		params: SetTotalWithdrawParams,
	) -> Result<TransactionHash, TransactionError> {
		let mut chain = self.chain.inner.lock();
		chain.record(self.node, Transaction::SetTotalWithdraw(params.clone()))?;
		let canonical_identifier = params.canonical_identifier.clone();
		let participants = chain.participants(canonical_identifier.channel_identifier)?;
		Ok(chain.mine_with(|address, block_number| {
			other(participants, address).map(|partner| {
				ContractReceiveChannelWithdraw {
					channel: ChannelKey::new(canonical_identifier.token_network_address, partner),
					participant: params.participant,
					total_withdraw: params.total_withdraw,
					block_number,
				}
				.into()
			})
		}))
	}

	async fn register_secret(
		&self,
		params: RegisterSecretParams,
	) -> Result<TransactionHash, TransactionError> {
		let mut chain = self.chain.inner.lock();
		chain.record(self.node, Transaction::RegisterSecret(params.clone()))?;
		let secrethash = hash_secret(&params.secret.0);
		Ok(chain.mine_with(|_, block_number| {
			Some(
				ContractReceiveSecretRevealed {
					secrethash,
					secret: params.secret.clone(),
					block_number,
				}
				.into(),
			)
		}))
	}
}

/// A running engine with handles on its collaborators.
pub struct Node {
	pub address: Address,
	pub key: PrivateKey,
	pub engine: RaidenEngine,
	pub transport: MemoryTransport,
	pub ticker: ManualTick,
	pub storage: Arc<MemorySnapshotStorage>,
}

impl Node {
	pub async fn start(name: &[u8], network: &MemoryNetwork, chain: &MockChain) -> Self {
		Self::start_with_storage(name, network, chain, Arc::new(MemorySnapshotStorage::new()))
			.await
			.expect("Engine should start")
	}

	pub async fn start_with_storage(
		name: &[u8],
		network: &MemoryNetwork,
		chain: &MockChain,
		storage: Arc<MemorySnapshotStorage>,
	) -> Result<Self, EngineError> {
		let key = private_key(name);
		let address = key.address();
		let (transport, inbound) = network.join(address, 1024);
		let (ticker, tick) = Ticker::manual();
		let components = Components {
			signer: Arc::new(key.clone()),
			transport: Arc::new(transport.clone()),
			inbound,
			transactions: Arc::new(chain.transactions(address)),
			chain_watcher: Box::new(chain.watch(address)),
			storage: storage.clone(),
			ticker: Some(ticker),
		};
		let engine = RaidenEngine::start(
			test_config(),
			ChainID::from(CHAIN_ID),
			BlockNumber::from(START_BLOCK),
			components,
		)
		.await?;
		Ok(Self { address, key, engine, transport, ticker: tick, storage })
	}

	pub fn channel_with(&self, partner: Address) -> ChannelKey {
		ChannelKey::new(token_network_address(), partner)
	}

	/// Messages of `kind` this node sent to `recipient`.
	pub fn sent_to(&self, recipient: Address, kind: &str) -> Vec<Message> {
		self.transport
			.sent_messages()
			.into_iter()
			.filter(|(to, message)| *to == recipient && message.type_name() == kind)
			.map(|(_, message)| message)
			.collect()
	}
}

/// Wait for the engine state to satisfy `condition`.
pub async fn wait_until<F>(engine: &RaidenEngine, condition: F) -> Arc<ChainState>
where
	F: Fn(&ChainState) -> bool,
{
	let mut receiver = engine.dispatcher().state_receiver();
	tokio::time::timeout(WAIT, async {
		loop {
			let state = receiver.borrow_and_update().clone();
			if condition(&state) {
				return state
			}
			receiver.changed().await.expect("Transitioner should be running");
		}
	})
	.await
	.expect("Condition should be reached in time")
}

/// Poll `condition` until it holds.
pub async fn eventually<F>(condition: F)
where
	F: Fn() -> bool,
{
	tokio::time::timeout(WAIT, async {
		while !condition() {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("Condition should be reached in time")
}

/// Open a channel from `node` to `partner` and wait until both see the deposit.
pub async fn open_channel(node: &Node, partner: &Node, deposit: u64) -> ChannelKey {
	let key = open_channel_with(node, partner.address, deposit).await;
	let partner_key = partner.channel_with(node.address);
	wait_until(&partner.engine, |state| {
		state
			.channels
			.get(&partner_key)
			.map(|c| c.partner_state.contract_balance == TokenAmount::from(deposit))
			.unwrap_or(false)
	})
	.await;
	key
}

/// Open a channel from `node` to an address which may not run an engine.
pub async fn open_channel_with(node: &Node, partner: Address, deposit: u64) -> ChannelKey {
	let key = node
		.engine
		.open_channel(token_network_address(), token_address(), partner, None, deposit.into())
		.await
		.expect("Open should be accepted");
	wait_until(&node.engine, |state| {
		state
			.channels
			.get(&key)
			.map(|c| c.our_state.contract_balance == TokenAmount::from(deposit))
			.unwrap_or(false)
	})
	.await;
	key
}
