use std::collections::BTreeMap;

use async_trait::async_trait;
use raiden_light_primitives::types::BlockNumber;
use raiden_light_state_machine::types::{
	Block,
	StateChange,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::ChainWatcherError;

/// An unconfirmed observation of the chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChainUpdate {
	NewHead(BlockNumber),
	/// A contract event converted into its state change. It must carry a block number.
	Event(StateChange),
}

/// A raw feed of chain observations, such as a log poller.
#[async_trait]
pub trait ChainSource: Send {
	/// The next observation, `None` once the source is exhausted.
	async fn next_update(&mut self) -> Result<Option<ChainUpdate>, ChainWatcherError>;
}

#[async_trait]
impl ChainSource for mpsc::Receiver<ChainUpdate> {
	async fn next_update(&mut self) -> Result<Option<ChainUpdate>, ChainWatcherError> {
		Ok(self.recv().await)
	}
}

/// A source of confirmed chain state changes.
#[async_trait]
pub trait ChainWatcher: Send {
	/// Only report events after `block_number`, which the state already reflects.
	fn start_from(&mut self, block_number: BlockNumber);

	/// The next batch of confirmed state changes in chain order, ending with the confirmed
	/// `Block`. `None` once the watcher is exhausted.
	async fn next(&mut self) -> Result<Option<Vec<StateChange>>, ChainWatcherError>;
}

/// Holds events back until they are `confirmations` blocks deep.
pub struct ConfirmedChainWatcher<S> {
	source: S,
	confirmations: u64,
	start_block: BlockNumber,
	confirmed_block: BlockNumber,
	pending: BTreeMap<BlockNumber, Vec<StateChange>>,
}

impl<S: ChainSource> ConfirmedChainWatcher<S> {
	pub fn new(source: S, confirmations: u64) -> Self {
		Self {
			source,
			confirmations,
			start_block: BlockNumber::zero(),
			confirmed_block: BlockNumber::zero(),
			pending: BTreeMap::new(),
		}
	}

	/// Release the events confirmed by a new head.
	fn confirm(&mut self, head: BlockNumber) -> Option<Vec<StateChange>> {
		let confirmed = head.saturating_sub(self.confirmations.into());
		if confirmed <= self.confirmed_block || confirmed <= self.start_block {
			return None
		}
		self.confirmed_block = confirmed;

		let unconfirmed = self.pending.split_off(&(confirmed + 1));
		let mut state_changes: Vec<StateChange> =
			std::mem::replace(&mut self.pending, unconfirmed).into_values().flatten().collect();
		debug!(
			message = "Chain events confirmed",
			block = confirmed.to_string(),
			count = state_changes.len()
		);
		state_changes.push(Block { block_number: confirmed }.into());
		Some(state_changes)
	}
}

#[async_trait]
impl<S: ChainSource> ChainWatcher for ConfirmedChainWatcher<S> {
	fn start_from(&mut self, block_number: BlockNumber) {
		self.start_block = block_number;
		self.pending = self.pending.split_off(&(block_number + 1));
	}

	async fn next(&mut self) -> Result<Option<Vec<StateChange>>, ChainWatcherError> {
		loop {
			match self.source.next_update().await? {
				None => return Ok(None),
				Some(ChainUpdate::NewHead(head)) =>
					if let Some(state_changes) = self.confirm(head) {
						return Ok(Some(state_changes))
					},
				Some(ChainUpdate::Event(state_change)) => {
					let block_number = state_change
						.block_number()
						.ok_or_else(|| ChainWatcherError::MissingBlockNumber(state_change.type_name()))?;
					if block_number <= self.start_block || block_number <= self.confirmed_block {
						continue
					}
					self.pending.entry(block_number).or_default().push(state_change);
				},
			}
		}
	}
}
