use std::sync::Arc;

use parking_lot::Mutex;
use raiden_light_state_machine::{
	machine::chain::{
		self,
		Transition,
	},
	types::{
		ChainState,
		Snapshot,
		StateChange,
	},
};
use tracing::{
	debug,
	error,
};

use crate::errors::StateManagerError;

/// Persistence of the serialized state document.
pub trait SnapshotStorage: Send + Sync {
	fn load(&self) -> Result<Option<String>, StateManagerError>;

	fn store(&self, data: String) -> Result<(), StateManagerError>;
}

/// Keeps the latest snapshot in memory.
#[derive(Default)]
pub struct MemorySnapshotStorage {
	data: Mutex<Option<String>>,
}

impl MemorySnapshotStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_snapshot(data: String) -> Self {
		Self { data: Mutex::new(Some(data)) }
	}

	pub fn snapshot(&self) -> Option<String> {
		self.data.lock().clone()
	}
}

impl SnapshotStorage for MemorySnapshotStorage {
	fn load(&self) -> Result<Option<String>, StateManagerError> {
		Ok(self.data.lock().clone())
	}

	fn store(&self, data: String) -> Result<(), StateManagerError> {
		*self.data.lock() = Some(data);
		Ok(())
	}
}

/// Owner of the current state. Only the transitioner holds one.
pub struct StateManager {
	pub current_state: ChainState,
	storage: Arc<dyn SnapshotStorage>,
	snapshot_interval: u64,
	changes_since_snapshot: u64,
}

impl StateManager {
	/// Load the stored snapshot, or start from `initial` when there is none.
	///
	/// A snapshot of another node is refused. Chain events after the restored block have to be
	/// replayed by the caller.
	pub fn restore_or_init(
		storage: Arc<dyn SnapshotStorage>,
		snapshot_interval: u64,
		initial: ChainState,
	) -> Result<Self, StateManagerError> {
		let current_state = match storage.load()? {
			Some(data) => {
				let snapshot = Snapshot::from_json(&data)?;
				if snapshot.state.our_address != initial.our_address {
					return Err(StateManagerError::AddressMismatch {
						expected: initial.our_address,
						found: snapshot.state.our_address,
					})
				}
				if snapshot.state.chain_id != initial.chain_id {
					return Err(StateManagerError::Snapshot(format!(
						"Snapshot is for chain {}, expected {}",
						snapshot.state.chain_id, initial.chain_id
					)))
				}
				debug!(
					message = "Restoring state",
					block_number = snapshot.state.block_number.to_string(),
					version = snapshot.state.version,
				);
				snapshot.state
			},
			None => {
				debug!("Initializing state");
				initial
			},
		};

		Ok(Self { current_state, storage, snapshot_interval, changes_since_snapshot: 0 })
	}

	/// Apply a state change and keep the resulting state.
	pub fn transition(&mut self, state_change: StateChange) -> Transition {
		let transition = chain::state_transition(self.current_state.clone(), state_change);
		if transition.changed {
			self.current_state = transition.new_state.clone();
			self.changes_since_snapshot += 1;
			self.maybe_snapshot();
		}
		transition
	}

	pub fn snapshot(&mut self) -> Result<(), StateManagerError> {
		let data = Snapshot::new(self.current_state.clone()).to_json()?;
		self.storage.store(data)?;
		self.changes_since_snapshot = 0;
		Ok(())
	}

	fn maybe_snapshot(&mut self) {
		if self.snapshot_interval == 0 || self.changes_since_snapshot < self.snapshot_interval {
			return
		}
		if let Err(e) = self.snapshot() {
			error!(message = "Could not store snapshot", error = format!("{:?}", e));
		}
	}
}
