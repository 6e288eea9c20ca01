use std::sync::Arc;

use raiden_light_state_machine::{
	errors::ErrorCode,
	types::{
		ChainState,
		Event,
		Meta,
		StateChange,
	},
};
use tokio::sync::{
	broadcast,
	mpsc,
	oneshot,
	watch,
};
use tracing::{
	error,
	trace,
	warn,
};

use crate::{
	dispatcher::Dispatcher,
	errors::EngineError,
	manager::StateManager,
	processes::ShutdownSignal,
};

/// A state change together with what reducing it produced.
#[derive(Clone, Debug)]
pub struct Reduced {
	pub state_change: StateChange,
	pub events: Vec<Event>,
	/// The state change modified the state.
	pub changed: bool,
	/// The state right after this state change.
	pub state: Arc<ChainState>,
}

impl Reduced {
	/// The rejection reported for the state change, if any.
	pub fn rejection(&self) -> Option<(Meta, ErrorCode, &str)> {
		self.events.iter().find_map(|event| event.error())
	}

	/// Turn a rejection into an error.
	pub fn accepted(self) -> Result<Self, EngineError> {
		if let Some((meta, code, reason)) = self.rejection() {
			return Err(EngineError::Rejected { meta, code, reason: reason.to_owned() })
		}
		Ok(self)
	}
}

/// A batch of state changes submitted to the transitioner.
pub(crate) struct Dispatch {
	pub state_changes: Vec<StateChange>,
	pub ack: Option<oneshot::Sender<Vec<Reduced>>>,
}

/// The single writer of the state. Reduces dispatched state changes in order and publishes
/// the results to every subscriber.
pub struct Transitioner {
	state_manager: StateManager,
	receiver: mpsc::Receiver<Dispatch>,
	reduced: broadcast::Sender<Reduced>,
	state: watch::Sender<Arc<ChainState>>,
}

impl Transitioner {
	/// Create the transitioner and the handle used to feed it.
	pub fn new(state_manager: StateManager, capacity: usize) -> (Self, Dispatcher) {
		let (sender, receiver) = mpsc::channel(capacity);
		let (reduced, _) = broadcast::channel(capacity);
		let (state, state_receiver) = watch::channel(Arc::new(state_manager.current_state.clone()));
		let dispatcher = Dispatcher::new(sender, reduced.clone(), state_receiver);
		(Self { state_manager, receiver, reduced, state }, dispatcher)
	}

	/// Reduce state changes until shutdown or until every dispatcher is dropped.
	/// Returns the state manager after storing a final snapshot.
	pub async fn run(mut self, mut shutdown: ShutdownSignal) -> StateManager {
		loop {
			tokio::select! {
				biased;
				_ = shutdown.wait() => break,
				dispatch = self.receiver.recv() => match dispatch {
					Some(dispatch) => self.handle(dispatch),
					None => break,
				},
			}
		}

		if let Err(e) = self.state_manager.snapshot() {
			error!(message = "Could not store snapshot on exit", error = format!("{:?}", e));
		}
		self.state_manager
	}

	fn handle(&mut self, dispatch: Dispatch) {
		let results = self.transition(dispatch.state_changes);
		if let Some(ack) = dispatch.ack {
			let _ = ack.send(results);
		}
	}

	/// Reduce a batch of state changes and publish each result.
	pub fn transition(&mut self, state_changes: Vec<StateChange>) -> Vec<Reduced> {
		let mut results = vec![];
		for state_change in state_changes {
			trace!(message = "Transition", state_change = state_change.type_name());
			let transition = self.state_manager.transition(state_change.clone());
			for event in transition.events.iter() {
				match event.error() {
					Some((meta, code, reason)) => warn!(
						message = "State change rejected",
						state_change = state_change.type_name(),
						meta = meta.to_string(),
						code = code.to_string(),
						category = format!("{:?}", code.category()),
						reason = reason,
					),
					None => trace!(
						message = "Resulting event from state change",
						state_change = state_change.type_name(),
						event = event.type_name()
					),
				}
			}

			let state = if transition.changed {
				let state = Arc::new(transition.new_state);
				self.state.send_replace(state.clone());
				state
			} else {
				self.state.borrow().clone()
			};
			let reduced =
				Reduced { state_change, events: transition.events, changed: transition.changed, state };
			// Nobody listening is fine.
			let _ = self.reduced.send(reduced.clone());
			results.push(reduced);
		}
		results
	}
}
