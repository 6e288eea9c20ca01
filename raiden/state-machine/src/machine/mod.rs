#![warn(clippy::missing_docs_in_private_items)]

use crate::{
	errors::Rejection,
	types::Event,
};

pub mod chain;
pub mod channel;
pub mod processed;
pub mod secret;
pub mod transfer;
pub mod withdraw;

/// Outcome of a handler which accepted its state change.
#[derive(Debug, Default)]
pub struct Update {
	/// The state was modified.
	pub dirty: bool,
	pub events: Vec<Event>,
}

impl Update {
	/// Accepted without touching the state.
	pub fn noop() -> Self {
		Self::default()
	}

	/// Accepted and applied.
	pub fn changed() -> Self {
		Self { dirty: true, events: vec![] }
	}

	pub fn with_event(mut self, event: impl Into<Event>) -> Self {
		self.events.push(event.into());
		self
	}

	pub fn merge(&mut self, other: Update) {
		self.dirty |= other.dirty;
		self.events.extend(other.events);
	}
}

/// Result of a single handler.
pub type HandlerResult = Result<Update, Rejection>;
