#![warn(clippy::missing_docs_in_private_items)]
//! The light client engine: a single transitioner serializing state changes into the state
//! machine and the protocol processes reacting to their outcomes.

/// Engine configuration.
pub mod config;
/// Handle used to submit state changes.
pub mod dispatcher;
/// Engine assembly and public API.
pub mod engine;
/// Engine errors.
pub mod errors;
/// Deduplication of concurrent operations.
pub mod inflight;
/// Per-key async locks.
pub mod locks;
/// Tracing subscriber setup.
pub mod logging;
/// State ownership and snapshots.
pub mod manager;
/// Protocol processes.
pub mod processes;
/// Periodic wakeups.
pub mod ticker;
/// The state change loop.
pub mod transitioner;

#[cfg(test)]
mod tests;

pub use engine::{
	Components,
	RaidenEngine,
	TransferRequest,
};
