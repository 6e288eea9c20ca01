#![warn(clippy::missing_docs_in_private_items)]

/// Blockchain errors.
pub mod errors;
/// Private key custody.
pub mod keys;
/// Message and data signing.
pub mod signer;
/// On-chain transaction submission.
pub mod transactions;
/// Confirmed chain event sources.
pub mod watcher;
