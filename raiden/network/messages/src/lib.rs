#![warn(clippy::missing_docs_in_private_items)]

/// Wire encoding and decoding of messages.
pub mod decode;
/// Message errors.
pub mod errors;
/// Protocol messages.
pub mod messages;
