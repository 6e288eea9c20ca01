#![warn(clippy::missing_docs_in_private_items)]

/// Base constants.
pub mod constants;
/// Base deserializers.
pub mod deserializers;
/// Base hashing functions.
pub mod hashing;
/// Base packing functions.
pub mod packing;
/// Base serializers.
pub mod serializers;
/// Signature recovery utils.
pub mod signing;
#[cfg(test)]
mod tests;
/// Base types.
pub mod types;
