pub use raiden_light_primitives::constants::SECRET_LENGTH;

/// Default number of blocks reserved to reveal a secret before its lock expires.
pub const DEFAULT_REVEAL_TIMEOUT: u64 = 50;

/// Default number of blocks between a channel close and its settlement window.
pub const DEFAULT_SETTLE_TIMEOUT: u64 = 500;

/// Default number of blocks an event needs before it is considered confirmed.
pub const DEFAULT_NUMBER_OF_BLOCK_CONFIRMATIONS: u64 = 5;

/// Format version of persisted snapshots.
pub const SNAPSHOT_VERSION: u32 = 1;

