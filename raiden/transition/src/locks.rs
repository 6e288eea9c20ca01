use std::{
	collections::HashMap,
	hash::Hash,
	sync::Arc,
};

use parking_lot::Mutex;
use tokio::sync::{
	Mutex as AsyncMutex,
	OwnedMutexGuard,
};

/// One async lock per key, created on first use.
///
/// Held from building a balance proof until its signed version is reduced, so two messages
/// never claim the same nonce.
pub struct KeyedLocks<K> {
	locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
	fn default() -> Self {
		Self { locks: Mutex::new(HashMap::new()) }
	}
}

impl<K: Eq + Hash> KeyedLocks<K> {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
		let lock = self.locks.lock().entry(key).or_default().clone();
		lock.lock_owned().await
	}
}
