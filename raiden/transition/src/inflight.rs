use std::{
	collections::HashMap,
	future::Future,
	hash::Hash,
	sync::atomic::{
		AtomicU64,
		Ordering,
	},
};

use futures::future::{
	BoxFuture,
	FutureExt,
	Shared,
};
use parking_lot::Mutex;

/// Runs at most one future per key. Callers arriving while it runs share its result.
pub struct InFlight<K, V: Clone> {
	running: Mutex<HashMap<K, (u64, Shared<BoxFuture<'static, V>>)>>,
	generation: AtomicU64,
}

impl<K, V> Default for InFlight<K, V>
where
	V: Clone,
{
	fn default() -> Self {
		Self { running: Mutex::new(HashMap::new()), generation: AtomicU64::new(0) }
	}
}

impl<K, V> InFlight<K, V>
where
	K: Clone + Eq + Hash,
	V: Clone + Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Run `future` under `key`, or join the run already in flight, in which case `future`
	/// is dropped unpolled.
	pub async fn run<F>(&self, key: K, future: F) -> V
	where
		F: Future<Output = V> + Send + 'static,
	{
		let (generation, shared) = {
			let mut running = self.running.lock();
			match running.get(&key) {
				Some((generation, shared)) => (*generation, shared.clone()),
				None => {
					let generation = self.generation.fetch_add(1, Ordering::Relaxed);
					let shared = future.boxed().shared();
					running.insert(key.clone(), (generation, shared.clone()));
					(generation, shared)
				},
			}
		};

		let result = shared.await;

		let mut running = self.running.lock();
		if matches!(running.get(&key), Some((current, _)) if *current == generation) {
			running.remove(&key);
		}
		result
	}

	pub fn is_running(&self, key: &K) -> bool {
		self.running.lock().contains_key(key)
	}
}
