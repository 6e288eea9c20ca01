#![warn(clippy::missing_docs_in_private_items)]

use raiden_light_primitives::{
	hashing::hash_pending_locks,
	types::{
		EncodedLock,
		LockedAmount,
		Locksroot,
		SecretHash,
		U256,
	},
};

use crate::types::HashTimeLockState;

/// The pending locks once `lock` is added, or `None` if it is already pending.
pub(crate) fn compute_locks_with(
	pending_locks: &[HashTimeLockState],
	lock: HashTimeLockState,
) -> Option<Vec<HashTimeLockState>> {
	if pending_locks.iter().any(|l| l.secrethash == lock.secrethash || l.encoded == lock.encoded) {
		return None
	}

	let mut locks = pending_locks.to_vec();
	locks.push(lock);
	Some(locks)
}

/// The pending locks once the lock of `secrethash` is removed, or `None` if it is not pending.
pub(crate) fn compute_locks_without(
	pending_locks: &[HashTimeLockState],
	secrethash: &SecretHash,
) -> Option<Vec<HashTimeLockState>> {
	if !pending_locks.iter().any(|l| l.secrethash == *secrethash) {
		return None
	}

	Some(pending_locks.iter().filter(|l| l.secrethash != *secrethash).cloned().collect())
}

pub fn compute_locksroot(locks: &[HashTimeLockState]) -> Locksroot {
	let encoded: Vec<EncodedLock> = locks.iter().map(|lock| lock.encoded.clone()).collect();
	hash_pending_locks(&encoded)
}

pub fn compute_locked_amount(locks: &[HashTimeLockState]) -> LockedAmount {
	locks.iter().fold(LockedAmount::zero(), |acc, lock| acc.saturating_add(lock.amount))
}

/// Big endian bytes of a 256 bit number, as hashed into message identifiers.
pub(crate) fn u256_bytes(value: U256) -> [u8; 32] {
	let mut bytes = [0u8; 32];
	value.to_big_endian(&mut bytes);
	bytes
}
