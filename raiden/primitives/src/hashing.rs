use sha2::{
	Digest,
	Sha256,
};
use web3::signing::keccak256;

use crate::{
	constants::LOCKSROOT_OF_NO_LOCKS,
	types::{
		BalanceHash,
		EncodedLock,
		LockedAmount,
		Locksroot,
		MessageIdentifier,
		SecretHash,
		TokenAmount,
	},
};

/// Hash a secret into the secrethash a lock commits to.
pub fn hash_secret(secret: &[u8]) -> SecretHash {
	let mut hasher = Sha256::new();
	hasher.update(secret);
	let digest: [u8; 32] = hasher.finalize().into();
	SecretHash::from(digest)
}

/// Hash the balance data of a balance proof.
///
/// The empty balance (nothing transferred, nothing locked) hashes to zero, which is what the
/// token network contract expects for channels without any transfers.
pub fn hash_balance_data(
	transferred_amount: TokenAmount,
	locked_amount: LockedAmount,
	locksroot: Locksroot,
) -> BalanceHash {
	if transferred_amount.is_zero() &&
		locked_amount.is_zero() &&
		(locksroot == *LOCKSROOT_OF_NO_LOCKS || locksroot.is_zero())
	{
		return BalanceHash::zero()
	}

	let mut transferred_amount_in_bytes: [u8; 32] = [0; 32];
	transferred_amount.to_big_endian(&mut transferred_amount_in_bytes);

	let mut locked_amount_in_bytes: [u8; 32] = [0; 32];
	locked_amount.to_big_endian(&mut locked_amount_in_bytes);

	let hash = keccak256(
		&[&transferred_amount_in_bytes[..], &locked_amount_in_bytes[..], &locksroot.0[..]].concat(),
	);
	BalanceHash::from_slice(&hash)
}

/// Compute the locksroot of an ordered list of encoded pending locks.
pub fn hash_pending_locks(locks: &[EncodedLock]) -> Locksroot {
	if locks.is_empty() {
		return *LOCKSROOT_OF_NO_LOCKS
	}

	let mut data = vec![];
	for lock in locks {
		data.extend_from_slice(&lock.0);
	}
	Locksroot::from_slice(&keccak256(&data))
}

/// Derive a message identifier from the data that makes a message unique.
///
/// Deriving identifiers keeps re-built messages byte-identical to the first one.
pub fn hash_message_identifier(parts: &[&[u8]]) -> MessageIdentifier {
	let hash = keccak256(&parts.concat());
	let mut identifier = [0u8; 8];
	identifier.copy_from_slice(&hash[..8]);
	u64::from_be_bytes(identifier)
}
