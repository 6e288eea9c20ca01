use ethsign::SecretKey;
use web3::signing::keccak256;

use crate::{
	constants::LOCKSROOT_OF_NO_LOCKS,
	hashing::{
		hash_balance_data,
		hash_message_identifier,
		hash_pending_locks,
		hash_secret,
	},
	signing::{
		hash_data,
		recover,
	},
	types::{
		Address,
		BalanceHash,
		Bytes,
		Locksroot,
		SecretHash,
		TokenAmount,
	},
};

#[test]
fn test_hash_secret_is_sha256() {
	let secrethash = hash_secret(&[0u8; 32]);
	assert_eq!(
		secrethash,
		SecretHash::from_slice(
			&hex::decode("66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925")
				.expect("Valid hex")
		)
	);
}

#[test]
fn test_balance_hash_of_empty_balance_is_zero() {
	let hash = hash_balance_data(TokenAmount::zero(), TokenAmount::zero(), *LOCKSROOT_OF_NO_LOCKS);
	assert_eq!(hash, BalanceHash::zero());

	let hash = hash_balance_data(TokenAmount::from(1), TokenAmount::zero(), *LOCKSROOT_OF_NO_LOCKS);
	assert_ne!(hash, BalanceHash::zero());
}

#[test]
fn test_locksroot_depends_on_lock_order() {
	let first = Bytes(vec![1; 96]);
	let second = Bytes(vec![2; 96]);

	assert_eq!(hash_pending_locks(&[]), *LOCKSROOT_OF_NO_LOCKS);

	let root = hash_pending_locks(&[first.clone(), second.clone()]);
	let expected = Locksroot::from_slice(&keccak256(&[first.0.clone(), second.0.clone()].concat()));
	assert_eq!(root, expected);
	assert_ne!(root, hash_pending_locks(&[second, first]));
}

#[test]
fn test_message_identifier_is_deterministic() {
	let a = hash_message_identifier(&[b"unlock", &[1, 2, 3]]);
	let b = hash_message_identifier(&[b"unlock", &[1, 2, 3]]);
	let c = hash_message_identifier(&[b"unlock", &[1, 2, 4]]);
	assert_eq!(a, b);
	assert_ne!(a, c);
}

#[test]
fn test_recover_signer() {
	let mut raw = [0u8; 32];
	raw[..5].copy_from_slice(b"ALICE");
	let key = SecretKey::from_raw(&raw).expect("Valid key");
	let address = Address::from_slice(key.public().address());

	let data = b"some data to sign";
	let signature = key.sign(&hash_data(data)).expect("Should sign");
	let mut bytes = vec![];
	bytes.extend_from_slice(&signature.r);
	bytes.extend_from_slice(&signature.s);
	bytes.push(signature.v + 27);

	assert_eq!(recover(data, &bytes).expect("Should recover"), address);
	assert!(recover(data, &bytes[..64]).is_err());
	assert_ne!(recover(b"other data", &bytes).ok(), Some(address));
}
