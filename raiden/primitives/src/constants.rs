use lazy_static::lazy_static;
use web3::signing::keccak256;

use crate::types::{
	Bytes,
	Locksroot,
};

/// Length in bytes of a lock secret.
pub const SECRET_LENGTH: usize = 32;

/// Length in bytes of a recoverable signature.
pub const SIGNATURE_LENGTH: usize = 65;

lazy_static! {
	pub static ref EMPTY_SIGNATURE: Bytes = Bytes(vec![0; SIGNATURE_LENGTH]);
	pub static ref LOCKSROOT_OF_NO_LOCKS: Locksroot = Locksroot::from_slice(&keccak256(&[]));
}
