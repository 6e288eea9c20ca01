use raiden_light_primitives::{
	hashing::hash_secret,
	types::{
		Bytes,
		Secret,
		SecretHash,
	},
};
use rand::{
	distributions::Alphanumeric,
	thread_rng,
	Rng,
};

use crate::constants::SECRET_LENGTH;

pub struct Generator;

impl Generator {
	pub fn random_secret() -> Secret {
		Bytes(thread_rng().sample_iter(&Alphanumeric).take(SECRET_LENGTH).collect::<Vec<u8>>())
	}

	pub fn secret_and_hash() -> (Secret, SecretHash) {
		let secret = Self::random_secret();
		let secrethash = hash_secret(&secret.0);
		(secret, secrethash)
	}
}
