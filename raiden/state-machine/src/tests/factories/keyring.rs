use ethsign::SecretKey;
use raiden_light_messages::messages::SignedMessage;
use raiden_light_primitives::{
	signing::hash_data,
	types::{
		Address,
		Bytes,
	},
};

pub const ALICE: &str = "ALICE";
pub const BOB: &str = "BOB";
pub const CHARLIE: &str = "CHARLIE";

#[derive(Copy, Clone, Debug)]
pub enum Keyring {
	Alice,
	Bob,
	Charlie,
}

impl Keyring {
	pub fn private_key(&self) -> SecretKey {
		let mut secret: [u8; 32] = [0; 32];
		let s = match self {
			Self::Alice => ALICE.as_bytes(),
			Self::Bob => BOB.as_bytes(),
			Self::Charlie => CHARLIE.as_bytes(),
		};
		secret[..s.len()].copy_from_slice(s);
		SecretKey::from_raw(&secret).expect("Private key generation should not fail")
	}

	pub fn address(&self) -> Address {
		Address::from_slice(self.private_key().public().address())
	}

	/// Sign a message the way a peer would, with an `eth_sign` style signature.
	pub fn sign<M: SignedMessage>(&self, mut message: M) -> M {
		let data_hash = hash_data(&message.bytes_to_sign());
		let signature = self.private_key().sign(&data_hash).expect("Data should be signed");

		let mut bytes = signature.r.to_vec();
		bytes.extend_from_slice(&signature.s);
		bytes.push(signature.v + 27);
		message.set_signature(Bytes(bytes));
		message
	}
}
