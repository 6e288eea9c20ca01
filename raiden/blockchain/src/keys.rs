use std::fs::File;

use ethsign::{
	KeyFile,
	Protected,
	SecretKey,
};
use raiden_light_primitives::{
	signing::hash_data,
	types::{
		Address,
		Bytes,
		Signature,
	},
};

use crate::errors::SignerError;

/// A secp256k1 private key held in memory.
#[derive(Clone)]
pub struct PrivateKey {
	inner: SecretKey,
}

impl PrivateKey {
	/// Decrypt a JSON keystore file.
	pub fn from_keystore(filename: &str, password: String) -> Result<Self, SignerError> {
		let file = File::open(filename)
			.map_err(|e| SignerError::Key(format!("Could not open file {}: {}", filename, e)))?;

		let key: KeyFile = serde_json::from_reader(file)
			.map_err(|e| SignerError::Key(format!("Could not read file {}: {}", filename, e)))?;

		let password: Protected = password.into();
		let plain = key.crypto.decrypt(&password).map_err(|e| {
			SignerError::Key(format!("Could not decrypt private key file {}: {:?}", filename, e))
		})?;

		Self::from_raw(&plain)
	}

	pub fn from_raw(raw: &[u8]) -> Result<Self, SignerError> {
		let inner = SecretKey::from_raw(raw)
			.map_err(|e| SignerError::Key(format!("Invalid private key: {:?}", e)))?;
		Ok(Self { inner })
	}

	/// Parse a hex encoded key, with or without the `0x` prefix.
	pub fn from_hex(data: &str) -> Result<Self, SignerError> {
		let raw = hex::decode(data.trim_start_matches("0x"))
			.map_err(|e| SignerError::Key(format!("Invalid hex private key: {}", e)))?;
		Self::from_raw(&raw)
	}

	pub fn address(&self) -> Address {
		Address::from_slice(self.inner.public().address())
	}

	/// Sign `data` with the `eth_sign` prefix, returning `r || s || v` with `v` in {27, 28}.
	pub fn sign_message(&self, data: &[u8]) -> Result<Signature, SignerError> {
		let data_hash = hash_data(data);
		let signature = self
			.inner
			.sign(&data_hash)
			.map_err(|e| SignerError::Signing(format!("{:?}", e)))?;

		let mut bytes = signature.r.to_vec();
		bytes.extend_from_slice(&signature.s);
		bytes.push(signature.v + 27);
		Ok(Bytes(bytes))
	}
}
