use std::sync::Arc;

use async_trait::async_trait;
use raiden_light_messages::messages::SignedMessage;
use raiden_light_primitives::types::{
	Address,
	Signature,
};

use crate::{
	errors::SignerError,
	keys::PrivateKey,
};

/// Custody of the node's key. Shared by every process which signs.
#[async_trait]
pub trait Signer: Send + Sync {
	fn address(&self) -> Address;

	/// Sign `data` the way `eth_sign` does.
	async fn sign_message(&self, data: &[u8]) -> Result<Signature, SignerError>;
}

#[async_trait]
impl Signer for PrivateKey {
	fn address(&self) -> Address {
		PrivateKey::address(self)
	}

	async fn sign_message(&self, data: &[u8]) -> Result<Signature, SignerError> {
		PrivateKey::sign_message(self, data)
	}
}

#[async_trait]
impl<S: Signer + ?Sized> Signer for Arc<S> {
	fn address(&self) -> Address {
		(**self).address()
	}

	async fn sign_message(&self, data: &[u8]) -> Result<Signature, SignerError> {
		(**self).sign_message(data).await
	}
}

/// Sign a protocol message in place.
pub async fn sign<S, M>(signer: &S, mut message: M) -> Result<M, SignerError>
where
	S: Signer + ?Sized,
	M: SignedMessage + Send,
{
	let signature = signer.sign_message(&message.bytes_to_sign()).await?;
	message.set_signature(signature);
	Ok(message)
}
