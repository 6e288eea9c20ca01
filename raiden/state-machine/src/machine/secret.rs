#![warn(clippy::missing_docs_in_private_items)]

use raiden_light_messages::messages::{
	SecretRequest,
	SecretReveal,
};
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	hashing::{
		hash_message_identifier,
		hash_secret,
	},
	types::{
		BlockNumber,
		Secret,
		SecretHash,
	},
};

use super::{
	channel::validators,
	transfer::{
		get_transfer,
		get_transfer_mut,
	},
	HandlerResult,
	Update,
};
use crate::{
	errors::{
		ErrorCode,
		RejectWith,
		Rejection,
	},
	types::{
		ActionSecretRegistrationFailed,
		ActionSecretRequestSigned,
		ActionSecretRevealSigned,
		ActionTransferSecret,
		ChainState,
		ContractReceiveSecretRevealed,
		ErrorInvalidAction,
		Meta,
		ReceiveSecretRequest,
		ReceiveSecretReveal,
		SecretLearned,
		SecretState,
		TransferDirection,
		TransferKey,
	},
};

fn check_secret(secrethash: &SecretHash, secret: &Secret) -> Result<(), Rejection> {
	if hash_secret(&secret.0) != *secrethash {
		return Err(Rejection::new(
			ErrorCode::SecretMismatch,
			format!("Secret does not hash to {:#x}", secrethash),
		))
	}
	Ok(())
}

/// Remember a secret. A known registration block is never erased by a later sighting.
pub(super) fn cache_secret(
	chain_state: &mut ChainState,
	secrethash: SecretHash,
	secret: Secret,
	registered_block: Option<BlockNumber>,
) -> Update {
	let learned = SecretLearned { secrethash, secret: secret.clone(), registered_block };
	match chain_state.secrets.get_mut(&secrethash) {
		None => {
			chain_state.secrets.insert(secrethash, SecretState { secret, registered_block });
			Update::changed().with_event(learned)
		},
		Some(known) if known.registered_block.is_none() && registered_block.is_some() => {
			known.registered_block = registered_block;
			Update::changed().with_event(learned)
		},
		Some(_) => Update::noop(),
	}
}

/// Build the secret request for a transfer paid to us.
pub fn make_secret_request(
	chain_state: &ChainState,
	secrethash: SecretHash,
) -> Result<SecretRequest, Rejection> {
	let transfer = get_transfer(chain_state, &TransferKey::received(secrethash))?;
	if transfer.is_resolved() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer is already resolved"))
	}
	let reveal_timeout = chain_state
		.channels
		.get(&transfer.channel_key())
		.map(|channel| channel.reveal_timeout)
		.unwrap_or(chain_state.reveal_timeout);
	if chain_state.block_number.saturating_add(reveal_timeout) >= transfer.expiration {
		return Err(Rejection::new(
			ErrorCode::LockExpired,
			format!("Lock expires at {}, too late to request its secret", transfer.expiration),
		))
	}

	let message = &transfer.transfer;
	Ok(SecretRequest {
		message_identifier: hash_message_identifier(&[
			b"SecretRequest",
			secrethash.as_bytes(),
			&message.message_identifier.to_be_bytes(),
		]),
		payment_identifier: message.payment_identifier,
		secrethash,
		amount: message.lock.amount,
		expiration: message.lock.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// Build the reveal of a known secret for a transfer.
pub fn make_secret_reveal(
	chain_state: &ChainState,
	key: TransferKey,
) -> Result<SecretReveal, Rejection> {
	let transfer = get_transfer(chain_state, &key)?;
	let secret = chain_state.secret(&key.secrethash).ok_or_else(|| {
		Rejection::new(ErrorCode::SecretMismatch, format!("Secret of {:#x} is unknown", key.secrethash))
	})?;

	Ok(SecretReveal {
		message_identifier: hash_message_identifier(&[
			b"SecretReveal",
			key.to_string().as_bytes(),
			&transfer.transfer.message_identifier.to_be_bytes(),
		]),
		secret: secret.clone(),
		signature: EMPTY_SIGNATURE.clone(),
	})
}

pub(super) fn handle_action_transfer_secret(
	chain_state: &mut ChainState,
	state_change: ActionTransferSecret,
) -> HandlerResult {
	check_secret(&state_change.secrethash, &state_change.secret)?;
	let mut update = cache_secret(chain_state, state_change.secrethash, state_change.secret, None);
	// Our own secret is not news.
	update.events.clear();
	Ok(update)
}

/// The payee of a sent transfer asks for the secret.
pub(super) fn handle_receive_secret_request(
	chain_state: &mut ChainState,
	state_change: ReceiveSecretRequest,
) -> HandlerResult {
	let message = state_change.message;
	let key = TransferKey::sent(message.secrethash);
	let transfer = get_transfer(chain_state, &key)?;

	if state_change.sender != transfer.transfer.target {
		return Err(Rejection::new(
			ErrorCode::UnexpectedSender,
			format!("Secret requested by {:#x}, not the target", state_change.sender),
		))
	}
	validators::is_valid_signature(&message, state_change.sender)
		.reject_with(ErrorCode::InvalidSignature)?;
	if transfer.secret_request.as_ref() == Some(&message) {
		return Ok(Update::noop())
	}
	if transfer.is_resolved() || transfer.refund.is_some() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer is no longer pending"))
	}
	if message.payment_identifier != transfer.transfer.payment_identifier {
		return Err(Rejection::new(ErrorCode::InvalidPaymentIdentifier, "Payment identifier mismatch"))
	}
	if message.amount != transfer.transfer.lock.amount {
		return Err(Rejection::new(
			ErrorCode::InvalidAmount,
			format!(
				"Secret requested for {}, lock amount is {}",
				message.amount, transfer.transfer.lock.amount
			),
		))
	}
	if message.expiration != transfer.expiration {
		return Err(Rejection::new(
			ErrorCode::InvalidExpiration,
			format!(
				"Secret requested for expiration {}, lock expires at {}",
				message.expiration, transfer.expiration
			),
		))
	}
	if chain_state.block_number >= transfer.expiration {
		return Err(Rejection::new(ErrorCode::LockExpired, "Lock already expired"))
	}

	get_transfer_mut(chain_state, &key)?.secret_request = Some(message);
	Ok(Update::changed())
}

/// A peer revealed a secret, either the next hop of a sent transfer or the payer of a received one.
pub(super) fn handle_receive_secret_reveal(
	chain_state: &mut ChainState,
	state_change: ReceiveSecretReveal,
) -> HandlerResult {
	let message = state_change.message;
	let sender = state_change.sender;
	let secrethash = message.secrethash();

	if sender == chain_state.our_address {
		return Ok(Update::noop())
	}
	validators::is_valid_signature(&message, sender).reject_with(ErrorCode::InvalidSignature)?;

	let mut update = Update::noop();
	let mut learned = false;

	if let Some(transfer) = chain_state.transfers.get_mut(&TransferKey::sent(secrethash)) {
		if transfer.partner == sender && !transfer.is_resolved() && !transfer.partner_revealed {
			transfer.partner_revealed = true;
			update.dirty = true;
			learned = true;
		}
	}
	if let Some(transfer) = chain_state.transfers.get(&TransferKey::received(secrethash)) {
		if !transfer.is_resolved() {
			learned = true;
		}
	}

	if learned {
		update.merge(cache_secret(chain_state, secrethash, message.secret, None));
	}
	Ok(update)
}

/// A secret registered on-chain counts as revealed for transfers in both directions.
pub(super) fn handle_contract_receive_secret_revealed(
	chain_state: &mut ChainState,
	state_change: ContractReceiveSecretRevealed,
) -> HandlerResult {
	let secrethash = state_change.secrethash;
	check_secret(&secrethash, &state_change.secret)?;

	let mut update = cache_secret(
		chain_state,
		secrethash,
		state_change.secret,
		Some(state_change.block_number),
	);
	if let Some(transfer) = chain_state.transfers.get_mut(&TransferKey::sent(secrethash)) {
		if !transfer.is_resolved() && !transfer.partner_revealed {
			transfer.partner_revealed = true;
			update.dirty = true;
		}
	}
	Ok(update)
}

pub(super) fn handle_action_secret_request_signed(
	chain_state: &mut ChainState,
	state_change: ActionSecretRequestSigned,
) -> HandlerResult {
	let key = TransferKey::received(state_change.secrethash);
	let transfer = get_transfer(chain_state, &key)?;
	if state_change.message.secrethash != state_change.secrethash {
		return Err(Rejection::new(ErrorCode::SecretMismatch, "Request is for another secrethash"))
	}
	validators::is_valid_signature(&state_change.message, chain_state.our_address)
		.reject_with(ErrorCode::InvalidSignature)?;
	match &transfer.secret_request {
		Some(request) if *request == state_change.message => return Ok(Update::noop()),
		Some(_) =>
			return Err(Rejection::new(ErrorCode::TransferConflict, "Secret already requested")),
		None => {},
	}

	get_transfer_mut(chain_state, &key)?.secret_request = Some(state_change.message);
	Ok(Update::changed())
}

pub(super) fn handle_action_secret_reveal_signed(
	chain_state: &mut ChainState,
	state_change: ActionSecretRevealSigned,
) -> HandlerResult {
	let key = state_change.key;
	let transfer = get_transfer(chain_state, &key)?;
	if state_change.message.secrethash() != key.secrethash {
		return Err(Rejection::new(ErrorCode::SecretMismatch, "Reveal is for another secrethash"))
	}
	validators::is_valid_signature(&state_change.message, chain_state.our_address)
		.reject_with(ErrorCode::InvalidSignature)?;
	match &transfer.secret_reveal {
		Some(reveal) if *reveal == state_change.message => return Ok(Update::noop()),
		Some(_) => return Err(Rejection::new(ErrorCode::TransferConflict, "Secret already revealed")),
		None => {},
	}
	if key.direction == TransferDirection::Received && transfer.is_resolved() {
		return Err(Rejection::new(ErrorCode::TransferResolved, "Transfer is already resolved"))
	}

	let secret = state_change.message.secret.clone();
	get_transfer_mut(chain_state, &key)?.secret_reveal = Some(state_change.message);
	let mut update = Update::changed();
	update.merge(cache_secret(chain_state, key.secrethash, secret, None));
	Ok(update)
}

/// Report a failed on-chain registration. The transfer stays as it is so the registration can
/// be attempted again while the lock is alive.
pub(super) fn handle_action_secret_registration_failed(
	chain_state: &mut ChainState,
	state_change: ActionSecretRegistrationFailed,
) -> HandlerResult {
	let key = TransferKey::received(state_change.secrethash);
	get_transfer(chain_state, &key)?;
	Ok(Update::noop().with_event(ErrorInvalidAction::new(
		Meta::Transfer(key),
		Rejection::new(ErrorCode::TransactionFailed, state_change.reason),
	)))
}
