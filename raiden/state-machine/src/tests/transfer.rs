use raiden_light_messages::messages::{
	LockExpired,
	LockedTransfer,
	Processed,
	RefundTransfer,
	SecretRequest,
	SecretReveal,
};
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	types::{
		BlockNumber,
		BlockTimeout,
		PaymentIdentifier,
		TokenAmount,
		U256,
	},
};

use crate::{
	errors::ErrorCode,
	machine::{
		channel::utils::compute_locksroot,
		secret,
		transfer,
	},
	tests::factories::{
		advance_to,
		apply,
		assert_rejected,
		init_transfer,
		partner_transfer,
		partner_unlock,
		send_transfer,
		transition,
		ChainStateBuilder,
		ChainStateInfo,
		Generator,
		Keyring,
		START_BLOCK,
	},
	types::{
		ActionLockExpiredSigned,
		ActionSecretRevealSigned,
		ActionTransferClear,
		ActionTransferExpire,
		ActionTransferFailed,
		ActionTransferSecret,
		ActionUnlockSigned,
		ContractReceiveChannelClosed,
		Event,
		ReceiveLockExpired,
		ReceiveLockedTransfer,
		ReceiveProcessed,
		ReceiveSecretRequest,
		ReceiveSecretReveal,
		ReceiveTransferRefund,
		ReceiveUnlock,
		TransferKey,
		TransferStatus,
	},
	views,
};

fn setup() -> ChainStateInfo {
	ChainStateBuilder::new().with_channel(Keyring::Bob, 100, 50).build()
}

#[test]
fn test_init_transfer_validation() {
	let info = setup();
	let (_, secrethash) = Generator::secret_and_hash();

	let result = transition(
		info.chain_state.clone(),
		init_transfer(&info, Keyring::Bob.address(), 10, secrethash),
	);
	assert!(!result.changed);
	assert!(result.events.is_empty());

	let result = transition(
		info.chain_state.clone(),
		init_transfer(&info, Keyring::Bob.address(), 101, secrethash),
	);
	assert_rejected(&result, ErrorCode::InsufficientCapacity);

	let result = transition(
		info.chain_state.clone(),
		init_transfer(&info, Keyring::Alice.address(), 10, secrethash),
	);
	assert_rejected(&result, ErrorCode::NoRoute);

	let result = transition(
		info.chain_state.clone(),
		init_transfer(&info, Keyring::Charlie.address(), 10, secrethash),
	);
	assert_rejected(&result, ErrorCode::NoRoute);

	let mut init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	init.lock_timeout = Some(BlockTimeout::from(600u64));
	let result = transition(info.chain_state.clone(), init);
	assert_rejected(&result, ErrorCode::InvalidExpiration);

	let mut init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	init.secret = Some(Generator::random_secret());
	let result = transition(info.chain_state, init);
	assert_rejected(&result, ErrorCode::SecretMismatch);
}

#[test]
fn test_locked_transfer_is_built_from_channel_state() {
	let info = setup();
	let (_, secrethash) = Generator::secret_and_hash();
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);

	let (message, partner) =
		transfer::make_locked_transfer(&info.chain_state, &init).expect("Transfer should be built");
	assert_eq!(partner, Keyring::Bob.address());
	assert_eq!(message.nonce, U256::from(1u64));
	assert_eq!(message.lock.amount, TokenAmount::from(10u64));
	assert_eq!(message.lock.expiration, BlockNumber::from(START_BLOCK + 100));
	assert_eq!(message.locked_amount, TokenAmount::from(10u64));
	assert_eq!(message.initiator, Keyring::Alice.address());
	assert_eq!(message.metadata.routes[0].route, vec![
		Keyring::Alice.address(),
		Keyring::Bob.address()
	]);

	let rebuilt =
		transfer::make_locked_transfer(&info.chain_state, &init).expect("Transfer should be built");
	assert_eq!(rebuilt.0.message_identifier, message.message_identifier);
}

#[test]
fn test_sent_transfer_unlock_flow() {
	let info = setup();
	let key = info.channel_key();
	let (secret, secrethash) = Generator::secret_and_hash();
	let transfer_key = TransferKey::sent(secrethash);
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);

	let chain_state = apply(
		info.chain_state.clone(),
		ActionTransferSecret { secrethash, secret: secret.clone() },
	);
	let chain_state = send_transfer(chain_state, &init);
	let sent = &chain_state.transfers[&transfer_key];
	assert_eq!(sent.status(), TransferStatus::Pending);
	assert_eq!(views::channel_capacity(&chain_state.channels[&key]), TokenAmount::from(90u64));

	let request = Keyring::Bob.sign(SecretRequest {
		message_identifier: 5,
		payment_identifier: PaymentIdentifier::from(1u64),
		secrethash,
		amount: TokenAmount::from(10u64),
		expiration: sent.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	});
	let chain_state =
		apply(chain_state, ReceiveSecretRequest { sender: Keyring::Bob.address(), message: request });
	assert_eq!(chain_state.transfers[&transfer_key].status(), TransferStatus::SecretRequested);

	let reveal = secret::make_secret_reveal(&chain_state, transfer_key).expect("Secret is known");
	let chain_state = apply(
		chain_state,
		ActionSecretRevealSigned { key: transfer_key, message: Keyring::Alice.sign(reveal) },
	);
	assert_eq!(chain_state.transfers[&transfer_key].status(), TransferStatus::SecretRevealed);

	let partner_reveal = Keyring::Bob.sign(SecretReveal {
		message_identifier: 6,
		secret: secret.clone(),
		signature: EMPTY_SIGNATURE.clone(),
	});
	let chain_state = apply(
		chain_state,
		ReceiveSecretReveal { sender: Keyring::Bob.address(), message: partner_reveal },
	);
	assert!(chain_state.transfers[&transfer_key].partner_revealed);

	let unlock = transfer::make_unlock(&chain_state, secrethash).expect("Unlock should be built");
	let unlock_identifier = unlock.message_identifier;
	let chain_state = apply(
		chain_state,
		ActionUnlockSigned { secrethash, message: Keyring::Alice.sign(unlock) },
	);
	let channel = &chain_state.channels[&key];
	assert_eq!(channel.our_state.transferred_amount(), TokenAmount::from(10u64));
	assert!(channel.our_state.pending_locks.is_empty());
	assert_eq!(views::partner_capacity(channel), TokenAmount::from(60u64));
	assert_eq!(chain_state.transfers[&transfer_key].status(), TransferStatus::Unlocking);

	let result = transition(chain_state.clone(), ActionTransferClear { key: transfer_key });
	assert_rejected(&result, ErrorCode::TransferConflict);

	let processed = Keyring::Bob.sign(Processed::new(unlock_identifier));
	let chain_state = apply(
		chain_state,
		ReceiveProcessed { sender: Keyring::Bob.address(), message: processed },
	);
	assert_eq!(chain_state.transfers[&transfer_key].status(), TransferStatus::Unlocked);

	let chain_state = apply(chain_state, ActionTransferClear { key: transfer_key });
	assert!(chain_state.transfers.get(&transfer_key).is_none());
	assert!(chain_state.secret(&secrethash).is_none());
}

#[test]
fn test_sent_transfer_expires() {
	let info = setup();
	let key = info.channel_key();
	let (_, secrethash) = Generator::secret_and_hash();
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	let chain_state = send_transfer(info.chain_state.clone(), &init);
	let expiration = chain_state.transfers[&TransferKey::sent(secrethash)].expiration;

	let result = transition(chain_state.clone(), ActionTransferExpire { secrethash });
	assert_rejected(&result, ErrorCode::LockNotExpired);

	let chain_state = advance_to(chain_state, u64::from(expiration) + 1);
	assert_eq!(views::expirable_transfers(&chain_state).len(), 1);

	let result = transition(chain_state.clone(), ActionTransferExpire { secrethash });
	assert!(!result.changed);
	assert!(result.events.is_empty());

	let expired =
		transfer::make_lock_expired(&chain_state, secrethash).expect("Expiry should be built");
	let chain_state = apply(
		chain_state,
		ActionLockExpiredSigned { secrethash, message: Keyring::Alice.sign(expired) },
	);
	let channel = &chain_state.channels[&key];
	assert!(channel.our_state.pending_locks.is_empty());
	assert_eq!(views::channel_capacity(channel), TokenAmount::from(100u64));
	assert_eq!(
		chain_state.transfers[&TransferKey::sent(secrethash)].status(),
		TransferStatus::Expiring
	);
	assert!(views::expirable_transfers(&chain_state).is_empty());
}

#[test]
fn test_transfer_failure_and_refund() {
	let info = setup();
	let (_, secrethash) = Generator::secret_and_hash();
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	let chain_state = send_transfer(info.chain_state.clone(), &init);
	let sent = chain_state.transfers[&TransferKey::sent(secrethash)].transfer.clone();

	let refund = Keyring::Bob.sign(RefundTransfer {
		transfer: LockedTransfer {
			message_identifier: 9,
			recipient: Keyring::Alice.address(),
			signature: EMPTY_SIGNATURE.clone(),
			..sent
		},
	});
	let chain_state = apply(
		chain_state,
		ReceiveTransferRefund { sender: Keyring::Bob.address(), message: refund },
	);
	let refunded = &chain_state.transfers[&TransferKey::sent(secrethash)];
	assert_eq!(refunded.status(), TransferStatus::Refunded);
	assert!(refunded.failed.is_some());

	let result = transition(
		chain_state,
		ActionTransferFailed { secrethash, reason: "no route".to_owned() },
	);
	assert!(!result.changed);
}

#[test]
fn test_closed_channel_fails_transfers_without_secret() {
	let info = setup();
	let key = info.channel_key();
	let channel_identifier = info.channel().channel_identifier.expect("Channel should be open");
	let (_, secrethash) = Generator::secret_and_hash();
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	let chain_state = send_transfer(info.chain_state.clone(), &init);

	let result = transition(
		chain_state,
		ContractReceiveChannelClosed {
			channel: key,
			channel_identifier,
			closing_participant: Keyring::Bob.address(),
			block_number: BlockNumber::from(START_BLOCK),
		},
	);
	assert!(result.changed);
	assert!(result.events.iter().any(|event| matches!(
		event,
		Event::TransferChannelClosed(closed)
			if closed.key == TransferKey::sent(secrethash) && !closed.resolvable
	)));
	let closed = &result.new_state.transfers[&TransferKey::sent(secrethash)];
	assert!(closed.failed.is_some());
	assert_eq!(closed.channel_closed, Some(BlockNumber::from(START_BLOCK)));
}

#[test]
fn test_received_transfer_unlock_flow() {
	let info = setup();
	let key = info.channel_key();
	let (secret, secrethash) = Generator::secret_and_hash();
	let transfer_key = TransferKey::received(secrethash);
	let message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);

	let state_change = ReceiveLockedTransfer { sender: Keyring::Bob.address(), message: message.clone() };
	let chain_state = apply(info.chain_state.clone(), state_change.clone());
	assert_eq!(views::partner_capacity(&chain_state.channels[&key]), TokenAmount::from(40u64));
	assert_eq!(
		views::acknowledgeable_message(&chain_state, &state_change.clone().into()),
		Some((Keyring::Bob.address(), message.message_identifier))
	);

	let duplicate = transition(chain_state.clone(), state_change);
	assert!(!duplicate.changed);
	assert!(duplicate.events.is_empty());

	let request =
		secret::make_secret_request(&chain_state, secrethash).expect("Request should be built");
	assert_eq!(request.amount, TokenAmount::from(10u64));
	assert_eq!(request.expiration, message.lock.expiration);

	let unlock = partner_unlock(&message, Keyring::Bob, secret.clone());
	let result = transition(
		chain_state,
		ReceiveUnlock { sender: Keyring::Bob.address(), message: unlock },
	);
	assert!(result.changed);
	assert!(matches!(
		&result.events[..],
		[Event::SecretLearned(learned)] if learned.secrethash == secrethash && learned.secret == secret
	));
	let channel = &result.new_state.channels[&key];
	assert_eq!(views::channel_capacity(channel), TokenAmount::from(110u64));
	assert!(channel.partner_state.pending_locks.is_empty());
	assert_eq!(result.new_state.transfers[&transfer_key].status(), TransferStatus::Unlocked);
}

#[test]
fn test_received_transfer_validation() {
	let info = setup();
	let (_, secrethash) = Generator::secret_and_hash();

	let mut message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);
	message.target = Keyring::Charlie.address();
	let message = Keyring::Bob.sign(message);
	let result = transition(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message },
	);
	assert_rejected(&result, ErrorCode::NoRoute);

	let mut message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);
	message.nonce = U256::from(2u64);
	let message = Keyring::Bob.sign(message);
	let result = transition(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message },
	);
	assert_rejected(&result, ErrorCode::InvalidNonce);

	let message = partner_transfer(&info, Keyring::Charlie, secrethash, 10, START_BLOCK + 100);
	let result = transition(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message },
	);
	assert_rejected(&result, ErrorCode::InvalidSignature);

	let message = partner_transfer(&info, Keyring::Bob, secrethash, 60, START_BLOCK + 100);
	let result = transition(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message },
	);
	assert_rejected(&result, ErrorCode::InsufficientCapacity);

	let message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK);
	let result = transition(
		info.chain_state,
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message },
	);
	assert_rejected(&result, ErrorCode::LockExpired);
}

#[test]
fn test_init_transfer_keeps_secret_only_when_accepted() {
	let info = setup();
	let (secret, secrethash) = Generator::secret_and_hash();
	let key = TransferKey::sent(secrethash);

	let mut init = init_transfer(&info, Keyring::Charlie.address(), 10, secrethash);
	init.secret = Some(secret.clone());
	let result = transition(info.chain_state.clone(), init);
	assert_rejected(&result, ErrorCode::NoRoute);
	assert!(result.new_state.secrets.is_empty());

	let mut init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	init.secret = Some(secret.clone());
	let result = transition(info.chain_state.clone(), init);
	assert!(result.changed);
	assert!(result.events.is_empty());
	assert_eq!(result.new_state.secret(&secrethash), Some(&secret));

	// No transfer was signed for the intent.
	let chain_state = apply(result.new_state, ActionTransferClear { key });
	assert!(chain_state.secrets.is_empty());

	let result = transition(chain_state, ActionTransferClear { key });
	assert_rejected(&result, ErrorCode::TransferNotFound);
}

#[test]
fn test_closed_channel_needs_revealed_secret_for_sent_transfers() {
	let info = setup();
	let channel_identifier = info.channel().channel_identifier.expect("Channel should be open");
	let (secret, secrethash) = Generator::secret_and_hash();
	let transfer_key = TransferKey::sent(secrethash);
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	let closed = ContractReceiveChannelClosed {
		channel: info.channel_key(),
		channel_identifier,
		closing_participant: Keyring::Bob.address(),
		block_number: BlockNumber::from(START_BLOCK),
	};
	let resolvable = |events: &[Event]| {
		events.iter().find_map(|event| match event {
			Event::TransferChannelClosed(closed) if closed.key == transfer_key => Some(closed.resolvable),
			_ => None,
		})
	};

	let chain_state = apply(info.chain_state.clone(), ActionTransferSecret { secrethash, secret });
	let chain_state = send_transfer(chain_state, &init);

	// The payee cannot claim a lock whose secret only we know.
	let result = transition(chain_state.clone(), closed.clone());
	assert_eq!(resolvable(&result.events[..]), Some(false));
	assert!(result.new_state.transfers[&transfer_key].failed.is_some());

	let reveal = secret::make_secret_reveal(&chain_state, transfer_key).expect("Secret is known");
	let chain_state = apply(
		chain_state,
		ActionSecretRevealSigned { key: transfer_key, message: Keyring::Alice.sign(reveal) },
	);
	let result = transition(chain_state, closed);
	assert_eq!(resolvable(&result.events[..]), Some(true));
	assert!(result.new_state.transfers[&transfer_key].failed.is_none());
}

#[test]
fn test_received_balance_proofs_must_commit_to_locks() {
	let info = setup();
	let (secret, secrethash) = Generator::secret_and_hash();

	let mut message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);
	message.locksroot = compute_locksroot(&[]);
	let result = transition(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message: Keyring::Bob.sign(message) },
	);
	assert_rejected(&result, ErrorCode::InvalidLocksroot);

	let mut message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);
	message.locked_amount = TokenAmount::from(9u64);
	let result = transition(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message: Keyring::Bob.sign(message) },
	);
	assert_rejected(&result, ErrorCode::InvalidLockedAmount);

	let message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);
	let chain_state = apply(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message: message.clone() },
	);

	let mut unlock = partner_unlock(&message, Keyring::Bob, secret.clone());
	unlock.locksroot = message.locksroot;
	let result = transition(
		chain_state.clone(),
		ReceiveUnlock { sender: Keyring::Bob.address(), message: Keyring::Bob.sign(unlock) },
	);
	assert_rejected(&result, ErrorCode::InvalidLocksroot);

	let mut unlock = partner_unlock(&message, Keyring::Bob, secret);
	unlock.locked_amount = message.locked_amount;
	let result = transition(
		chain_state,
		ReceiveUnlock { sender: Keyring::Bob.address(), message: Keyring::Bob.sign(unlock) },
	);
	assert_rejected(&result, ErrorCode::InvalidLockedAmount);
}

#[test]
fn test_expired_sent_transfer_ignores_unlock() {
	let info = setup();
	let (secret, secrethash) = Generator::secret_and_hash();
	let init = init_transfer(&info, Keyring::Bob.address(), 10, secrethash);
	let chain_state = send_transfer(info.chain_state.clone(), &init);
	let sent = chain_state.transfers[&TransferKey::sent(secrethash)].clone();

	let chain_state = advance_to(chain_state, u64::from(sent.expiration) + 1);
	let expired =
		transfer::make_lock_expired(&chain_state, secrethash).expect("Expiry should be built");
	let chain_state = apply(
		chain_state,
		ActionLockExpiredSigned { secrethash, message: Keyring::Alice.sign(expired) },
	);

	let unlock = partner_unlock(&sent.transfer, Keyring::Alice, secret);
	let result = transition(chain_state.clone(), ActionUnlockSigned { secrethash, message: unlock });
	assert!(!result.changed);
	assert_eq!(result.new_state, chain_state);
	assert_eq!(
		result.new_state.transfers[&TransferKey::sent(secrethash)].status(),
		TransferStatus::Expiring
	);
}

#[test]
fn test_unlocked_received_transfer_rejects_lock_expiry() {
	let info = setup();
	let (secret, secrethash) = Generator::secret_and_hash();
	let message = partner_transfer(&info, Keyring::Bob, secrethash, 10, START_BLOCK + 100);
	let chain_state = apply(
		info.chain_state.clone(),
		ReceiveLockedTransfer { sender: Keyring::Bob.address(), message: message.clone() },
	);
	let unlock = partner_unlock(&message, Keyring::Bob, secret);
	let chain_state =
		apply(chain_state, ReceiveUnlock { sender: Keyring::Bob.address(), message: unlock });
	let chain_state = advance_to(chain_state, START_BLOCK + 101);

	let expired = Keyring::Bob.sign(LockExpired {
		message_identifier: 3,
		chain_id: message.chain_id,
		token_network_address: message.token_network_address,
		channel_identifier: message.channel_identifier,
		nonce: message.nonce + 2,
		transferred_amount: message.lock.amount,
		locked_amount: TokenAmount::zero(),
		locksroot: compute_locksroot(&[]),
		recipient: message.recipient,
		secrethash,
		signature: EMPTY_SIGNATURE.clone(),
	});
	let result = transition(
		chain_state,
		ReceiveLockExpired { sender: Keyring::Bob.address(), message: expired },
	);
	assert_rejected(&result, ErrorCode::TransferResolved);
	assert_eq!(
		result.new_state.transfers[&TransferKey::received(secrethash)].status(),
		TransferStatus::Unlocked
	);
}
