use raiden_light_messages::messages::{
	Message,
	Processed,
	WithdrawConfirmation,
	WithdrawExpired,
	WithdrawRequest,
};
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	types::{
		BlockExpiration,
		Nonce,
		TokenAmount,
	},
};

use crate::{
	errors::ErrorCode,
	machine::withdraw,
	tests::factories::{
		advance_to,
		apply,
		assert_rejected,
		transition,
		ChainStateBuilder,
		ChainStateInfo,
		Keyring,
		START_BLOCK,
	},
	types::{
		ActionProcessedSigned,
		ActionWithdrawConfirmationSigned,
		ActionWithdrawExpiredSigned,
		ActionWithdrawFailed,
		ActionWithdrawRequest,
		ActionWithdrawRequestSigned,
		ChainState,
		ReceiveProcessed,
		ReceiveWithdrawConfirmation,
		ReceiveWithdrawExpired,
		ReceiveWithdrawRequest,
		StateChange,
	},
	views,
};

fn setup() -> ChainStateInfo {
	ChainStateBuilder::new().with_channel(Keyring::Bob, 100, 50).build()
}

fn withdraw_request(total_withdraw: u64, expiration: Option<u64>, info: &ChainStateInfo) -> ActionWithdrawRequest {
	ActionWithdrawRequest {
		channel: info.channel_key(),
		total_withdraw: TokenAmount::from(total_withdraw),
		expiration: expiration.map(BlockExpiration::from),
	}
}

/// Request, sign and apply our withdraw of `total_withdraw`.
fn request_withdraw(info: &ChainStateInfo, total_withdraw: u64) -> ChainState {
	let action = withdraw_request(total_withdraw, None, info);
	let message =
		withdraw::make_withdraw_request(&info.chain_state, &action).expect("Request should be built");
	apply(
		info.chain_state.clone(),
		ActionWithdrawRequestSigned { channel: info.channel_key(), message: Keyring::Alice.sign(message) },
	)
}

/// A withdraw request from the partner, with its first nonce.
fn partner_request(info: &ChainStateInfo, total_withdraw: u64, expiration: u64) -> WithdrawRequest {
	let channel = info.channel();
	Keyring::Bob.sign(WithdrawRequest {
		message_identifier: 11,
		chain_id: channel.chain_id,
		token_network_address: info.token_network_address,
		channel_identifier: channel.channel_identifier.expect("Channel should be open"),
		participant: Keyring::Bob.address(),
		total_withdraw: TokenAmount::from(total_withdraw),
		nonce: Nonce::from(1u64),
		expiration: BlockExpiration::from(expiration),
		signature: EMPTY_SIGNATURE.clone(),
	})
}

#[test]
fn test_withdraw_request_validation() {
	let info = setup();

	let result = transition(info.chain_state.clone(), withdraw_request(30, None, &info));
	assert!(!result.changed);
	assert!(result.events.is_empty());

	let result = transition(info.chain_state.clone(), withdraw_request(101, None, &info));
	assert_rejected(&result, ErrorCode::InsufficientWithdrawable);

	let result = transition(info.chain_state.clone(), withdraw_request(0, None, &info));
	assert_rejected(&result, ErrorCode::InvalidWithdraw);

	let result = transition(info.chain_state.clone(), withdraw_request(30, Some(START_BLOCK + 20), &info));
	assert_rejected(&result, ErrorCode::InvalidExpiration);
}

#[test]
fn test_our_withdraw_is_confirmed() {
	let info = setup();
	let key = info.channel_key();
	let chain_state = request_withdraw(&info, 30);

	let channel = &chain_state.channels[&key];
	let pending = &channel.our_state.withdraws_pending[&TokenAmount::from(30u64)];
	assert_eq!(pending.expiration, BlockExpiration::from(START_BLOCK + 100));
	assert_eq!(pending.nonce, Nonce::from(1u64));
	assert_eq!(channel.our_state.nonce, Nonce::from(1u64));
	assert_eq!(views::channel_capacity(channel), TokenAmount::from(70u64));

	let outbound = views::pending_outbound_messages(&chain_state);
	assert_eq!(outbound.len(), 1);
	assert_eq!(outbound[0].recipient, Keyring::Bob.address());
	assert!(matches!(&outbound[0].message, Message::WithdrawRequest(m) if m.total_withdraw == TokenAmount::from(30u64)));

	let request = pending.request.clone();
	let confirmation = Keyring::Bob.sign(WithdrawConfirmation {
		message_identifier: 12,
		chain_id: request.chain_id,
		token_network_address: request.token_network_address,
		channel_identifier: request.channel_identifier,
		participant: request.participant,
		total_withdraw: request.total_withdraw,
		nonce: Nonce::from(1u64),
		expiration: request.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	});
	let state_change: StateChange =
		ReceiveWithdrawConfirmation { sender: Keyring::Bob.address(), message: confirmation }.into();
	let chain_state = apply(chain_state, state_change.clone());
	assert_eq!(
		views::acknowledgeable_message(&chain_state, &state_change),
		Some((Keyring::Bob.address(), 12))
	);
	assert!(views::pending_outbound_messages(&chain_state).is_empty());

	let result = transition(chain_state, state_change);
	assert!(!result.changed);
}

#[test]
fn test_partner_withdraw_is_confirmed_until_processed() {
	let info = setup();
	let key = info.channel_key();
	let request = partner_request(&info, 20, START_BLOCK + 50);

	let state_change: StateChange =
		ReceiveWithdrawRequest { sender: Keyring::Bob.address(), message: request }.into();
	let chain_state = apply(info.chain_state.clone(), state_change.clone());
	assert_eq!(views::acknowledgeable_message(&chain_state, &state_change), None);
	assert_eq!(views::partner_capacity(&chain_state.channels[&key]), TokenAmount::from(30u64));

	let confirmation = withdraw::make_withdraw_confirmation(&chain_state, &key, TokenAmount::from(20u64))
		.expect("Confirmation should be built");
	assert_eq!(confirmation.participant, Keyring::Bob.address());
	assert_eq!(confirmation.nonce, Nonce::from(1u64));
	assert_eq!(confirmation.expiration, BlockExpiration::from(START_BLOCK + 50));
	let confirmation_identifier = confirmation.message_identifier;

	let chain_state = apply(
		chain_state,
		ActionWithdrawConfirmationSigned { channel: key, message: Keyring::Alice.sign(confirmation) },
	);
	let outbound = views::pending_outbound_messages(&chain_state);
	assert_eq!(outbound.len(), 1);
	assert!(matches!(&outbound[0].message, Message::WithdrawConfirmation(_)));

	let processed = Keyring::Bob.sign(Processed::new(confirmation_identifier));
	let chain_state = apply(
		chain_state,
		ReceiveProcessed { sender: Keyring::Bob.address(), message: processed },
	);
	assert!(views::pending_outbound_messages(&chain_state).is_empty());
}

#[test]
fn test_partner_withdraw_validation() {
	let info = setup();

	let request = partner_request(&info, 60, START_BLOCK + 50);
	let result = transition(
		info.chain_state.clone(),
		ReceiveWithdrawRequest { sender: Keyring::Bob.address(), message: request },
	);
	assert_rejected(&result, ErrorCode::InsufficientWithdrawable);

	let request = partner_request(&info, 20, START_BLOCK);
	let result = transition(
		info.chain_state.clone(),
		ReceiveWithdrawRequest { sender: Keyring::Bob.address(), message: request },
	);
	assert_rejected(&result, ErrorCode::InvalidExpiration);

	let mut request = partner_request(&info, 20, START_BLOCK + 50);
	request.nonce = Nonce::from(3u64);
	let result = transition(
		info.chain_state.clone(),
		ReceiveWithdrawRequest { sender: Keyring::Bob.address(), message: Keyring::Bob.sign(request) },
	);
	assert_rejected(&result, ErrorCode::InvalidNonce);

	let request = partner_request(&info, 20, START_BLOCK + 50);
	let result = transition(
		info.chain_state,
		ReceiveWithdrawRequest { sender: Keyring::Charlie.address(), message: request },
	);
	assert_rejected(&result, ErrorCode::ChannelNotFound);
}

#[test]
fn test_our_withdraw_expires() {
	let info = setup();
	let key = info.channel_key();
	let total_withdraw = TokenAmount::from(30u64);
	let chain_state = request_withdraw(&info, 30);

	assert!(withdraw::make_withdraw_expired(&chain_state, &key, total_withdraw).is_err());
	assert!(views::expirable_withdraws(&chain_state).is_empty());

	let chain_state = advance_to(chain_state, START_BLOCK + 101);
	assert_eq!(views::expirable_withdraws(&chain_state).len(), 1);

	let expired = withdraw::make_withdraw_expired(&chain_state, &key, total_withdraw)
		.expect("Expiry should be built");
	assert_eq!(expired.nonce, Nonce::from(2u64));
	let expired_identifier = expired.message_identifier;
	let chain_state = apply(
		chain_state,
		ActionWithdrawExpiredSigned { channel: key, message: Keyring::Alice.sign(expired) },
	);
	let channel = &chain_state.channels[&key];
	assert!(channel.our_state.withdraws_pending.is_empty());
	assert_eq!(channel.our_state.withdraws_expired.len(), 1);
	assert_eq!(views::channel_capacity(channel), TokenAmount::from(100u64));

	let outbound = views::pending_outbound_messages(&chain_state);
	assert_eq!(outbound.len(), 1);
	assert!(matches!(&outbound[0].message, Message::WithdrawExpired(_)));

	let processed = Keyring::Bob.sign(Processed::new(expired_identifier));
	let chain_state = apply(
		chain_state,
		ReceiveProcessed { sender: Keyring::Bob.address(), message: processed },
	);
	assert!(views::pending_outbound_messages(&chain_state).is_empty());
}

#[test]
fn test_partner_withdraw_expires() {
	let info = setup();
	let key = info.channel_key();
	let request = partner_request(&info, 20, START_BLOCK + 50);
	let chain_state = apply(
		info.chain_state.clone(),
		ReceiveWithdrawRequest { sender: Keyring::Bob.address(), message: request.clone() },
	);

	let expired = Keyring::Bob.sign(WithdrawExpired {
		message_identifier: 13,
		chain_id: request.chain_id,
		token_network_address: request.token_network_address,
		channel_identifier: request.channel_identifier,
		participant: request.participant,
		total_withdraw: request.total_withdraw,
		nonce: Nonce::from(2u64),
		expiration: request.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	});
	let state_change: StateChange =
		ReceiveWithdrawExpired { sender: Keyring::Bob.address(), message: expired }.into();

	let result = transition(chain_state.clone(), state_change.clone());
	assert_rejected(&result, ErrorCode::InvalidExpiration);

	let chain_state = advance_to(chain_state, START_BLOCK + 51);
	let chain_state = apply(chain_state, state_change.clone());
	let channel = &chain_state.channels[&key];
	assert!(channel.partner_state.withdraws_pending.is_empty());
	assert_eq!(channel.partner_state.withdraws_expired.len(), 1);
	assert_eq!(views::partner_capacity(channel), TokenAmount::from(50u64));
	assert_eq!(
		views::acknowledgeable_message(&chain_state, &state_change),
		Some((Keyring::Bob.address(), 13))
	);

	let result = transition(chain_state, state_change);
	assert!(!result.changed);
	assert!(result.events.is_empty());
}

#[test]
fn test_failed_withdraw_stops_retries() {
	let info = setup();
	let key = info.channel_key();
	let chain_state = request_withdraw(&info, 30);
	let failed = ActionWithdrawFailed {
		channel: key,
		total_withdraw: TokenAmount::from(30u64),
		reason: "reverted".to_owned(),
	};

	let result = transition(chain_state, failed.clone());
	assert!(result.changed);
	let (_, code, reason) = result.events[0].error().expect("Failure should be reported");
	assert_eq!(code, ErrorCode::TransactionFailed);
	assert_eq!(reason, "reverted");
	assert!(views::pending_outbound_messages(&result.new_state).is_empty());

	let result = transition(result.new_state, failed);
	assert!(!result.changed);
	assert_eq!(result.events.len(), 1);

	let result = transition(
		result.new_state,
		ActionWithdrawFailed {
			channel: key,
			total_withdraw: TokenAmount::from(40u64),
			reason: "reverted".to_owned(),
		},
	);
	assert_rejected(&result, ErrorCode::WithdrawNotFound);
}

#[test]
fn test_acknowledged_expired_withdraws_are_forgotten() {
	let info = setup();
	let key = info.channel_key();
	let total_withdraw = TokenAmount::from(30u64);
	let chain_state = advance_to(request_withdraw(&info, 30), START_BLOCK + 101);
	let expired = withdraw::make_withdraw_expired(&chain_state, &key, total_withdraw)
		.expect("Expiry should be built");
	let expired_identifier = expired.message_identifier;
	let chain_state = apply(
		chain_state,
		ActionWithdrawExpiredSigned { channel: key, message: Keyring::Alice.sign(expired) },
	);

	// Unacknowledged, the expiry is kept for retries.
	let chain_state = advance_to(chain_state, START_BLOCK + 102);
	assert_eq!(chain_state.channels[&key].our_state.withdraws_expired.len(), 1);

	let processed = Keyring::Bob.sign(Processed::new(expired_identifier));
	let chain_state = apply(
		chain_state,
		ReceiveProcessed { sender: Keyring::Bob.address(), message: processed },
	);
	let chain_state = advance_to(chain_state, START_BLOCK + 103);
	assert!(chain_state.channels[&key].our_state.withdraws_expired.is_empty());
}

#[test]
fn test_partner_expired_withdraws_are_forgotten_after_reveal_timeout() {
	let info = setup();
	let key = info.channel_key();
	let reveal_timeout = u64::from(info.channel().reveal_timeout);
	let request = partner_request(&info, 20, START_BLOCK + 50);
	let chain_state = apply(
		info.chain_state.clone(),
		ReceiveWithdrawRequest { sender: Keyring::Bob.address(), message: request.clone() },
	);
	let expired = Keyring::Bob.sign(WithdrawExpired {
		message_identifier: 13,
		chain_id: request.chain_id,
		token_network_address: request.token_network_address,
		channel_identifier: request.channel_identifier,
		participant: request.participant,
		total_withdraw: request.total_withdraw,
		nonce: Nonce::from(2u64),
		expiration: request.expiration,
		signature: EMPTY_SIGNATURE.clone(),
	});
	let chain_state = advance_to(chain_state, START_BLOCK + 51);
	let chain_state =
		apply(chain_state, ReceiveWithdrawExpired { sender: Keyring::Bob.address(), message: expired });
	let chain_state = apply(
		chain_state,
		ActionProcessedSigned {
			recipient: Keyring::Bob.address(),
			message: Keyring::Alice.sign(Processed::new(13)),
		},
	);
	assert!(chain_state.processed.contains_key(&13));

	let chain_state = advance_to(chain_state, START_BLOCK + 50 + reveal_timeout);
	assert_eq!(chain_state.channels[&key].partner_state.withdraws_expired.len(), 1);
	assert!(chain_state.processed.contains_key(&13));

	let chain_state = advance_to(chain_state, START_BLOCK + 51 + reveal_timeout);
	assert!(chain_state.channels[&key].partner_state.withdraws_expired.is_empty());
	assert!(chain_state.processed.is_empty());
}
