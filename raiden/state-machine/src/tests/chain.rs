use raiden_light_messages::messages::SecretReveal;
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	types::{
		Address,
		BlockNumber,
		ChannelIdentifier,
	},
};

use crate::{
	errors::{
		ErrorCategory,
		ErrorCode,
	},
	tests::factories::{
		assert_rejected,
		transition,
		ChainStateBuilder,
		Generator,
		Keyring,
		START_BLOCK,
	},
	types::{
		ActionChannelClose,
		Block,
		ChannelKey,
		ContractReceiveChannelClosed,
		Event,
		Meta,
		ReceiveSecretReveal,
		Snapshot,
	},
};

#[test]
fn chain_state_new_block() {
	let chain_state = ChainStateBuilder::new().build().chain_state;

	let result = transition(chain_state, Block { block_number: BlockNumber::from(START_BLOCK + 1) });
	assert!(result.changed);
	assert_eq!(result.new_state.block_number, BlockNumber::from(START_BLOCK + 1));
	assert_eq!(result.new_state.version, 1);

	let result =
		transition(result.new_state, Block { block_number: BlockNumber::from(START_BLOCK + 2) });
	assert_eq!(result.new_state.block_number, BlockNumber::from(START_BLOCK + 2));
	assert_eq!(result.new_state.version, 2);
}

#[test]
fn chain_state_ignores_old_block() {
	let chain_state = ChainStateBuilder::new().build().chain_state;

	let result = transition(chain_state.clone(), Block { block_number: BlockNumber::from(1u64) });
	assert!(!result.changed);
	assert!(result.events.is_empty());
	assert_eq!(result.new_state, chain_state);
}

#[test]
fn rejected_received_message_reports_its_identifier() {
	let chain_state = ChainStateBuilder::new().build().chain_state;
	let (secret, _) = Generator::secret_and_hash();
	let reveal = Keyring::Charlie.sign(SecretReveal {
		message_identifier: 42,
		secret,
		signature: EMPTY_SIGNATURE.clone(),
	});

	let result = transition(
		chain_state.clone(),
		ReceiveSecretReveal { sender: Keyring::Bob.address(), message: reveal },
	);
	assert_rejected(&result, ErrorCode::InvalidSignature);
	assert_eq!(result.new_state, chain_state);
	match &result.events[0] {
		Event::ErrorInvalidReceivedMessage(error) => {
			assert_eq!(error.message_identifier, Some(42));
			assert_eq!(error.meta, Meta::Message(42));
		},
		event => panic!("Unexpected event {:?}", event),
	}
}

#[test]
fn rejected_action_reports_invalid_action() {
	let chain_state = ChainStateBuilder::new().build().chain_state;
	let channel = ChannelKey::new(Address::random(), Keyring::Bob.address());

	let result = transition(chain_state, ActionChannelClose { channel });
	assert_rejected(&result, ErrorCode::ChannelNotFound);
	assert!(matches!(
		&result.events[0],
		Event::ErrorInvalidAction(error) if error.meta == Meta::Channel(channel)
	));
}

#[test]
fn error_codes_are_categorized() {
	assert_eq!(ErrorCode::InvalidSignature.category(), ErrorCategory::InvalidParameter);
	assert_eq!(ErrorCode::InsufficientCapacity.category(), ErrorCategory::InsufficientFunds);
	assert_eq!(ErrorCode::TransferConflict.category(), ErrorCategory::ConflictingState);
	assert_eq!(ErrorCode::NoRoute.category(), ErrorCategory::NotFound);
	assert_eq!(ErrorCode::TransactionFailed.category(), ErrorCategory::Transient);
}

#[test]
fn rejected_contract_event_is_silent() {
	let chain_state = ChainStateBuilder::new().build().chain_state;
	let channel = ChannelKey::new(Address::random(), Keyring::Bob.address());

	let result = transition(
		chain_state.clone(),
		ContractReceiveChannelClosed {
			channel,
			channel_identifier: ChannelIdentifier::from(1u64),
			closing_participant: Keyring::Bob.address(),
			block_number: BlockNumber::from(START_BLOCK),
		},
	);
	assert!(!result.changed);
	assert!(result.events.is_empty());
	assert_eq!(result.new_state, chain_state);
}

#[test]
fn snapshot_restores_state() {
	let info = ChainStateBuilder::new().with_channel(Keyring::Bob, 100, 50).build();

	let json = Snapshot::new(info.chain_state.clone()).to_json().expect("Snapshot should serialize");
	let restored = Snapshot::from_json(&json).expect("Snapshot should parse");
	assert_eq!(restored.state, info.chain_state);
}

#[test]
fn snapshot_rejects_unknown_version() {
	let chain_state = ChainStateBuilder::new().build().chain_state;
	let mut snapshot = Snapshot::new(chain_state);
	snapshot.version += 1;

	let json = serde_json::to_string(&snapshot).expect("Snapshot should serialize");
	assert!(Snapshot::from_json(&json).is_err());
}
