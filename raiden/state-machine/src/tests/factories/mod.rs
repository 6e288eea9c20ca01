mod builder;
mod generator;
mod keyring;

pub use builder::*;
pub use generator::*;
pub use keyring::*;
use raiden_light_messages::messages::{
	Lock,
	LockedTransfer,
	Metadata,
	Unlock,
};
use raiden_light_primitives::{
	constants::EMPTY_SIGNATURE,
	types::{
		Address,
		BlockNumber,
		PaymentIdentifier,
		Secret,
		SecretHash,
		TokenAmount,
		U256,
	},
};

use crate::{
	errors::ErrorCode,
	machine::{
		chain::{
			self,
			Transition,
		},
		channel::utils::{
			compute_locked_amount,
			compute_locksroot,
		},
		transfer,
	},
	types::{
		ActionInitTransfer,
		ActionTransferSigned,
		Block,
		ChainState,
		HashTimeLockState,
		StateChange,
	},
};

pub fn transition(chain_state: ChainState, state_change: impl Into<StateChange>) -> Transition {
	chain::state_transition(chain_state, state_change.into())
}

/// Apply a state change which must be accepted.
pub fn apply(chain_state: ChainState, state_change: impl Into<StateChange>) -> ChainState {
	let result = transition(chain_state, state_change);
	assert!(result.changed, "State change should be applied, got {:?}", result.events);
	result.new_state
}

pub fn advance_to(chain_state: ChainState, block_number: u64) -> ChainState {
	apply(chain_state, Block { block_number: BlockNumber::from(block_number) })
}

/// Assert the transition was rejected with `code` and left the state untouched.
pub fn assert_rejected(result: &Transition, code: ErrorCode) {
	assert!(!result.changed);
	let (_, actual, reason) = result
		.events
		.iter()
		.find_map(|event| event.error())
		.expect("An error event should be emitted");
	assert_eq!(actual, code, "Unexpected rejection: {}", reason);
}

/// A first transfer from the partner of `info`'s channel to us, signed by `sender`.
pub fn partner_transfer(
	info: &ChainStateInfo,
	sender: Keyring,
	secrethash: SecretHash,
	amount: u64,
	expiration: u64,
) -> LockedTransfer {
	let channel = info.channel();
	let lock = Lock {
		amount: TokenAmount::from(amount),
		expiration: BlockNumber::from(expiration),
		secrethash,
	};
	let locks = vec![HashTimeLockState::from(&lock)];
	sender.sign(LockedTransfer {
		message_identifier: 1,
		payment_identifier: PaymentIdentifier::from(1u64),
		chain_id: channel.chain_id,
		token_network_address: info.token_network_address,
		channel_identifier: channel.channel_identifier.expect("Channel should be open"),
		nonce: U256::from(1u64),
		transferred_amount: TokenAmount::zero(),
		locked_amount: compute_locked_amount(&locks),
		locksroot: compute_locksroot(&locks),
		token: info.token_address,
		recipient: info.chain_state.our_address,
		target: info.chain_state.our_address,
		initiator: sender.address(),
		lock,
		metadata: Metadata::new(vec![vec![sender.address(), info.chain_state.our_address]]),
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// The partner's unlock of `transfer`, the first transfer it sent.
pub fn partner_unlock(transfer: &LockedTransfer, sender: Keyring, secret: Secret) -> Unlock {
	sender.sign(Unlock {
		message_identifier: 2,
		payment_identifier: transfer.payment_identifier,
		chain_id: transfer.chain_id,
		token_network_address: transfer.token_network_address,
		channel_identifier: transfer.channel_identifier,
		nonce: transfer.nonce + 1,
		transferred_amount: transfer.transferred_amount + transfer.lock.amount,
		locked_amount: TokenAmount::zero(),
		locksroot: compute_locksroot(&[]),
		secret,
		signature: EMPTY_SIGNATURE.clone(),
	})
}

/// A direct payment intent on the first channel of `info`, without a known secret.
pub fn init_transfer(
	info: &ChainStateInfo,
	target: Address,
	value: u64,
	secrethash: SecretHash,
) -> ActionInitTransfer {
	ActionInitTransfer {
		token_network_address: info.token_network_address,
		target,
		value: TokenAmount::from(value),
		fee: TokenAmount::zero(),
		payment_identifier: PaymentIdentifier::from(1u64),
		secrethash,
		secret: None,
		paths: vec![],
		lock_timeout: None,
	}
}

/// Build, sign and apply the locked transfer of `init`.
pub fn send_transfer(chain_state: ChainState, init: &ActionInitTransfer) -> ChainState {
	let (message, partner) =
		transfer::make_locked_transfer(&chain_state, init).expect("Transfer should be built");
	apply(
		chain_state,
		ActionTransferSigned { message: Keyring::Alice.sign(message), fee: init.fee, partner },
	)
}
