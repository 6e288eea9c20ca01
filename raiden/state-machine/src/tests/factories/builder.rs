use raiden_light_primitives::types::{
	Address,
	BlockNumber,
	ChainID,
	ChannelIdentifier,
	RevealTimeout,
	SettleTimeout,
	TokenAmount,
	U64,
};

use super::Keyring;
use crate::{
	constants::{
		DEFAULT_REVEAL_TIMEOUT,
		DEFAULT_SETTLE_TIMEOUT,
	},
	machine::chain,
	types::{
		ChainState,
		ChannelKey,
		ChannelState,
		ContractReceiveChannelDeposit,
		ContractReceiveChannelOpened,
	},
};

pub const START_BLOCK: u64 = 100;

pub struct ChainStateInfo {
	pub chain_state: ChainState,
	pub token_network_address: Address,
	pub token_address: Address,
	pub channel_keys: Vec<ChannelKey>,
}

impl ChainStateInfo {
	/// Key of the first channel opened by the builder.
	pub fn channel_key(&self) -> ChannelKey {
		self.channel_keys[0]
	}

	pub fn channel(&self) -> &ChannelState {
		self.chain_state.channels.get(&self.channel_key()).expect("Channel should exist")
	}
}

pub struct ChainStateBuilder {
	chain_state: ChainState,
	token_network_address: Address,
	token_address: Address,
	channel_keys: Vec<ChannelKey>,
}

impl ChainStateBuilder {
	pub fn new() -> Self {
		Self {
			chain_state: ChainState::new(
				ChainID::Goerli,
				Keyring::Alice.address(),
				BlockNumber::from(START_BLOCK),
				RevealTimeout::from(DEFAULT_REVEAL_TIMEOUT),
				SettleTimeout::from(DEFAULT_SETTLE_TIMEOUT),
				U64::from(DEFAULT_REVEAL_TIMEOUT),
			),
			token_network_address: Address::random(),
			token_address: Address::random(),
			channel_keys: vec![],
		}
	}

	/// Open a channel with `partner` and deposit on both sides.
	pub fn with_channel(mut self, partner: Keyring, our_deposit: u64, partner_deposit: u64) -> Self {
		let channel_identifier = ChannelIdentifier::from(self.channel_keys.len() as u64 + 1);
		let state_change = ContractReceiveChannelOpened {
			token_network_address: self.token_network_address,
			token_address: self.token_address,
			partner: partner.address(),
			channel_identifier,
			settle_timeout: SettleTimeout::from(DEFAULT_SETTLE_TIMEOUT),
			block_number: self.chain_state.block_number,
		};
		let key = state_change.channel_key();
		let result = chain::state_transition(self.chain_state, state_change.into());
		assert!(result.changed, "Channel creation should work");
		let mut chain_state = result.new_state;

		for (participant, deposit) in
			[(chain_state.our_address, our_deposit), (partner.address(), partner_deposit)]
		{
			if deposit == 0 {
				continue
			}
			let deposit = ContractReceiveChannelDeposit {
				channel: key,
				participant,
				total_deposit: TokenAmount::from(deposit),
				block_number: chain_state.block_number,
			};
			let result = chain::state_transition(chain_state, deposit.into());
			assert!(result.changed, "Deposit should work");
			chain_state = result.new_state;
		}

		self.chain_state = chain_state;
		self.channel_keys.push(key);
		self
	}

	pub fn build(self) -> ChainStateInfo {
		ChainStateInfo {
			chain_state: self.chain_state,
			token_network_address: self.token_network_address,
			token_address: self.token_address,
			channel_keys: self.channel_keys,
		}
	}
}
