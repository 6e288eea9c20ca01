use std::collections::{
	HashMap,
	HashSet,
};

use raiden_light_messages::messages::Delivered;
use raiden_light_primitives::types::{
	Address,
	SecretHash,
	TokenAmount,
};
use raiden_light_state_machine::types::{
	TransferKey,
	WithdrawKey,
};
use raiden_light_transport::memory::MemoryNetwork;

use super::factories::{
	open_channel,
	open_channel_with,
	token_network_address,
	wait_until,
	MockChain,
	Node,
};
use crate::{
	engine::TransferRequest,
	processes::{
		ack::prune_delivered,
		withdraw::prune_withdraw_keys,
	},
};

#[tokio::test]
async fn test_delivered_receipts_follow_transfers() {
	let network = MemoryNetwork::new();
	let chain = MockChain::new();
	let alice = Node::start(b"ALICE", &network, &chain).await;
	let bob = Node::start(b"BOB", &network, &chain).await;
	open_channel(&alice, &bob, 500).await;

	let transfer = alice
		.engine
		.transfer(TransferRequest::new(token_network_address(), bob.address, 10u64.into()))
		.await
		.expect("Transfer should be signed");
	let secrethash = transfer.lock.secrethash;
	let state = wait_until(&bob.engine, |state| {
		state
			.transfers
			.get(&TransferKey::received(secrethash))
			.map(|t| t.unlock.is_some())
			.unwrap_or(false)
	})
	.await;

	let mut delivered = HashMap::new();
	delivered.insert(1, (secrethash, Delivered::new(1)));
	delivered.insert(2, (SecretHash::repeat_byte(3), Delivered::new(2)));
	prune_delivered(&mut delivered, &state);
	assert_eq!(delivered.keys().copied().collect::<Vec<_>>(), vec![1]);

	let mut cleared = (*state).clone();
	cleared.transfers.remove(&TransferKey::received(secrethash));
	prune_delivered(&mut delivered, &cleared);
	assert!(delivered.is_empty());
}

#[tokio::test]
async fn test_withdraw_keys_follow_pending_withdraws() {
	let network = MemoryNetwork::new();
	let chain = MockChain::new();
	let alice = Node::start(b"ALICE", &network, &chain).await;
	let _peer = network.join(Address::repeat_byte(7), 16);
	let channel = open_channel_with(&alice, Address::repeat_byte(7), 100).await;

	alice
		.engine
		.withdraw(channel, TokenAmount::from(30u64), None)
		.await
		.expect("Withdraw should be signed");
	let state = alice.engine.state();

	let pending = WithdrawKey { channel, total_withdraw: TokenAmount::from(30u64) };
	let unknown = WithdrawKey { channel, total_withdraw: TokenAmount::from(40u64) };
	let mut keys: HashSet<WithdrawKey> = [pending, unknown].into_iter().collect();
	prune_withdraw_keys(&mut keys, &state);
	assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec![pending]);

	let mut withdrawn = (*state).clone();
	withdrawn
		.channels
		.get_mut(&channel)
		.expect("Channel should exist")
		.our_state
		.withdraws_pending
		.clear();
	let mut keys: HashSet<WithdrawKey> = [pending].into_iter().collect();
	prune_withdraw_keys(&mut keys, &withdrawn);
	assert!(keys.is_empty());
}
