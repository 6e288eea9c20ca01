use std::sync::Arc;

use raiden_light_messages::messages::{
	Message,
	Processed,
};
use raiden_light_primitives::types::{
	Address,
	BlockNumber,
	BlockTimeout,
	ChainID,
	RevealTimeout,
	SettleTimeout,
	TokenAmount,
};
use raiden_light_state_machine::{
	errors::ErrorCode,
	types::{
		ActionChannelDeposit,
		Block,
		ChainState,
		ChannelKey,
		StateChange,
	},
};

use crate::{
	dispatcher::message_to_state_change,
	errors::EngineError,
	manager::{
		MemorySnapshotStorage,
		StateManager,
	},
	processes::Shutdown,
	transitioner::Transitioner,
};

fn block(block_number: u64) -> StateChange {
	Block { block_number: BlockNumber::from(block_number) }.into()
}

fn state_manager(storage: Arc<MemorySnapshotStorage>) -> StateManager {
	let initial = ChainState::new(
		ChainID::from(1337u64),
		Address::repeat_byte(1),
		BlockNumber::from(100u64),
		RevealTimeout::from(5u64),
		SettleTimeout::from(20u64),
		BlockTimeout::from(5u64),
	);
	StateManager::restore_or_init(storage, 0, initial).expect("State should init")
}

#[tokio::test]
async fn test_state_changes_are_reduced_in_order() {
	let storage = Arc::new(MemorySnapshotStorage::new());
	let (transitioner, dispatcher) = Transitioner::new(state_manager(storage.clone()), 16);
	let shutdown = Shutdown::new();
	let handle = tokio::spawn(transitioner.run(shutdown.subscribe()));
	let mut reduced = dispatcher.subscribe();

	let results = dispatcher
		.dispatch_all(vec![block(102), block(101), block(103)])
		.await
		.expect("Transitioner is running");
	assert_eq!(results.iter().map(|r| r.changed).collect::<Vec<_>>(), vec![true, false, true]);
	assert_eq!(results[1].state.block_number, BlockNumber::from(102u64));
	assert_eq!(dispatcher.state().block_number, BlockNumber::from(103u64));

	for expected in [102u64, 101, 103] {
		let notification = reduced.recv().await.expect("Notification should be published");
		assert_eq!(notification.state_change, block(expected));
	}

	shutdown.trigger();
	let manager = handle.await.expect("Transitioner should stop");
	assert_eq!(manager.current_state.block_number, BlockNumber::from(103u64));
	assert!(storage.snapshot().is_some());
	assert!(matches!(dispatcher.dispatch(block(104)).await, Err(EngineError::Stopped)));
}

#[tokio::test]
async fn test_rejection_is_reported_to_the_caller() {
	let storage = Arc::new(MemorySnapshotStorage::new());
	let (transitioner, dispatcher) = Transitioner::new(state_manager(storage), 16);
	let shutdown = Shutdown::new();
	tokio::spawn(transitioner.run(shutdown.subscribe()));

	let deposit = ActionChannelDeposit {
		channel: ChannelKey::new(Address::repeat_byte(9), Address::repeat_byte(2)),
		total_deposit: TokenAmount::from(10u64),
	};
	let reduced = dispatcher.dispatch_and_wait(deposit).await.expect("Transitioner is running");
	assert!(!reduced.changed);
	let (_, code, _) = reduced.rejection().expect("Deposit should be rejected");
	assert_eq!(code, ErrorCode::ChannelNotFound);
	assert!(matches!(
		reduced.accepted(),
		Err(EngineError::Rejected { code: ErrorCode::ChannelNotFound, .. })
	));
	shutdown.trigger();
}

#[test]
fn test_messages_map_to_receive_state_changes() {
	let sender = Address::repeat_byte(3);
	let processed = Processed::new(42);
	match message_to_state_change(sender, Message::Processed(processed.clone())) {
		StateChange::ReceiveProcessed(inner) => {
			assert_eq!(inner.sender, sender);
			assert_eq!(inner.message, processed);
		},
		other => panic!("Unexpected state change {:?}", other),
	}
}
