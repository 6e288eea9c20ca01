use raiden_light_messages::messages::{
	Delivered,
	Message,
	Processed,
};
use raiden_light_primitives::types::Address;

use crate::{
	config::TransportConfig,
	memory::MemoryNetwork,
	presence::Presence,
	Transport,
	TransportError,
};

#[tokio::test]
async fn test_messages_reach_the_recipient() {
	let network = MemoryNetwork::new();
	let alice = Address::repeat_byte(1);
	let bob = Address::repeat_byte(2);
	let (transport, _) = network.join(alice, 8);
	let (_, mut bob_inbox) = network.join(bob, 8);

	let message = Message::Processed(Processed::new(3));
	transport.send(bob, &message).await.expect("Bob is reachable");

	let incoming = bob_inbox.recv().await.expect("A message should arrive");
	assert_eq!(incoming.sender, alice);
	assert_eq!(incoming.message, message);
	assert_eq!(transport.sent_messages(), vec![(bob, message)]);
}

#[tokio::test]
async fn test_unreachable_peers_are_not_sent_to() {
	let network = MemoryNetwork::new();
	let alice = Address::repeat_byte(1);
	let bob = Address::repeat_byte(2);
	let (transport, _) = network.join(alice, 8);
	let message = Message::Delivered(Delivered::new(3));

	let result = transport.send(bob, &message).await;
	assert!(matches!(result, Err(TransportError::Unreachable(peer)) if peer == bob));

	let (_, _bob_inbox) = network.join(bob, 8);
	assert!(transport.is_available(&bob));
	network.set_available(bob, false);
	assert!(!transport.is_available(&bob));
	assert!(transport.send(bob, &message).await.is_err());
	assert!(transport.sent_messages().is_empty());

	network.leave(bob);
	network.set_available(bob, true);
	assert!(transport.send(bob, &message).await.is_err());
}

#[test]
fn test_presence() {
	let presence = Presence::new();
	let peer = Address::repeat_byte(7);
	assert!(!presence.is_available(&peer));

	presence.set_available(peer, true);
	assert!(presence.is_available(&peer));
	assert_eq!(presence.available_peers(), vec![peer]);

	presence.set_available(peer, false);
	assert!(presence.available_peers().is_empty());
}

#[test]
fn test_config_defaults() {
	let config: TransportConfig = serde_json::from_str(r#"{"retry_interval_ms": 100}"#)
		.expect("Config should parse");
	assert_eq!(config.retry_interval_ms, 100);
	assert_eq!(config.inbound_capacity, TransportConfig::default().inbound_capacity);
}
