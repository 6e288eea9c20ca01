use serde::{
	Deserialize,
	Serialize,
};

/// Domain separator for data signed by channel participants.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MessageTypeId {
	BalanceProof = 1,
	BalanceProofUpdate = 2,
	Withdraw = 3,
	CooperativeSettle = 4,
}

impl From<MessageTypeId> for [u8; 1] {
	fn from(val: MessageTypeId) -> Self {
		(val as u8).to_be_bytes()
	}
}
