#![warn(clippy::missing_docs_in_private_items)]

use std::{
	cmp::max,
	collections::BTreeMap,
	fmt,
	str::FromStr,
};

use derive_more::Display;
use raiden_light_messages::messages::{
	BalanceProofMessage,
	Lock,
	LockExpired,
	LockedTransfer,
	Processed,
	RefundTransfer,
	SecretRequest,
	SecretReveal,
	SignedMessage,
	Unlock,
	WithdrawConfirmation,
	WithdrawExpired,
	WithdrawRequest,
};
use raiden_light_primitives::{
	hashing::hash_pending_locks,
	types::{
		Address,
		BalanceHash,
		BlockExpiration,
		BlockNumber,
		BlockTimeout,
		Bytes,
		CanonicalIdentifier,
		ChainID,
		ChannelIdentifier,
		EncodedLock,
		LockedAmount,
		Locksroot,
		MessageHash,
		MessageIdentifier,
		Nonce,
		RevealTimeout,
		Secret,
		SecretHash,
		SettleTimeout,
		Signature,
		TokenAddress,
		TokenAmount,
		TokenNetworkAddress,
	},
};
use serde::{
	de::Error,
	Deserialize,
	Deserializer,
	Serialize,
	Serializer,
};

use crate::{
	constants::SNAPSHOT_VERSION,
	errors::StateTransitionError,
};

/// Parse an address with or without the `0x` prefix.
fn parse_address(s: &str) -> Result<Address, String> {
	Address::from_str(s.trim_start_matches("0x")).map_err(|e| format!("Invalid address {}: {:?}", s, e))
}

/// Serialize a key through its `Display` form so it can be used as a JSON map key.
macro_rules! string_key {
	($key:ty) => {
		impl Serialize for $key {
			fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.collect_str(self)
			}
		}

		impl<'de> Deserialize<'de> for $key {
			fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
				let s = String::deserialize(deserializer)?;
				<$key>::from_str(&s).map_err(D::Error::custom)
			}
		}
	};
}

/// Identity of a channel. There is at most one live channel per token network and partner.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChannelKey {
	pub token_network_address: TokenNetworkAddress,
	pub partner: Address,
}

impl ChannelKey {
	pub fn new(token_network_address: TokenNetworkAddress, partner: Address) -> Self {
		Self { token_network_address, partner }
	}
}

impl fmt::Display for ChannelKey {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:#x}@{:#x}", self.token_network_address, self.partner)
	}
}

impl FromStr for ChannelKey {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (token_network_address, partner) =
			s.split_once('@').ok_or_else(|| format!("Invalid channel key {}", s))?;
		Ok(Self {
			token_network_address: parse_address(token_network_address)?,
			partner: parse_address(partner)?,
		})
	}
}

string_key!(ChannelKey);

/// Whether we are the payer or the payee of a transfer.
#[derive(Copy, Clone, Display, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum TransferDirection {
	#[display(fmt = "sent")]
	Sent,
	#[display(fmt = "received")]
	Received,
}

/// Identity of a transfer record.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TransferKey {
	pub direction: TransferDirection,
	pub secrethash: SecretHash,
}

impl TransferKey {
	pub fn sent(secrethash: SecretHash) -> Self {
		Self { direction: TransferDirection::Sent, secrethash }
	}

	pub fn received(secrethash: SecretHash) -> Self {
		Self { direction: TransferDirection::Received, secrethash }
	}
}

impl fmt::Display for TransferKey {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}:{:#x}", self.direction, self.secrethash)
	}
}

impl FromStr for TransferKey {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (direction, secrethash) =
			s.split_once(':').ok_or_else(|| format!("Invalid transfer key {}", s))?;
		let direction = match direction {
			"sent" => TransferDirection::Sent,
			"received" => TransferDirection::Received,
			other => return Err(format!("Invalid transfer direction {}", other)),
		};
		let secrethash = SecretHash::from_str(secrethash.trim_start_matches("0x"))
			.map_err(|e| format!("Invalid secrethash {}: {:?}", secrethash, e))?;
		Ok(Self { direction, secrethash })
	}
}

string_key!(TransferKey);

/// Identity of a withdraw within a channel.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WithdrawKey {
	pub channel: ChannelKey,
	pub total_withdraw: TokenAmount,
}

/// The routing key of a state change or event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Meta {
	Chain,
	Channel(ChannelKey),
	Transfer(TransferKey),
	Withdraw(WithdrawKey),
	Message(MessageIdentifier),
}

impl fmt::Display for Meta {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Meta::Chain => write!(f, "chain"),
			Meta::Channel(key) => write!(f, "channel:{}", key),
			Meta::Transfer(key) => write!(f, "transfer:{}", key),
			Meta::Withdraw(key) => write!(f, "withdraw:{}/{}", key.channel, key.total_withdraw),
			Meta::Message(id) => write!(f, "message:{}", id),
		}
	}
}

/// Lifecycle of a channel. Settled channels are removed from the state.
#[derive(Copy, Clone, Display, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ChannelStatus {
	Opening,
	Open,
	Closing,
	Closed,
	Settleable,
	Settling,
}

/// A secret known to this node and when it was registered on-chain, if it was.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SecretState {
	pub secret: Secret,
	pub registered_block: Option<BlockNumber>,
}

/// The root of the state tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChainState {
	pub chain_id: ChainID,
	pub our_address: Address,
	pub block_number: BlockNumber,
	pub reveal_timeout: RevealTimeout,
	pub settle_timeout: SettleTimeout,
	/// Minimum number of blocks a withdraw request must stay valid for.
	pub withdraw_margin: BlockTimeout,
	pub channels: BTreeMap<ChannelKey, ChannelState>,
	pub transfers: BTreeMap<TransferKey, TransferState>,
	pub secrets: BTreeMap<SecretHash, SecretState>,
	/// Processed replies we signed, keyed by the identifier of the acknowledged message.
	pub processed: BTreeMap<MessageIdentifier, Processed>,
	/// Incremented by every state change which modified the state.
	pub version: u64,
}

impl ChainState {
	pub fn new(
		chain_id: ChainID,
		our_address: Address,
		block_number: BlockNumber,
		reveal_timeout: RevealTimeout,
		settle_timeout: SettleTimeout,
		withdraw_margin: BlockTimeout,
	) -> Self {
		Self {
			chain_id,
			our_address,
			block_number,
			reveal_timeout,
			settle_timeout,
			withdraw_margin,
			channels: BTreeMap::new(),
			transfers: BTreeMap::new(),
			secrets: BTreeMap::new(),
			processed: BTreeMap::new(),
			version: 0,
		}
	}

	pub fn secret(&self, secrethash: &SecretHash) -> Option<&Secret> {
		self.secrets.get(secrethash).map(|s| &s.secret)
	}
}

/// A persisted copy of the state tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	pub version: u32,
	pub state: ChainState,
}

impl Snapshot {
	pub fn new(state: ChainState) -> Self {
		Self { version: SNAPSHOT_VERSION, state }
	}

	pub fn to_json(&self) -> Result<String, StateTransitionError> {
		serde_json::to_string(self)
			.map_err(|e| format!("Could not serialize snapshot: {}", e).into())
	}

	pub fn from_json(data: &str) -> Result<Self, StateTransitionError> {
		let snapshot: Snapshot = serde_json::from_str(data)
			.map_err(|e| StateTransitionError::from(format!("Could not parse snapshot: {}", e)))?;
		if snapshot.version != SNAPSHOT_VERSION {
			return Err(format!(
				"Unsupported snapshot version {}, expected {}",
				snapshot.version, SNAPSHOT_VERSION
			)
			.into())
		}
		Ok(snapshot)
	}
}

/// A payment channel with one partner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
	/// Absent until the channel is confirmed open on-chain.
	pub channel_identifier: Option<ChannelIdentifier>,
	pub chain_id: ChainID,
	pub token_network_address: TokenNetworkAddress,
	pub token_address: TokenAddress,
	pub status: ChannelStatus,
	pub settle_timeout: SettleTimeout,
	pub reveal_timeout: RevealTimeout,
	pub open_block: Option<BlockNumber>,
	pub close_block: Option<BlockNumber>,
	pub our_state: ChannelEndState,
	pub partner_state: ChannelEndState,
}

impl ChannelState {
	pub fn key(&self) -> ChannelKey {
		ChannelKey::new(self.token_network_address, self.partner_state.address)
	}

	pub fn canonical_identifier(&self) -> Option<CanonicalIdentifier> {
		self.channel_identifier.map(|channel_identifier| CanonicalIdentifier {
			chain_identifier: self.chain_id,
			token_network_address: self.token_network_address,
			channel_identifier,
		})
	}

	/// The first block at which the channel can be settled, once closed.
	pub fn settleable_at(&self) -> Option<BlockNumber> {
		self.close_block.map(|block| block + self.settle_timeout)
	}
}

/// One participant's side of a channel.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChannelEndState {
	pub address: Address,
	pub contract_balance: TokenAmount,
	pub onchain_total_withdraw: TokenAmount,
	pub withdraws_pending: BTreeMap<TokenAmount, PendingWithdrawState>,
	pub withdraws_expired: Vec<ExpiredWithdrawState>,
	/// Pending locks in insertion order, which is also the locksroot order.
	pub pending_locks: Vec<HashTimeLockState>,
	pub balance_proof: Option<BalanceProofState>,
	/// Nonce of the latest message this participant signed on the channel.
	pub nonce: Nonce,
}

impl ChannelEndState {
	pub fn new(address: Address) -> Self {
		Self {
			address,
			contract_balance: TokenAmount::zero(),
			onchain_total_withdraw: TokenAmount::zero(),
			withdraws_pending: BTreeMap::new(),
			withdraws_expired: vec![],
			pending_locks: vec![],
			balance_proof: None,
			nonce: Nonce::zero(),
		}
	}

	pub fn next_nonce(&self) -> Nonce {
		self.nonce + 1
	}

	pub fn offchain_total_withdraw(&self) -> TokenAmount {
		self.withdraws_pending.keys().max().copied().unwrap_or_default()
	}

	pub fn total_withdraw(&self) -> TokenAmount {
		max(self.offchain_total_withdraw(), self.onchain_total_withdraw)
	}

	pub fn transferred_amount(&self) -> TokenAmount {
		self.balance_proof.as_ref().map(|bp| bp.transferred_amount).unwrap_or_default()
	}

	pub fn locked_amount(&self) -> LockedAmount {
		self.pending_locks.iter().fold(LockedAmount::zero(), |acc, lock| acc + lock.amount)
	}

	pub fn locksroot(&self) -> Locksroot {
		let encoded: Vec<EncodedLock> = self.pending_locks.iter().map(|l| l.encoded.clone()).collect();
		hash_pending_locks(&encoded)
	}

	pub fn lock(&self, secrethash: &SecretHash) -> Option<&HashTimeLockState> {
		self.pending_locks.iter().find(|lock| lock.secrethash == *secrethash)
	}
}

/// The latest balance proof a participant signed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BalanceProofState {
	pub nonce: Nonce,
	pub transferred_amount: TokenAmount,
	pub locked_amount: LockedAmount,
	pub locksroot: Locksroot,
	pub canonical_identifier: CanonicalIdentifier,
	pub balance_hash: BalanceHash,
	pub message_hash: MessageHash,
	pub signature: Signature,
	pub sender: Address,
}

impl BalanceProofState {
	pub fn from_message<M: BalanceProofMessage>(message: &M, sender: Address) -> Self {
		Self {
			nonce: message.nonce(),
			transferred_amount: message.transferred_amount(),
			locked_amount: message.locked_amount(),
			locksroot: message.locksroot(),
			canonical_identifier: message.canonical_identifier(),
			balance_hash: message.balance_hash(),
			message_hash: message.message_hash(),
			signature: message.signature().clone(),
			sender,
		}
	}
}

/// A lock that is pending on a channel end.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HashTimeLockState {
	pub amount: TokenAmount,
	pub expiration: BlockExpiration,
	pub secrethash: SecretHash,
	pub encoded: EncodedLock,
}

impl HashTimeLockState {
	pub fn create(
		amount: TokenAmount,
		expiration: BlockExpiration,
		secrethash: SecretHash,
	) -> Self {
		let lock = Lock { amount, expiration, secrethash };
		Self { amount, expiration, secrethash, encoded: Bytes(lock.as_bytes()) }
	}
}

impl From<&Lock> for HashTimeLockState {
	fn from(lock: &Lock) -> Self {
		Self::create(lock.amount, lock.expiration, lock.secrethash)
	}
}

/// A withdraw request waiting for its confirmation or its expiration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingWithdrawState {
	pub total_withdraw: TokenAmount,
	pub expiration: BlockExpiration,
	pub nonce: Nonce,
	pub request: WithdrawRequest,
	pub confirmation: Option<WithdrawConfirmation>,
	/// The counterpart's `Processed` for a confirmation we signed.
	pub confirmation_processed: Option<Processed>,
	/// The on-chain withdraw could not be submitted; only expiry remains.
	pub failed: bool,
}

impl PendingWithdrawState {
	pub fn new(request: WithdrawRequest) -> Self {
		Self {
			total_withdraw: request.total_withdraw,
			expiration: request.expiration,
			nonce: request.nonce,
			request,
			confirmation: None,
			confirmation_processed: None,
			failed: false,
		}
	}
}

/// A withdraw request which expired without being confirmed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExpiredWithdrawState {
	pub total_withdraw: TokenAmount,
	pub expiration: BlockExpiration,
	pub nonce: Nonce,
	pub message: WithdrawExpired,
	pub processed: Option<Processed>,
}

/// Where a transfer stands, derived from its record.
#[derive(Copy, Clone, Display, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TransferStatus {
	Pending,
	SecretRequested,
	SecretRevealed,
	Unlocking,
	Unlocked,
	Expiring,
	Expired,
	Refunded,
	Failed,
	ResolvableOnchain,
}

/// A transfer this node sent or received, with every message exchanged for it.
///
/// For sent transfers `secret_request` is the payee's request and `secret_reveal` our reveal to
/// it. For received transfers both are messages we signed: the request to the initiator and the
/// reveal back to the payer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransferState {
	pub direction: TransferDirection,
	pub transfer: LockedTransfer,
	pub fee: TokenAmount,
	pub partner: Address,
	pub expiration: BlockExpiration,
	pub transfer_processed: Option<Processed>,
	pub secret_request: Option<SecretRequest>,
	pub secret_request_delivered: bool,
	pub secret_reveal: Option<SecretReveal>,
	pub secret_reveal_delivered: bool,
	/// The next hop of a sent transfer proved it knows the secret.
	pub partner_revealed: bool,
	pub unlock: Option<Unlock>,
	pub unlock_processed: Option<Processed>,
	pub expired: Option<LockExpired>,
	pub expired_processed: Option<Processed>,
	pub refund: Option<RefundTransfer>,
	pub failed: Option<String>,
	pub channel_closed: Option<BlockNumber>,
}

impl TransferState {
	pub fn new(
		direction: TransferDirection,
		transfer: LockedTransfer,
		fee: TokenAmount,
		partner: Address,
	) -> Self {
		Self {
			direction,
			expiration: transfer.lock.expiration,
			transfer,
			fee,
			partner,
			transfer_processed: None,
			secret_request: None,
			secret_request_delivered: false,
			secret_reveal: None,
			secret_reveal_delivered: false,
			partner_revealed: false,
			unlock: None,
			unlock_processed: None,
			expired: None,
			expired_processed: None,
			refund: None,
			failed: None,
			channel_closed: None,
		}
	}

	pub fn key(&self) -> TransferKey {
		TransferKey { direction: self.direction, secrethash: self.secrethash() }
	}

	pub fn secrethash(&self) -> SecretHash {
		self.transfer.lock.secrethash
	}

	pub fn channel_key(&self) -> ChannelKey {
		ChannelKey::new(self.transfer.token_network_address, self.partner)
	}

	/// The value the payee receives, without fees.
	pub fn value(&self) -> TokenAmount {
		self.transfer.lock.amount.saturating_sub(self.fee)
	}

	/// Whether the lock was resolved off-chain, either way.
	pub fn is_resolved(&self) -> bool {
		self.unlock.is_some() || self.expired.is_some()
	}

	/// Identifiers of every message exchanged for the transfer.
	pub fn message_identifiers(&self) -> Vec<MessageIdentifier> {
		let mut identifiers = vec![self.transfer.message_identifier];
		identifiers.extend(self.unlock.as_ref().map(|m| m.message_identifier));
		identifiers.extend(self.expired.as_ref().map(|m| m.message_identifier));
		identifiers.extend(self.refund.as_ref().map(|m| m.message_identifier));
		identifiers
	}

	pub fn status(&self) -> TransferStatus {
		let sent = self.direction == TransferDirection::Sent;
		if self.unlock.is_some() {
			if sent && self.unlock_processed.is_none() {
				return TransferStatus::Unlocking
			}
			return TransferStatus::Unlocked
		}
		if self.expired.is_some() {
			if sent && self.expired_processed.is_none() {
				return TransferStatus::Expiring
			}
			return TransferStatus::Expired
		}
		if self.refund.is_some() {
			return TransferStatus::Refunded
		}
		if self.failed.is_some() {
			return TransferStatus::Failed
		}
		if self.channel_closed.is_some() {
			return TransferStatus::ResolvableOnchain
		}
		if self.secret_reveal.is_some() || self.partner_revealed {
			return TransferStatus::SecretRevealed
		}
		if self.secret_request.is_some() {
			return TransferStatus::SecretRequested
		}
		TransferStatus::Pending
	}
}
