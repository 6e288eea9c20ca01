use async_trait::async_trait;
use raiden_light_primitives::{
	constants::{
		EMPTY_SIGNATURE,
		LOCKSROOT_OF_NO_LOCKS,
	},
	hashing::hash_balance_data,
	packing::pack_balance_proof_message,
	types::{
		Address,
		BalanceHash,
		BlockExpiration,
		CanonicalIdentifier,
		LockedAmount,
		Locksroot,
		MessageHash,
		MessageTypeId,
		Nonce,
		Secret,
		SettleTimeout,
		Signature,
		TokenAmount,
		TokenNetworkAddress,
		TransactionHash,
		H256,
	},
};
use raiden_light_state_machine::types::{
	ChannelEndState,
	ChannelState,
	PendingWithdrawState,
};

use crate::{
	errors::TransactionError,
	signer::Signer,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OpenChannelParams {
	pub token_network_address: TokenNetworkAddress,
	pub partner: Address,
	pub settle_timeout: SettleTimeout,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetTotalDepositParams {
	pub canonical_identifier: CanonicalIdentifier,
	pub participant: Address,
	pub partner: Address,
	pub total_deposit: TokenAmount,
}

/// Close with the partner's latest balance proof, countersigned by us.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloseChannelParams {
	pub canonical_identifier: CanonicalIdentifier,
	pub partner: Address,
	pub nonce: Nonce,
	pub balance_hash: BalanceHash,
	pub additional_hash: MessageHash,
	/// Empty when the partner never sent us a balance proof.
	pub non_closing_signature: Signature,
	pub closing_signature: Signature,
}

/// Balance data of one participant, as the settlement requires it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SettlementData {
	pub participant: Address,
	pub transferred_amount: TokenAmount,
	pub locked_amount: LockedAmount,
	pub locksroot: Locksroot,
}

impl From<&ChannelEndState> for SettlementData {
	fn from(end_state: &ChannelEndState) -> Self {
		match &end_state.balance_proof {
			Some(balance_proof) => Self {
				participant: end_state.address,
				transferred_amount: balance_proof.transferred_amount,
				locked_amount: balance_proof.locked_amount,
				locksroot: balance_proof.locksroot,
			},
			None => Self {
				participant: end_state.address,
				transferred_amount: TokenAmount::zero(),
				locked_amount: LockedAmount::zero(),
				locksroot: *LOCKSROOT_OF_NO_LOCKS,
			},
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SettleChannelParams {
	pub canonical_identifier: CanonicalIdentifier,
	pub our_data: SettlementData,
	pub partner_data: SettlementData,
}

/// An on-chain withdraw authorized by both participants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SetTotalWithdrawParams {
	pub canonical_identifier: CanonicalIdentifier,
	pub participant: Address,
	pub total_withdraw: TokenAmount,
	pub expiration: BlockExpiration,
	pub participant_signature: Signature,
	pub partner_signature: Signature,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterSecretParams {
	pub secret: Secret,
}

/// Submits transactions to the chain. Outcomes are observed through the chain watcher,
/// the returned hash only confirms the submission.
#[async_trait]
pub trait TransactionSender: Send + Sync {
	async fn open_channel(&self, params: OpenChannelParams)
		-> Result<TransactionHash, TransactionError>;

	async fn set_total_deposit(
		&self,
		params: SetTotalDepositParams,
	) -> Result<TransactionHash, TransactionError>;

	async fn close_channel(
		&self,
		params: CloseChannelParams,
	) -> Result<TransactionHash, TransactionError>;

	async fn settle_channel(
		&self,
		params: SettleChannelParams,
	) -> Result<TransactionHash, TransactionError>;

	async fn set_total_withdraw(
		&self,
		params: SetTotalWithdrawParams,
	) -> Result<TransactionHash, TransactionError>;

	async fn register_secret(
		&self,
		params: RegisterSecretParams,
	) -> Result<TransactionHash, TransactionError>;
}

/// Any transaction the node submits, with its parameters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transaction {
	OpenChannel(OpenChannelParams),
	SetTotalDeposit(SetTotalDepositParams),
	CloseChannel(CloseChannelParams),
	SettleChannel(SettleChannelParams),
	SetTotalWithdraw(SetTotalWithdrawParams),
	RegisterSecret(RegisterSecretParams),
}

impl Transaction {
	pub fn name(&self) -> &'static str {
		match self {
			Transaction::OpenChannel(_) => "openChannel",
			Transaction::SetTotalDeposit(_) => "setTotalDeposit",
			Transaction::CloseChannel(_) => "closeChannel",
			Transaction::SettleChannel(_) => "settleChannel",
			Transaction::SetTotalWithdraw(_) => "setTotalWithdraw",
			Transaction::RegisterSecret(_) => "registerSecret",
		}
	}

	pub async fn submit<T: TransactionSender + ?Sized>(
		&self,
		sender: &T,
	) -> Result<TransactionHash, TransactionError> {
		match self {
			Transaction::OpenChannel(params) => sender.open_channel(params.clone()).await,
			Transaction::SetTotalDeposit(params) => sender.set_total_deposit(params.clone()).await,
			Transaction::CloseChannel(params) => sender.close_channel(params.clone()).await,
			Transaction::SettleChannel(params) => sender.settle_channel(params.clone()).await,
			Transaction::SetTotalWithdraw(params) => sender.set_total_withdraw(params.clone()).await,
			Transaction::RegisterSecret(params) => sender.register_secret(params.clone()).await,
		}
	}
}

fn canonical_identifier(channel: &ChannelState) -> Result<CanonicalIdentifier, TransactionError> {
	channel.canonical_identifier().ok_or_else(|| {
		TransactionError::Rejected(format!("Channel {} is not open on-chain", channel.key()))
	})
}

/// Build the close of `channel` from the partner's balance proof.
pub async fn close_channel_params<S: Signer + ?Sized>(
	channel: &ChannelState,
	signer: &S,
) -> Result<CloseChannelParams, TransactionError> {
	let canonical_identifier = canonical_identifier(channel)?;
	let (nonce, balance_hash, additional_hash, non_closing_signature) =
		match &channel.partner_state.balance_proof {
			Some(bp) => (bp.nonce, bp.balance_hash, bp.message_hash, bp.signature.clone()),
			None => (
				Nonce::zero(),
				hash_balance_data(TokenAmount::zero(), LockedAmount::zero(), *LOCKSROOT_OF_NO_LOCKS),
				H256::zero(),
				EMPTY_SIGNATURE.clone(),
			),
		};

	let closing_data = pack_balance_proof_message(
		nonce,
		balance_hash,
		additional_hash,
		&canonical_identifier,
		MessageTypeId::BalanceProof,
		&non_closing_signature,
	);
	let closing_signature = signer
		.sign_message(&closing_data.0)
		.await
		.map_err(|e| TransactionError::Fatal(e.to_string()))?;

	Ok(CloseChannelParams {
		canonical_identifier,
		partner: channel.partner_state.address,
		nonce,
		balance_hash,
		additional_hash,
		non_closing_signature,
		closing_signature,
	})
}

pub fn settle_channel_params(channel: &ChannelState) -> Result<SettleChannelParams, TransactionError> {
	Ok(SettleChannelParams {
		canonical_identifier: canonical_identifier(channel)?,
		our_data: SettlementData::from(&channel.our_state),
		partner_data: SettlementData::from(&channel.partner_state),
	})
}

/// Build the on-chain withdraw of a confirmed request of ours.
pub fn set_total_withdraw_params(
	withdraw: &PendingWithdrawState,
) -> Result<SetTotalWithdrawParams, TransactionError> {
	let confirmation = withdraw.confirmation.as_ref().ok_or_else(|| {
		TransactionError::Rejected(format!(
			"Withdraw of {} is not confirmed by the partner",
			withdraw.total_withdraw
		))
	})?;
	let request = &withdraw.request;

	Ok(SetTotalWithdrawParams {
		canonical_identifier: request.canonical_identifier(),
		participant: request.participant,
		total_withdraw: request.total_withdraw,
		expiration: request.expiration,
		participant_signature: request.signature.clone(),
		partner_signature: confirmation.signature.clone(),
	})
}
