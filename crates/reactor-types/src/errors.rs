//! Error types for the settlement reactors.
//!
//! Every failure aborts the whole settlement call. There is no retry path and
//! no partial success, so each variant names exactly why the call reverted.

use alloy::primitives::{Address, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactorError>;

/// Broad category of a [`ReactorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Signatures, cosignatures, nonces, reactor binding, ownership.
	Authorization,
	/// Deadlines, decay windows, exclusivity windows, auction start.
	Temporal,
	/// Fees, cosigner overrides, amount bounds, arithmetic.
	Economic,
	/// Filler or reactor could not produce the tokens owed.
	Liquidity,
	/// Payloads that cannot be decoded or are not handled by this reactor.
	Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactorError {
	// Authorization
	#[error("Invalid signer")]
	InvalidSigner,
	#[error("Invalid signature")]
	InvalidSignature,
	#[error("Invalid signature length: {0}")]
	InvalidSignatureLength(usize),
	#[error("Invalid cosignature")]
	InvalidCosignature,
	#[error("Invalid nonce")]
	InvalidNonce,
	#[error("Order is bound to another reactor")]
	InvalidReactor,
	#[error("Caller {0} is not authorized")]
	Unauthorized(Address),

	// Temporal
	#[error("Deadline passed")]
	DeadlinePassed,
	#[error("Signature expired at {0}")]
	SignatureExpired(U256),
	#[error("Deadline before decay end")]
	DeadlineBeforeEndTime,
	#[error("Decay end before decay start")]
	EndTimeBeforeStartTime,
	#[error("Order not fillable before block {0}")]
	OrderNotFillable(U256),
	#[error("No exclusive override")]
	NoExclusiveOverride,

	// Economic
	#[error("Fee of {amount} in token {token} to {recipient} exceeds the maximum")]
	FeeTooLarge {
		token: Address,
		amount: U256,
		recipient: Address,
	},
	#[error("Duplicate fee output for token {0}")]
	DuplicateFeeOutput(Address),
	#[error("Fee token {0} not present in order")]
	InvalidFeeToken(Address),
	#[error("Cosigner input override is worse than the signed bound")]
	InvalidCosignerInput,
	#[error("Cosigner output override is worse than the signed bound")]
	InvalidCosignerOutput,
	#[error("Incorrect decay amounts")]
	IncorrectAmounts,
	#[error("Input and outputs cannot both decay")]
	InputAndOutputDecay,
	#[error("Input and outputs cannot both scale with priority fee")]
	InputOutputScaled,
	#[error("Invalid decay curve")]
	InvalidDecayCurve,
	#[error("Gas price below base fee")]
	InvalidGasPrice,
	#[error("Requested amount {requested} exceeds permitted {permitted}")]
	InvalidAmount { requested: U256, permitted: U256 },
	#[error("Basis points {0} out of range")]
	InvalidBps(u64),
	#[error("Nothing to claim")]
	NothingToClaim,
	#[error("Arithmetic overflow")]
	MathOverflow,

	// Liquidity
	#[error("Insufficient balance of {token} for {owner}: need {needed}, have {available}")]
	InsufficientBalance {
		token: Address,
		owner: Address,
		needed: U256,
		available: U256,
	},
	#[error("Insufficient allowance of {token} from {owner} to {spender}")]
	InsufficientAllowance {
		token: Address,
		owner: Address,
		spender: Address,
	},
	#[error("Native transfer failed")]
	NativeTransferFailed,

	// Validation and callbacks
	#[error("Additional validation failed: {0}")]
	ValidationFailed(String),
	#[error("Validation contract {0} not registered")]
	ValidationContractNotFound(Address),
	#[error("Filler callback failed: {0}")]
	CallbackFailed(String),

	// Decoding
	#[error("Unknown order type tag: {0}")]
	UnknownOrderType(u8),
	#[error("Order type {0} is not handled by this reactor")]
	UnsupportedOrderType(String),
	#[error("Malformed order: {0}")]
	MalformedOrder(String),
	#[error("Empty batch")]
	EmptyBatch,
}

impl ReactorError {
	/// Returns the category this error belongs to.
	pub fn kind(&self) -> ErrorKind {
		use ReactorError::*;
		match self {
			InvalidSigner
			| InvalidSignature
			| InvalidSignatureLength(_)
			| InvalidCosignature
			| InvalidNonce
			| InvalidReactor
			| Unauthorized(_) => ErrorKind::Authorization,
			DeadlinePassed
			| SignatureExpired(_)
			| DeadlineBeforeEndTime
			| EndTimeBeforeStartTime
			| OrderNotFillable(_)
			| NoExclusiveOverride => ErrorKind::Temporal,
			FeeTooLarge { .. }
			| DuplicateFeeOutput(_)
			| InvalidFeeToken(_)
			| InvalidCosignerInput
			| InvalidCosignerOutput
			| IncorrectAmounts
			| InputAndOutputDecay
			| InputOutputScaled
			| InvalidDecayCurve
			| InvalidGasPrice
			| InvalidAmount { .. }
			| InvalidBps(_)
			| NothingToClaim
			| MathOverflow
			| ValidationFailed(_) => ErrorKind::Economic,
			InsufficientBalance { .. }
			| InsufficientAllowance { .. }
			| NativeTransferFailed
			| CallbackFailed(_) => ErrorKind::Liquidity,
			ValidationContractNotFound(_)
			| UnknownOrderType(_)
			| UnsupportedOrderType(_)
			| MalformedOrder(_)
			| EmptyBatch => ErrorKind::Malformed,
		}
	}

	/// Whether an identical order could succeed in a later, independent call.
	///
	/// Only exclusivity windows and auction start blocks lapse on their own.
	pub fn may_succeed_later(&self) -> bool {
		matches!(
			self,
			ReactorError::NoExclusiveOverride | ReactorError::OrderNotFillable(_)
		)
	}
}
