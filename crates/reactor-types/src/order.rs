//! Canonical order model shared by every reactor.
//!
//! Order-type specific payloads are decoded and resolved elsewhere. What
//! flows through fee injection, validation and the fill loop is always a
//! [`ResolvedOrder`] built from the types in this module.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Token address used to denote the chain's native currency.
pub const NATIVE: Address = Address::ZERO;

/// Generic order envelope every order type embeds first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
	/// Reactor the swapper's signature is bound to.
	pub reactor: Address,
	/// The party selling the input token.
	pub swapper: Address,
	/// Replay and cancellation key, unique per swapper.
	pub nonce: U256,
	/// Timestamp after which the order can no longer be filled.
	pub deadline: U256,
	/// Optional contract consulted before settlement (zero address for none).
	pub additional_validation_contract: Address,
	/// Opaque data handed to the additional validation contract.
	pub additional_validation_data: Bytes,
}

impl OrderInfo {
	/// Creates an envelope without additional validation.
	pub fn new(reactor: Address, swapper: Address, nonce: U256, deadline: U256) -> Self {
		Self {
			reactor,
			swapper,
			nonce,
			deadline,
			additional_validation_contract: Address::ZERO,
			additional_validation_data: Bytes::new(),
		}
	}

	pub fn with_validation(mut self, contract: Address, data: Bytes) -> Self {
		self.additional_validation_contract = contract;
		self.additional_validation_data = data;
		self
	}

	pub fn has_additional_validation(&self) -> bool {
		self.additional_validation_contract != Address::ZERO
	}
}

/// Token the swapper provides.
///
/// `max_amount` is what the swapper authorized through the transfer
/// signature, `amount` is what resolution computed. `amount` never exceeds
/// `max_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputToken {
	pub token: Address,
	pub amount: U256,
	pub max_amount: U256,
}

impl InputToken {
	pub fn new(token: Address, amount: U256, max_amount: U256) -> Self {
		Self {
			token,
			amount,
			max_amount,
		}
	}
}

/// Token the filler must deliver to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputToken {
	pub token: Address,
	pub amount: U256,
	pub recipient: Address,
	/// Marks fee legs, as opposed to outputs owed to the trade's recipients.
	pub is_fee_output: bool,
}

impl OutputToken {
	/// Creates a regular trade output.
	pub fn new(token: Address, amount: U256, recipient: Address) -> Self {
		Self {
			token,
			amount,
			recipient,
			is_fee_output: false,
		}
	}

	/// Creates an output flagged as a fee leg.
	pub fn fee(token: Address, amount: U256, recipient: Address) -> Self {
		Self {
			token,
			amount,
			recipient,
			is_fee_output: true,
		}
	}

	/// Sets the fee flag carried on the signed order.
	pub fn flagged(self, is_fee_output: bool) -> Self {
		Self {
			is_fee_output,
			..self
		}
	}

	pub fn is_native(&self) -> bool {
		self.token == NATIVE
	}
}

/// An order as submitted by a filler: type-tagged payload plus the swapper's
/// transfer signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
	pub order: Bytes,
	pub sig: Bytes,
}

impl SignedOrder {
	pub fn new(order: impl Into<Bytes>, sig: impl Into<Bytes>) -> Self {
		Self {
			order: order.into(),
			sig: sig.into(),
		}
	}
}

/// The canonical settlement unit produced by resolving a [`SignedOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOrder {
	pub info: OrderInfo,
	pub input: InputToken,
	pub outputs: Vec<OutputToken>,
	/// Swapper signature, forwarded to the transfer authorization service.
	pub sig: Bytes,
	/// Order hash computed before any amount was touched.
	pub hash: B256,
	/// Permit2 witness type string of the order family.
	pub witness_type: String,
}

impl ResolvedOrder {
	/// Outputs owed to the trade's recipients, excluding fee legs.
	pub fn trade_outputs(&self) -> impl Iterator<Item = &OutputToken> {
		self.outputs.iter().filter(|output| !output.is_fee_output)
	}

	/// Outputs flagged as fee legs.
	pub fn fee_outputs(&self) -> impl Iterator<Item = &OutputToken> {
		self.outputs.iter().filter(|output| output.is_fee_output)
	}

	/// Total native currency this order's outputs require.
	pub fn native_owed(&self) -> U256 {
		self.outputs
			.iter()
			.filter(|output| output.is_native())
			.fold(U256::ZERO, |acc, output| acc.saturating_add(output.amount))
	}
}
