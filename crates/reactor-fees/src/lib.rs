//! Fee collection for the settlement reactors.
//!
//! Two independent models are supported. A protocol fee controller appends
//! fee legs to a resolved order, subject to checks the reactor enforces
//! regardless of which controller is installed. The escrow split model
//! captures fee outputs into a ledger held by the reactor, shared between
//! the protocol and the interface that routed the order, and paid out
//! through explicit claims.

use alloy::primitives::{Address, U256};
use reactor_order::math::{mul_div_down, BPS};
use reactor_types::{ConfigSchema, OutputToken, ReactorError, ResolvedOrder, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod escrow;

/// Re-export implementations
pub mod implementations {
	pub mod bps;
}

pub use escrow::{FeeBalance, FeeEscrow, FeeRecipient};
pub use implementations::bps::BpsFeeController;

/// Upper bound of a single fee leg, in basis points of the order's value in
/// that token.
pub const MAX_FEE_BPS: u64 = 5;

/// Source of protocol fee legs.
///
/// Controllers only propose fee outputs. Whether they are acceptable is
/// decided by [`inject_fees`].
pub trait ProtocolFeeController: Send + Sync {
	/// Name used in logs and controller change events.
	fn name(&self) -> &str;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fee outputs to append to `order`. Recipients are chosen by the
	/// controller.
	fn get_fee_outputs(&self, order: &ResolvedOrder) -> Vec<OutputToken>;
}

/// How fee outputs are recognised under the escrow split model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeMarking {
	/// Outputs the order author signed as fee outputs, plus any legs a
	/// protocol fee controller injected.
	Flagged,
	/// The last output of any order with more than one output.
	LastOutput,
}

/// Fee model a reactor runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeModel {
	/// Fee legs are paid straight to the recipients the controller names.
	#[default]
	ProtocolController,
	/// Fee outputs are held by the reactor and split at capture time.
	EscrowSplit {
		protocol_fee_bps: u64,
		marking: FeeMarking,
	},
}

/// Total value `order` moves in `token`: genuine outputs plus the input
/// when it is the same token.
pub fn token_value(order: &ResolvedOrder, token: Address) -> Result<U256> {
	let mut value = if order.input.token == token {
		order.input.amount
	} else {
		U256::ZERO
	};
	for output in order.trade_outputs().filter(|output| output.token == token) {
		value = value
			.checked_add(output.amount)
			.ok_or(ReactorError::MathOverflow)?;
	}
	Ok(value)
}

/// Appends the controller's fee legs to `order`.
///
/// Fails without touching the order if the controller proposes two legs in
/// the same token, a leg in a token the order does not move, or a leg above
/// [`MAX_FEE_BPS`] of the order's value in that token.
pub fn inject_fees(order: &mut ResolvedOrder, controller: &dyn ProtocolFeeController) -> Result<()> {
	let proposed = controller.get_fee_outputs(order);
	let mut legs: Vec<OutputToken> = Vec::with_capacity(proposed.len());

	for fee in proposed {
		if legs.iter().any(|leg| leg.token == fee.token) {
			return Err(ReactorError::DuplicateFeeOutput(fee.token));
		}

		let value = token_value(order, fee.token)?;
		if value.is_zero() {
			return Err(ReactorError::InvalidFeeToken(fee.token));
		}
		let cap = mul_div_down(value, U256::from(MAX_FEE_BPS), U256::from(BPS))?;
		if fee.amount > cap {
			return Err(ReactorError::FeeTooLarge {
				token: fee.token,
				amount: fee.amount,
				recipient: fee.recipient,
			});
		}

		legs.push(OutputToken::fee(fee.token, fee.amount, fee.recipient));
	}

	if !legs.is_empty() {
		debug!(
			order_hash = %order.hash,
			controller = controller.name(),
			legs = legs.len(),
			"Protocol fees injected"
		);
	}
	order.outputs.extend(legs);
	Ok(())
}
