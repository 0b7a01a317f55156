//! Exclusive filling windows.
//!
//! An order may name one filler that holds the sole right to fill it until
//! an end point (a timestamp or a block number, depending on the order
//! family). Anyone else filling inside the window must either pay the
//! override penalty on every output or is rejected outright.

use crate::math::{scale_up_bps, BPS};
use alloy::primitives::{Address, U256};
use reactor_types::{ReactorError, ResolvedOrder, Result};

/// Returns true if `caller` may fill without paying an override.
pub fn has_filling_rights(
	exclusive: Address,
	exclusivity_end: U256,
	current: U256,
	caller: Address,
) -> bool {
	exclusive == Address::ZERO || current > exclusivity_end || caller == exclusive
}

/// Applies the exclusivity rules to an already decayed order.
///
/// Without filling rights a zero `override_bps` fails with
/// `NoExclusiveOverride`, any other value scales every output up by
/// `(10000 + override_bps) / 10000`, rounded up.
pub fn apply_override(
	order: &mut ResolvedOrder,
	exclusive: Address,
	exclusivity_end: U256,
	override_bps: U256,
	current: U256,
	caller: Address,
) -> Result<()> {
	if has_filling_rights(exclusive, exclusivity_end, current, caller) {
		return Ok(());
	}
	if override_bps.is_zero() {
		return Err(ReactorError::NoExclusiveOverride);
	}
	tracing::debug!(
		order_hash = %order.hash,
		%caller,
		%override_bps,
		"Applying exclusivity override"
	);
	for output in order.outputs.iter_mut() {
		output.amount = scale_up_bps(output.amount, override_bps)?;
	}
	Ok(())
}

/// Scales every genuine output up by `bps`, rounding up.
///
/// Used for validation contracts that demand an output increase instead of
/// a yes/no verdict.
pub fn increase_outputs_bps(order: &mut ResolvedOrder, bps: u64) -> Result<()> {
	if bps > u64::MAX - BPS {
		return Err(ReactorError::InvalidBps(bps));
	}
	for output in order.outputs.iter_mut().filter(|o| !o.is_fee_output) {
		output.amount = scale_up_bps(output.amount, U256::from(bps))?;
	}
	Ok(())
}
