//! Priority fee scaling.
//!
//! Amounts are adjusted in milli-basis-points (`MPS`, 1e7 per unit) for every
//! wei of priority fee the settling transaction pays above the order's
//! baseline. Inputs shrink and outputs grow, so a higher bid always improves
//! the swapper's terms.

use super::{mul_div_down, mul_div_up};
use alloy::primitives::U256;
use reactor_types::{BlockEnv, ReactorError, Result};

/// Milli-basis-points denominator.
pub const MPS: u64 = 10_000_000;

/// Priority fee above `baseline`, saturating at zero.
///
/// A gas price below the base fee fails with `InvalidGasPrice`.
pub fn priority_fee_above(env: &BlockEnv, baseline: U256) -> Result<U256> {
	let fee = env.priority_fee().ok_or(ReactorError::InvalidGasPrice)?;
	Ok(fee.saturating_sub(baseline))
}

/// Scales an input down by `priority_fee * mps_per_wei` milli-bps, rounding
/// down. Returns zero once the adjustment reaches the full amount.
pub fn scale_input(amount: U256, priority_fee: U256, mps_per_priority_fee_wei: U256) -> Result<U256> {
	let mps = U256::from(MPS);
	let adjustment = priority_fee.saturating_mul(mps_per_priority_fee_wei);
	if adjustment >= mps {
		return Ok(U256::ZERO);
	}
	mul_div_down(amount, mps - adjustment, mps)
}

/// Scales an output up by `priority_fee * mps_per_wei` milli-bps, rounding up.
pub fn scale_output(
	amount: U256,
	priority_fee: U256,
	mps_per_priority_fee_wei: U256,
) -> Result<U256> {
	let mps = U256::from(MPS);
	let factor = priority_fee
		.checked_mul(mps_per_priority_fee_wei)
		.and_then(|adjustment| adjustment.checked_add(mps))
		.ok_or(ReactorError::MathOverflow)?;
	mul_div_up(amount, factor, mps)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn u(v: u64) -> U256 {
		U256::from(v)
	}

	#[test]
	fn test_priority_fee_above_baseline() {
		let env = BlockEnv::new(1, 1, 1).with_fees(u(100), u(180));
		assert_eq!(priority_fee_above(&env, u(30)).unwrap(), u(50));
		assert_eq!(priority_fee_above(&env, u(500)).unwrap(), U256::ZERO);

		let env = BlockEnv::new(1, 1, 1).with_fees(u(100), u(99));
		assert_eq!(
			priority_fee_above(&env, U256::ZERO),
			Err(ReactorError::InvalidGasPrice)
		);
	}

	#[test]
	fn test_zero_fee_is_identity() {
		assert_eq!(scale_input(u(1_000), U256::ZERO, u(5)).unwrap(), u(1_000));
		assert_eq!(scale_output(u(1_000), U256::ZERO, u(5)).unwrap(), u(1_000));
		assert_eq!(scale_output(u(1_000), u(50), U256::ZERO).unwrap(), u(1_000));
	}

	#[test]
	fn test_scaling_directions() {
		// 100 wei * 1000 mps = 1%
		assert_eq!(scale_input(u(1_000), u(100), u(1_000)).unwrap(), u(990));
		assert_eq!(scale_output(u(1_000), u(100), u(1_000)).unwrap(), u(1_010));
	}

	#[test]
	fn test_rounding() {
		assert_eq!(scale_input(u(3), u(1), u(1)).unwrap(), u(2));
		assert_eq!(scale_output(u(3), u(1), u(1)).unwrap(), u(4));
	}

	#[test]
	fn test_input_floors_at_zero() {
		assert_eq!(scale_input(u(1_000), u(MPS), u(1)).unwrap(), U256::ZERO);
		assert_eq!(scale_input(u(1_000), U256::MAX, U256::MAX).unwrap(), U256::ZERO);
	}

	#[test]
	fn test_output_overflow_is_error() {
		assert_eq!(
			scale_output(u(1), U256::MAX, u(2)),
			Err(ReactorError::MathOverflow)
		);
	}
}
