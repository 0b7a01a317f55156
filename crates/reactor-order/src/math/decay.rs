//! Linear decay between two amounts over a block or timestamp window.
//!
//! Amounts are always rounded against the filler: outputs (paid by the
//! filler) round up, inputs (received by the filler) round down.

use super::{mul_div, Rounding};
use alloy::primitives::U256;
use reactor_types::{ReactorError, Result};

/// Interpolates between `start_amount` and `end_amount`.
///
/// - `end_point < start_point` fails with `EndTimeBeforeStartTime`
/// - `start_point == end_point` returns `end_amount`
/// - `now >= end_point` returns `end_amount`
/// - `now <= start_point` returns `start_amount`
///
/// `rounding` applies to the returned amount.
pub fn linear_decay(
	start_amount: U256,
	end_amount: U256,
	start_point: U256,
	end_point: U256,
	now: U256,
	rounding: Rounding,
) -> Result<U256> {
	if end_point < start_point {
		return Err(ReactorError::EndTimeBeforeStartTime);
	}
	if start_point == end_point || end_point <= now {
		return Ok(end_amount);
	}
	if now <= start_point {
		return Ok(start_amount);
	}

	let elapsed = now - start_point;
	let duration = end_point - start_point;

	if end_amount < start_amount {
		// The reduction is rounded the opposite way so the result rounds as asked.
		let reduction = mul_div(start_amount - end_amount, elapsed, duration, rounding.flip())?;
		Ok(start_amount - reduction)
	} else {
		let increase = mul_div(end_amount - start_amount, elapsed, duration, rounding)?;
		start_amount
			.checked_add(increase)
			.ok_or(ReactorError::MathOverflow)
	}
}

/// Decays an output amount. Outputs may only stay flat or decrease.
pub fn decay_output(
	start_amount: U256,
	end_amount: U256,
	start_point: U256,
	end_point: U256,
	now: U256,
) -> Result<U256> {
	if start_amount < end_amount {
		return Err(ReactorError::IncorrectAmounts);
	}
	linear_decay(
		start_amount,
		end_amount,
		start_point,
		end_point,
		now,
		Rounding::Up,
	)
}

/// Decays an input amount. Inputs may only stay flat or increase.
pub fn decay_input(
	start_amount: U256,
	end_amount: U256,
	start_point: U256,
	end_point: U256,
	now: U256,
) -> Result<U256> {
	if start_amount > end_amount {
		return Err(ReactorError::IncorrectAmounts);
	}
	linear_decay(
		start_amount,
		end_amount,
		start_point,
		end_point,
		now,
		Rounding::Down,
	)
}
