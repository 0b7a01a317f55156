//! Piecewise-linear decay curves keyed by relative block offsets.
//!
//! A curve is a list of `(relative_block, relative_amount)` points anchored
//! at `(0, 0)`: at block offset `b` the decayed amount is
//! `start_amount - curve(b)`. Between points the relative amount is linearly
//! interpolated, past the last point it holds the last value. Relative
//! amounts are signed so a curve can move an amount in either direction.

use super::{bound, bounded_sub, mul_div, Rounding};
use alloy::primitives::{I256, U256};
use reactor_types::{ReactorError, Result};

/// Maximum number of points a curve can hold (16 packed `u16` offsets).
pub const MAX_CURVE_POINTS: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonlinearDecay {
	pub relative_blocks: Vec<u16>,
	pub relative_amounts: Vec<I256>,
}

impl NonlinearDecay {
	/// Builds a curve from the packed wire form: one `uint256` holding up to
	/// sixteen 16-bit offsets, lowest bits first, and the signed amounts.
	pub fn from_packed(packed_blocks: U256, relative_amounts: Vec<I256>) -> Result<Self> {
		if relative_amounts.len() > MAX_CURVE_POINTS {
			return Err(ReactorError::InvalidDecayCurve);
		}
		let relative_blocks = (0..relative_amounts.len())
			.map(|i| {
				let slot: U256 = (packed_blocks >> (i * 16)) & U256::from(u16::MAX);
				slot.to::<u16>()
			})
			.collect();
		let curve = Self {
			relative_blocks,
			relative_amounts,
		};
		curve.validate()?;
		Ok(curve)
	}

	/// Packs the block offsets into their `uint256` wire form.
	pub fn packed_blocks(&self) -> U256 {
		self.relative_blocks
			.iter()
			.enumerate()
			.fold(U256::ZERO, |acc, (i, block)| {
				acc | (U256::from(*block) << (i * 16))
			})
	}

	/// Checks point count, length agreement and strictly increasing offsets.
	pub fn validate(&self) -> Result<()> {
		if self.relative_blocks.len() != self.relative_amounts.len()
			|| self.relative_amounts.len() > MAX_CURVE_POINTS
		{
			return Err(ReactorError::InvalidDecayCurve);
		}
		if self
			.relative_blocks
			.windows(2)
			.any(|pair| pair[0] >= pair[1])
		{
			return Err(ReactorError::InvalidDecayCurve);
		}
		Ok(())
	}

	pub fn is_empty(&self) -> bool {
		self.relative_amounts.is_empty()
	}

	/// Relative amount at `block_delta`, rounded as requested.
	fn relative_at(&self, block_delta: u16, rounding: Rounding) -> Result<I256> {
		let last = self.relative_blocks.len() - 1;
		if block_delta >= self.relative_blocks[last] {
			return Ok(self.relative_amounts[last]);
		}

		let (start_point, end_point, start_amount, end_amount) =
			if block_delta <= self.relative_blocks[0] {
				(0, self.relative_blocks[0], I256::ZERO, self.relative_amounts[0])
			} else {
				// First point at or past the delta; exists because delta < last block.
				let i = self
					.relative_blocks
					.iter()
					.position(|block| *block >= block_delta)
					.ok_or(ReactorError::InvalidDecayCurve)?;
				(
					self.relative_blocks[i - 1],
					self.relative_blocks[i],
					self.relative_amounts[i - 1],
					self.relative_amounts[i],
				)
			};

		interpolate(
			start_point,
			end_point,
			block_delta,
			start_amount,
			end_amount,
			rounding,
		)
	}
}

fn to_signed(value: U256) -> Result<I256> {
	I256::try_from(value).map_err(|_| ReactorError::MathOverflow)
}

/// Linear interpolation of signed relative amounts, rounding the relative
/// amount itself towards `+inf` (`Up`) or `-inf` (`Down`).
fn interpolate(
	start_point: u16,
	end_point: u16,
	current: u16,
	start_amount: I256,
	end_amount: I256,
	rounding: Rounding,
) -> Result<I256> {
	if current >= end_point || start_point == end_point {
		return Ok(end_amount);
	}
	let elapsed = U256::from(current.saturating_sub(start_point));
	let duration = U256::from(end_point - start_point);

	if end_amount >= start_amount {
		let span = end_amount
			.checked_sub(start_amount)
			.ok_or(ReactorError::MathOverflow)?
			.unsigned_abs();
		let delta = to_signed(mul_div(span, elapsed, duration, rounding)?)?;
		start_amount
			.checked_add(delta)
			.ok_or(ReactorError::MathOverflow)
	} else {
		let span = start_amount
			.checked_sub(end_amount)
			.ok_or(ReactorError::MathOverflow)?
			.unsigned_abs();
		let delta = to_signed(mul_div(span, elapsed, duration, rounding.flip())?)?;
		start_amount
			.checked_sub(delta)
			.ok_or(ReactorError::MathOverflow)
	}
}

/// Decays `start_amount` along `curve` from `decay_start_block`, bounded to
/// `[min_amount, max_amount]`.
///
/// `rounding` applies to the returned amount, so outputs pass `Up` and
/// inputs pass `Down`.
pub fn nonlinear_decay(
	curve: &NonlinearDecay,
	start_amount: U256,
	decay_start_block: U256,
	current_block: U256,
	min_amount: U256,
	max_amount: U256,
	rounding: Rounding,
) -> Result<U256> {
	curve.validate()?;
	if curve.is_empty() || decay_start_block >= current_block {
		return Ok(bound(start_amount, min_amount, max_amount));
	}

	// Deltas past u16::MAX express a fully decayed curve.
	let elapsed = current_block - decay_start_block;
	let block_delta = if elapsed > U256::from(u16::MAX) {
		u16::MAX
	} else {
		elapsed.to::<u16>()
	};

	// amount = start - relative, so rounding the amount up rounds the relative down.
	let relative = curve.relative_at(block_delta, rounding.flip())?;
	Ok(bounded_sub(start_amount, relative, min_amount, max_amount))
}
