//! Fixed-point helpers used by every pricing rule.
//!
//! All multiplications go through a 512-bit intermediate so that
//! `a * b / d` only fails when the final result does not fit in 256 bits.
//! Nothing wraps: overflow is reported as `MathOverflow`.

pub mod decay;
pub mod nonlinear;
pub mod priority_fee;

use alloy::primitives::{I256, U256, U512};
use reactor_types::{ReactorError, Result};

/// Basis points denominator.
pub const BPS: u64 = 10_000;

/// Direction in which a division result is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
	Down,
	Up,
}

impl Rounding {
	pub fn flip(self) -> Self {
		match self {
			Rounding::Down => Rounding::Up,
			Rounding::Up => Rounding::Down,
		}
	}
}

fn narrow(value: U512) -> Result<U256> {
	let limbs = value.as_limbs();
	if limbs[4..].iter().any(|&limb| limb != 0) {
		return Err(ReactorError::MathOverflow);
	}
	Ok(U256::from_limbs([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

/// Computes `a * b / denominator` with the requested rounding.
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> Result<U256> {
	if denominator.is_zero() {
		return Err(ReactorError::MathOverflow);
	}
	let product = U512::from(a) * U512::from(b);
	let denominator = U512::from(denominator);
	let quotient = product / denominator;
	let quotient = match rounding {
		Rounding::Up if !(product % denominator).is_zero() => quotient + U512::from(1u8),
		_ => quotient,
	};
	narrow(quotient)
}

pub fn mul_div_down(a: U256, b: U256, denominator: U256) -> Result<U256> {
	mul_div(a, b, denominator, Rounding::Down)
}

pub fn mul_div_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
	mul_div(a, b, denominator, Rounding::Up)
}

/// Scales `amount` by `(10000 + bps) / 10000`, rounding up.
pub fn scale_up_bps(amount: U256, bps: U256) -> Result<U256> {
	let factor = U256::from(BPS)
		.checked_add(bps)
		.ok_or(ReactorError::MathOverflow)?;
	mul_div_up(amount, factor, U256::from(BPS))
}

/// Clamps `value` into `[min, max]`.
pub fn bound(value: U256, min: U256, max: U256) -> U256 {
	value.max(min).min(max)
}

/// Computes `value - delta` for a signed delta, clamped into `[min, max]`.
///
/// Results that would be negative clamp to `min`, results that would
/// exceed 256 bits clamp to `max`.
pub fn bounded_sub(value: U256, delta: I256, min: U256, max: U256) -> U256 {
	let magnitude = delta.unsigned_abs();
	let raw = if delta.is_negative() {
		value.checked_add(magnitude).unwrap_or(U256::MAX)
	} else {
		match value.checked_sub(magnitude) {
			Some(result) => result,
			None => return min,
		}
	};
	bound(raw, min, max)
}

/// Computes `value + delta` for a signed delta, clamped into `[min, max]`.
pub fn bounded_add(value: U256, delta: I256, min: U256, max: U256) -> U256 {
	bounded_sub(value, delta.saturating_neg(), min, max)
}
