//! Cosigned block-based orders with non-linear decay curves.
//!
//! Amounts first absorb the base fee drift since the order was signed
//! (`adjustmentPerGweiBaseFee` per gwei of change), then decay along their
//! curves from the cosigned start block. Inputs stay within
//! `[0, maxAmount]`, outputs never drop below `minAmount`.

use crate::codec::OrderKind;
use crate::cosigner::{cosigner_digest, tighten_input, tighten_outputs, verify_cosignature};
use crate::exclusivity::apply_override;
use crate::math::nonlinear::nonlinear_decay;
use crate::math::{bounded_add, bounded_sub, mul_div_down, mul_div_up, Rounding};
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, I256, U256};
use alloy::sol_types::SolValue;
use reactor_types::{InputToken, OutputToken, ReactorError, ResolvedOrder, Result};

const GWEI: u64 = 1_000_000_000;

/// Signed amount adjustment for a base fee move, rounded towards negative
/// infinity so the adjusted amount always rounds against the filler.
pub fn base_fee_delta(basefee: U256, starting_basefee: U256, adjustment_per_gwei: U256) -> Result<I256> {
	let gwei = U256::from(GWEI);
	let to_signed = |value: U256| I256::try_from(value).map_err(|_| ReactorError::MathOverflow);
	if basefee >= starting_basefee {
		to_signed(mul_div_down(basefee - starting_basefee, adjustment_per_gwei, gwei)?)
	} else {
		let magnitude = to_signed(mul_div_up(starting_basefee - basefee, adjustment_per_gwei, gwei)?)?;
		Ok(-magnitude)
	}
}

impl abi::V3DutchOrder {
	/// Digest the cosigner signs for this order on `chain_id`.
	pub fn cosigner_digest(&self, chain_id: u64) -> B256 {
		cosigner_digest(
			self.order_hash(),
			chain_id,
			&self.cosignerData.abi_encode(),
		)
	}
}

impl OrderPayload for abi::V3DutchOrder {
	const KIND: OrderKind = OrderKind::V3Dutch;
	type Typed = typed::V3DutchOrder;

	fn typed(&self) -> typed::V3DutchOrder {
		self.into()
	}

	fn info(&self) -> &abi::OrderInfo {
		&self.info
	}

	fn permitted(&self) -> (Address, U256) {
		(self.baseInput.token, self.baseInput.maxAmount)
	}

	fn resolve(&self, order_hash: B256, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		let cosigned = &self.cosignerData;
		let digest = cosigner_digest(order_hash, ctx.env.chain_id, &cosigned.abi_encode());
		verify_cosignature(digest, &self.cosignature, self.cosigner)?;

		let base_input = &self.baseInput;
		let mut input_start = tighten_input(base_input.startAmount, cosigned.inputOverride)?;
		let signed_starts: Vec<U256> = self
			.baseOutputs
			.iter()
			.map(|output| output.startAmount)
			.collect();
		let mut output_starts = tighten_outputs(&signed_starts, &cosigned.outputOverrides)?;

		if !base_input.adjustmentPerGweiBaseFee.is_zero() {
			let delta = base_fee_delta(
				ctx.env.basefee,
				self.startingBaseFee,
				base_input.adjustmentPerGweiBaseFee,
			)?;
			input_start = bounded_add(input_start, delta, U256::ZERO, base_input.maxAmount);
		}
		for (start, output) in output_starts.iter_mut().zip(&self.baseOutputs) {
			if output.adjustmentPerGweiBaseFee.is_zero() {
				continue;
			}
			let delta = base_fee_delta(
				ctx.env.basefee,
				self.startingBaseFee,
				output.adjustmentPerGweiBaseFee,
			)?;
			*start = bounded_sub(*start, delta, output.minAmount, U256::MAX);
		}

		let decay_start = cosigned.decayStartBlock;
		let block = ctx.env.number_u256();

		let input_amount = nonlinear_decay(
			&base_input.curve.to_curve()?,
			input_start,
			decay_start,
			block,
			U256::ZERO,
			base_input.maxAmount,
			Rounding::Down,
		)?;
		let input = InputToken::new(base_input.token, input_amount, base_input.maxAmount);

		let outputs = self
			.baseOutputs
			.iter()
			.zip(output_starts)
			.map(|(output, start)| {
				let amount = nonlinear_decay(
					&output.curve.to_curve()?,
					start,
					decay_start,
					block,
					output.minAmount,
					U256::MAX,
					Rounding::Up,
				)?;
				Ok(
					OutputToken::new(output.token, amount, output.recipient)
						.flagged(output.isFeeOutput),
				)
			})
			.collect::<Result<Vec<_>>>()?;

		let mut order = resolved(&self.info, input, outputs, order_hash);
		apply_override(
			&mut order,
			cosigned.exclusiveFiller,
			decay_start,
			cosigned.exclusivityOverrideBps,
			block,
			ctx.filler,
		)?;
		Ok(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::math::nonlinear::NonlinearDecay;
	use crate::testing::*;
	use alloy::primitives::Bytes;
	use reactor_account::{AccountInterface, LocalWallet};

	fn i(v: i64) -> I256 {
		I256::try_from(v).unwrap()
	}

	fn curve(blocks: &[u16], amounts: &[i64]) -> abi::NonlinearDutchDecay {
		(&NonlinearDecay {
			relative_blocks: blocks.to_vec(),
			relative_amounts: amounts.iter().map(|a| i(*a)).collect(),
		})
			.into()
	}

	fn sign(cosigner: &LocalWallet, mut order: abi::V3DutchOrder) -> abi::V3DutchOrder {
		order.cosigner = cosigner.address();
		order.cosignature = cosigner.sign_hash(&order.cosigner_digest(CHAIN_ID)).unwrap();
		order
	}

	fn order() -> abi::V3DutchOrder {
		abi::V3DutchOrder {
			info: info(u(1)),
			cosigner: Address::ZERO,
			startingBaseFee: u(10 * GWEI),
			baseInput: abi::V3DutchInput {
				token: token_in(),
				startAmount: u(1_000),
				curve: curve(&[], &[]),
				maxAmount: u(1_000),
				adjustmentPerGweiBaseFee: U256::ZERO,
			},
			baseOutputs: vec![abi::V3DutchOutput {
				token: token_out(),
				startAmount: u(2_000),
				curve: curve(&[10, 20], &[100, 400]),
				recipient: swapper(),
				minAmount: u(1_500),
				adjustmentPerGweiBaseFee: U256::ZERO,
				isFeeOutput: false,
			}],
			cosignerData: abi::V3CosignerData {
				decayStartBlock: u(BLOCK),
				..Default::default()
			},
			cosignature: Bytes::new(),
		}
	}

	fn resolve_at(order: &abi::V3DutchOrder, block: u64, basefee: u64) -> Result<ResolvedOrder> {
		let mut env = env().with_fees(u(basefee), u(basefee));
		env.number = block;
		order.resolve(order.order_hash(), &ctx_at(env))
	}

	#[test]
	fn test_curve_decay_by_block() {
		let cosigner = LocalWallet::random();
		let order = sign(&cosigner, order());
		let fee = 10 * GWEI;
		assert_eq!(resolve_at(&order, BLOCK, fee).unwrap().outputs[0].amount, u(2_000));
		assert_eq!(resolve_at(&order, BLOCK + 5, fee).unwrap().outputs[0].amount, u(1_950));
		assert_eq!(resolve_at(&order, BLOCK + 15, fee).unwrap().outputs[0].amount, u(1_750));
		// Holds the last curve point once past it.
		assert_eq!(resolve_at(&order, BLOCK + 40, fee).unwrap().outputs[0].amount, u(1_600));
	}

	#[test]
	fn test_min_amount_floor() {
		let cosigner = LocalWallet::random();
		let mut o = order();
		o.baseOutputs[0].curve = curve(&[10], &[1_000]);
		let o = sign(&cosigner, o);
		assert_eq!(
			resolve_at(&o, BLOCK + 10, 10 * GWEI).unwrap().outputs[0].amount,
			u(1_500)
		);
	}

	#[test]
	fn test_base_fee_adjustment() {
		let cosigner = LocalWallet::random();
		let mut o = order();
		o.baseOutputs[0].adjustmentPerGweiBaseFee = u(10);
		o.baseInput.startAmount = u(900);
		o.baseInput.adjustmentPerGweiBaseFee = u(5);
		let o = sign(&cosigner, o);

		// Base fee up 4 gwei: output -40, input +20.
		let resolved = resolve_at(&o, BLOCK, 14 * GWEI).unwrap();
		assert_eq!(resolved.outputs[0].amount, u(1_960));
		assert_eq!(resolved.input.amount, u(920));

		// Base fee down 2 gwei: output +20, input -10.
		let resolved = resolve_at(&o, BLOCK, 8 * GWEI).unwrap();
		assert_eq!(resolved.outputs[0].amount, u(2_020));
		assert_eq!(resolved.input.amount, u(890));

		// Input adjustment capped at the max amount.
		let resolved = resolve_at(&o, BLOCK, 100 * GWEI).unwrap();
		assert_eq!(resolved.input.amount, u(1_000));
	}

	#[test]
	fn test_base_fee_delta_rounding() {
		// 1.5 wei up rounds down, 1.5 wei down rounds to -2.
		assert_eq!(base_fee_delta(u(3), u(0), u(GWEI / 2)).unwrap(), i(1));
		assert_eq!(base_fee_delta(u(0), u(3), u(GWEI / 2)).unwrap(), i(-2));
	}

	#[test]
	fn test_cosigner_overrides() {
		let cosigner = LocalWallet::random();
		let mut o = order();
		o.cosignerData.outputOverrides = vec![u(2_100)];
		o.cosignerData.inputOverride = u(950);
		let resolved = resolve_at(&sign(&cosigner, o), BLOCK, 10 * GWEI).unwrap();
		assert_eq!(resolved.outputs[0].amount, u(2_100));
		assert_eq!(resolved.input.amount, u(950));
		assert_eq!(resolved.input.max_amount, u(1_000));

		let mut o = order();
		o.cosignerData.outputOverrides = vec![u(1_999)];
		assert_eq!(
			resolve_at(&sign(&cosigner, o), BLOCK, 10 * GWEI),
			Err(ReactorError::InvalidCosignerOutput)
		);
	}

	#[test]
	fn test_unsigned_order_rejected() {
		assert_eq!(
			resolve_at(&order(), BLOCK, 10 * GWEI),
			Err(ReactorError::InvalidCosignature)
		);
	}

	#[test]
	fn test_block_exclusivity() {
		let cosigner = LocalWallet::random();
		let mut o = order();
		o.cosignerData.decayStartBlock = u(BLOCK + 5);
		o.cosignerData.exclusiveFiller = Address::repeat_byte(0xee);
		let o = sign(&cosigner, o);
		assert_eq!(
			resolve_at(&o, BLOCK + 5, 10 * GWEI),
			Err(ReactorError::NoExclusiveOverride)
		);
		assert!(resolve_at(&o, BLOCK + 6, 10 * GWEI).is_ok());
	}

	#[test]
	fn test_invalid_curve_rejected() {
		let cosigner = LocalWallet::random();
		let mut o = order();
		o.baseOutputs[0].curve = abi::NonlinearDutchDecay {
			relativeBlocks: U256::from(5u64) | (U256::from(5u64) << 16),
			relativeAmounts: vec![i(1), i(2)],
		};
		assert_eq!(
			resolve_at(&sign(&cosigner, o), BLOCK + 1, 10 * GWEI),
			Err(ReactorError::InvalidDecayCurve)
		);
	}
}
