//! Hybrid orders: a block-based price curve combined with priority fee scaling.
//!
//! The swapper signs bounds (`maxAmount` in, `minAmount` out) and a WAD
//! scaling factor. A factor of at least 1.0 makes the order exact-in: the
//! input is fixed and outputs are `minAmount * scaling`. A factor below 1.0
//! makes it exact-out: outputs are fixed and the input is
//! `maxAmount * scaling`. The scaling factor decays along the price curve
//! towards 1.0 from the auction start block, and the scaled side is then
//! adjusted for the priority fee like a priority order.

use crate::codec::OrderKind;
use crate::cosigner::{
	cosigner_digest, tighten_scaling, tighten_start_block, verify_cosignature, WAD,
};
use crate::math::nonlinear::nonlinear_decay;
use crate::math::priority_fee::{priority_fee_above, scale_input, scale_output};
use crate::math::{mul_div_down, mul_div_up, Rounding};
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolValue;
use reactor_types::{InputToken, OutputToken, ReactorError, ResolvedOrder, Result};

impl abi::HybridOrder {
	/// Digest the cosigner signs for this order on `chain_id`.
	pub fn cosigner_digest(&self, chain_id: u64) -> B256 {
		cosigner_digest(
			self.order_hash(),
			chain_id,
			&self.cosignerData.abi_encode(),
		)
	}

	pub fn is_exact_in(&self) -> bool {
		self.scalingFactor >= U256::from(WAD)
	}

	fn is_cosigned(&self) -> bool {
		!self.cosignerData.auctionTargetBlock.is_zero()
			|| !self.cosignerData.scalingOverride.is_zero()
	}
}

impl OrderPayload for abi::HybridOrder {
	const KIND: OrderKind = OrderKind::Hybrid;
	type Typed = typed::HybridOrder;

	fn typed(&self) -> typed::HybridOrder {
		self.into()
	}

	fn info(&self) -> &abi::OrderInfo {
		&self.info
	}

	fn permitted(&self) -> (Address, U256) {
		(self.input.token, self.input.maxAmount)
	}

	fn resolve(&self, order_hash: B256, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		if self.scalingFactor.is_zero() {
			return Err(ReactorError::IncorrectAmounts);
		}

		let mut auction_start = self.auctionStartBlock;
		let mut scaling = self.scalingFactor;
		if self.is_cosigned() {
			let digest = cosigner_digest(
				order_hash,
				ctx.env.chain_id,
				&self.cosignerData.abi_encode(),
			);
			verify_cosignature(digest, &self.cosignature, self.cosigner)?;
			auction_start =
				tighten_start_block(auction_start, self.cosignerData.auctionTargetBlock);
			scaling = tighten_scaling(scaling, self.cosignerData.scalingOverride)?;
		}

		let block = ctx.env.number_u256();
		if block < auction_start {
			return Err(ReactorError::OrderNotFillable(auction_start));
		}

		let wad = U256::from(WAD);
		let curve = self.priceCurve.to_curve()?;
		let exact_in = self.is_exact_in();
		let scaling = if exact_in {
			nonlinear_decay(&curve, scaling, auction_start, block, wad, U256::MAX, Rounding::Up)?
		} else {
			nonlinear_decay(&curve, scaling, auction_start, block, U256::ZERO, wad, Rounding::Down)?
		};

		let priority_fee = priority_fee_above(&ctx.env, self.baselinePriorityFeeWei)?;
		let mps = self.mpsPerPriorityFeeWei;

		let input_amount = if exact_in {
			self.input.maxAmount
		} else {
			let scaled = mul_div_down(self.input.maxAmount, scaling, wad)?;
			scale_input(scaled, priority_fee, mps)?
		};
		let input = InputToken::new(self.input.token, input_amount, self.input.maxAmount);

		let outputs = self
			.outputs
			.iter()
			.map(|output| {
				let amount = if exact_in {
					let scaled = mul_div_up(output.minAmount, scaling, wad)?;
					scale_output(scaled, priority_fee, mps)?
				} else {
					output.minAmount
				};
				Ok(
					OutputToken::new(output.token, amount, output.recipient)
						.flagged(output.isFeeOutput),
				)
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(resolved(&self.info, input, outputs, order_hash))
	}
}
