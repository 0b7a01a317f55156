//! Priority orders: amounts scale with the settling transaction's priority fee.
//!
//! Fillers compete by bidding priority fee rather than by waiting for a
//! decay. Either the input shrinks or the outputs grow per wei of priority
//! fee above the order's baseline, never both.

use crate::codec::OrderKind;
use crate::cosigner::{cosigner_digest, tighten_start_block, verify_cosignature};
use crate::math::priority_fee::{priority_fee_above, scale_input, scale_output};
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolValue;
use reactor_types::{InputToken, OutputToken, ReactorError, ResolvedOrder, Result};

impl abi::PriorityOrder {
	/// Digest the cosigner signs for this order on `chain_id`.
	pub fn cosigner_digest(&self, chain_id: u64) -> B256 {
		cosigner_digest(
			self.order_hash(),
			chain_id,
			&self.cosignerData.abi_encode(),
		)
	}
}

impl OrderPayload for abi::PriorityOrder {
	const KIND: OrderKind = OrderKind::Priority;
	type Typed = typed::PriorityOrder;

	fn typed(&self) -> typed::PriorityOrder {
		self.into()
	}

	fn info(&self) -> &abi::OrderInfo {
		&self.info
	}

	fn permitted(&self) -> (Address, U256) {
		(self.input.token, self.input.amount)
	}

	fn resolve(&self, order_hash: B256, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		if !self.input.mpsPerPriorityFeeWei.is_zero()
			&& self
				.outputs
				.iter()
				.any(|output| !output.mpsPerPriorityFeeWei.is_zero())
		{
			return Err(ReactorError::InputOutputScaled);
		}

		// The cosignature only matters when it brings the auction forward.
		let target = self.cosignerData.auctionTargetBlock;
		let auction_start = tighten_start_block(self.auctionStartBlock, target);
		if auction_start != self.auctionStartBlock {
			let digest = cosigner_digest(
				order_hash,
				ctx.env.chain_id,
				&self.cosignerData.abi_encode(),
			);
			verify_cosignature(digest, &self.cosignature, self.cosigner)?;
		}
		if ctx.env.number_u256() < auction_start {
			return Err(ReactorError::OrderNotFillable(auction_start));
		}

		let priority_fee = priority_fee_above(&ctx.env, self.baselinePriorityFeeWei)?;

		let input = InputToken::new(
			self.input.token,
			scale_input(
				self.input.amount,
				priority_fee,
				self.input.mpsPerPriorityFeeWei,
			)?,
			self.input.amount,
		);
		let outputs = self
			.outputs
			.iter()
			.map(|output| {
				let amount = scale_output(output.amount, priority_fee, output.mpsPerPriorityFeeWei)?;
				Ok(
					OutputToken::new(output.token, amount, output.recipient)
						.flagged(output.isFeeOutput),
				)
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(resolved(&self.info, input, outputs, order_hash))
	}
}
