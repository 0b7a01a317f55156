//! Cosigned Dutch orders.
//!
//! The swapper signs the base amounts and the cosigner address. At fill time
//! the cosigner supplies the decay window, exclusivity terms and optional
//! amount overrides, all bound to the order hash by its signature.

use super::dutch::decay_legs;
use crate::codec::OrderKind;
use crate::cosigner::{cosigner_digest, tighten_input, tighten_outputs, verify_cosignature};
use crate::exclusivity::apply_override;
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolValue;
use reactor_types::{ReactorError, ResolvedOrder, Result};

impl abi::V2DutchOrder {
	/// Digest the cosigner signs for this order on `chain_id`.
	pub fn cosigner_digest(&self, chain_id: u64) -> B256 {
		cosigner_digest(
			self.order_hash(),
			chain_id,
			&self.cosignerData.abi_encode(),
		)
	}
}

impl OrderPayload for abi::V2DutchOrder {
	const KIND: OrderKind = OrderKind::V2Dutch;
	type Typed = typed::V2DutchOrder;

	fn typed(&self) -> typed::V2DutchOrder {
		self.into()
	}

	fn info(&self) -> &abi::OrderInfo {
		&self.info
	}

	fn permitted(&self) -> (Address, U256) {
		(self.baseInput.token, self.baseInput.endAmount)
	}

	fn resolve(&self, order_hash: B256, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		let cosigned = &self.cosignerData;
		if self.info.deadline < cosigned.decayEndTime {
			return Err(ReactorError::DeadlineBeforeEndTime);
		}
		let digest = cosigner_digest(order_hash, ctx.env.chain_id, &cosigned.abi_encode());
		verify_cosignature(digest, &self.cosignature, self.cosigner)?;

		let mut input = self.baseInput.clone();
		input.startAmount = tighten_input(input.startAmount, cosigned.inputOverride)?;

		let signed_starts: Vec<U256> = self
			.baseOutputs
			.iter()
			.map(|output| output.startAmount)
			.collect();
		let starts = tighten_outputs(&signed_starts, &cosigned.outputOverrides)?;
		let outputs: Vec<abi::DutchOutput> = self
			.baseOutputs
			.iter()
			.zip(starts)
			.map(|(output, start)| abi::DutchOutput {
				startAmount: start,
				..output.clone()
			})
			.collect();

		let now = ctx.env.timestamp_u256();
		let (input, outputs) = decay_legs(
			&input,
			&outputs,
			cosigned.decayStartTime,
			cosigned.decayEndTime,
			now,
		)?;

		let mut order = resolved(&self.info, input, outputs, order_hash);
		apply_override(
			&mut order,
			cosigned.exclusiveFiller,
			cosigned.decayStartTime,
			cosigned.exclusivityOverrideBps,
			now,
			ctx.filler,
		)?;
		Ok(order)
	}
}
