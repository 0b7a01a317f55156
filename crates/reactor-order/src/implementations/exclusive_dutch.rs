//! Dutch orders with an exclusive filler until the decay starts.

use super::dutch::{decay_legs, validate_dutch};
use crate::codec::OrderKind;
use crate::exclusivity::apply_override;
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, U256};
use reactor_types::{ResolvedOrder, Result};

impl OrderPayload for abi::ExclusiveDutchOrder {
	const KIND: OrderKind = OrderKind::ExclusiveDutch;
	type Typed = typed::ExclusiveDutchOrder;

	fn typed(&self) -> typed::ExclusiveDutchOrder {
		self.into()
	}

	fn info(&self) -> &abi::OrderInfo {
		&self.info
	}

	fn permitted(&self) -> (Address, U256) {
		(self.input.token, self.input.endAmount)
	}

	fn resolve(&self, order_hash: B256, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		validate_dutch(
			self.info.deadline,
			self.decayStartTime,
			self.decayEndTime,
			&self.input,
			&self.outputs,
		)?;
		let now = ctx.env.timestamp_u256();
		let (input, outputs) = decay_legs(
			&self.input,
			&self.outputs,
			self.decayStartTime,
			self.decayEndTime,
			now,
		)?;

		let mut order = resolved(&self.info, input, outputs, order_hash);
		apply_override(
			&mut order,
			self.exclusiveFiller,
			self.decayStartTime,
			self.exclusivityOverrideBps,
			now,
			ctx.filler,
		)?;
		Ok(order)
	}
}
