//! Fixed-price limit orders.

use crate::codec::OrderKind;
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, U256};
use reactor_types::{InputToken, OutputToken, ReactorError, ResolvedOrder, Result};

impl OrderPayload for abi::LimitOrder {
	const KIND: OrderKind = OrderKind::Limit;
	type Typed = typed::LimitOrder;

	fn typed(&self) -> typed::LimitOrder {
		self.into()
	}

	fn info(&self) -> &abi::OrderInfo {
		&self.info
	}

	fn permitted(&self) -> (Address, U256) {
		(self.input.token, self.input.maxAmount)
	}

	fn resolve(&self, order_hash: B256, _ctx: &ResolveContext) -> Result<ResolvedOrder> {
		if self.input.amount > self.input.maxAmount {
			return Err(ReactorError::InvalidAmount {
				requested: self.input.amount,
				permitted: self.input.maxAmount,
			});
		}

		let input = InputToken::new(self.input.token, self.input.amount, self.input.maxAmount);
		let outputs = self
			.outputs
			.iter()
			.map(|output| {
				OutputToken::new(output.token, output.amount, output.recipient)
					.flagged(output.isFeeOutput)
			})
			.collect();

		Ok(resolved(&self.info, input, outputs, order_hash))
	}
}
