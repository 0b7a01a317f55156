//! Dutch orders: amounts decay linearly over a timestamp window.
//!
//! Either the input or the outputs may decay, never both. Outputs decay
//! downwards and inputs upwards, so the swapper's terms only worsen as the
//! auction runs.

use crate::codec::OrderKind;
use crate::math::decay::{decay_input, decay_output};
use crate::payload::{resolved, OrderPayload, ResolveContext};
use crate::{abi, typed};
use alloy::primitives::{Address, B256, U256};
use reactor_types::{InputToken, OutputToken, ReactorError, ResolvedOrder, Result};

/// Checks shared by every timestamp-decayed order.
pub(crate) fn validate_dutch(
	deadline: U256,
	decay_start: U256,
	decay_end: U256,
	input: &abi::DutchInput,
	outputs: &[abi::DutchOutput],
) -> Result<()> {
	if decay_end < decay_start {
		return Err(ReactorError::EndTimeBeforeStartTime);
	}
	if deadline < decay_end {
		return Err(ReactorError::DeadlineBeforeEndTime);
	}
	if input.startAmount != input.endAmount
		&& outputs
			.iter()
			.any(|output| output.startAmount != output.endAmount)
	{
		return Err(ReactorError::InputAndOutputDecay);
	}
	Ok(())
}

/// Decays the input and outputs at `now`.
pub(crate) fn decay_legs(
	input: &abi::DutchInput,
	outputs: &[abi::DutchOutput],
	decay_start: U256,
	decay_end: U256,
	now: U256,
) -> Result<(InputToken, Vec<OutputToken>)> {
	let input_amount = decay_input(
		input.startAmount,
		input.endAmount,
		decay_start,
		decay_end,
		now,
	)?;
	let input = InputToken::new(input.token, input_amount, input.endAmount);

	let outputs = outputs
		.iter()
		.map(|output| {
			let amount = decay_output(
				output.startAmount,
				output.endAmount,
				decay_start,
				decay_end,
				now,
			)?;
			Ok(
				OutputToken::new(output.token, amount, output.recipient)
					.flagged(output.isFeeOutput),
			)
		})
		.collect::<Result<Vec<_>>>()?;

	Ok((input, outputs))
}

impl OrderPayload for abi::DutchOrder {
	const KIND: OrderKind = OrderKind::Dutch;
	type Typed = typed::DutchOrder;

	fn typed(&self) -> typed::DutchOrder {
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
		let (input, outputs) = decay_legs(
			&self.input,
			&self.outputs,
			self.decayStartTime,
			self.decayEndTime,
			ctx.env.timestamp_u256(),
		)?;
		Ok(resolved(&self.info, input, outputs, order_hash))
	}
}
