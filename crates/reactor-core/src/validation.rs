//! Order envelope checks and additional validation contracts.

use reactor_order::exclusivity::increase_outputs_bps;
use reactor_types::{Address, OrderInfo, ReactorError, ResolvedOrder, Result, U256};
use std::collections::HashMap;
use tracing::debug;

/// Rejects orders bound to another reactor or past their deadline.
pub fn validate_order_info(info: &OrderInfo, reactor: Address, now: U256) -> Result<()> {
	if info.reactor != reactor {
		return Err(ReactorError::InvalidReactor);
	}
	if info.deadline < now {
		return Err(ReactorError::DeadlinePassed);
	}
	Ok(())
}

/// Answer of an additional validation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationVerdict {
	/// Plain accept or reject.
	Valid(bool),
	/// Accept, provided every genuine output grows by this many bps.
	OutputIncreaseBps(u64),
}

/// A custom validation contract an order can name in its envelope.
pub trait AdditionalValidation: Send + Sync {
	/// Judges `order` for `filler`. An `Err` counts as a revert.
	fn validate(
		&self,
		filler: Address,
		order: &ResolvedOrder,
	) -> std::result::Result<ValidationVerdict, String>;
}

/// Validation contracts known to the reactor, by address.
#[derive(Default)]
pub struct ValidationRegistry {
	contracts: HashMap<Address, Box<dyn AdditionalValidation>>,
}

impl ValidationRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `validation` under `contract`, replacing any previous one.
	pub fn register(&mut self, contract: Address, validation: Box<dyn AdditionalValidation>) {
		self.contracts.insert(contract, validation);
	}

	pub fn contains(&self, contract: Address) -> bool {
		self.contracts.contains_key(&contract)
	}

	/// Runs the order's validation contract, if it names one.
	pub fn validate(&self, filler: Address, order: &mut ResolvedOrder) -> Result<()> {
		if !order.info.has_additional_validation() {
			return Ok(());
		}
		let contract = order.info.additional_validation_contract;
		let validation = self
			.contracts
			.get(&contract)
			.ok_or(ReactorError::ValidationContractNotFound(contract))?;

		match validation
			.validate(filler, order)
			.map_err(ReactorError::ValidationFailed)?
		{
			ValidationVerdict::Valid(true) => Ok(()),
			ValidationVerdict::Valid(false) => Err(ReactorError::ValidationFailed(format!(
				"rejected by {}",
				contract
			))),
			ValidationVerdict::OutputIncreaseBps(0) => Ok(()),
			ValidationVerdict::OutputIncreaseBps(bps) => {
				debug!(order_hash = %order.hash, %contract, bps, "Validation requires output increase");
				increase_outputs_bps(order, bps)
			}
		}
	}
}
