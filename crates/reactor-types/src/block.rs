//! Block environment a settlement call executes against.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Chain and transaction context visible to a settlement call.
///
/// Reactors never read a clock themselves. Every time-, block- or
/// fee-dependent computation reads from this struct so that resolution is
/// deterministic for a given environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnv {
	/// Chain id, bound into cosignatures and Permit2 domains.
	pub chain_id: u64,
	/// Current block number.
	pub number: u64,
	/// Current block timestamp in seconds.
	pub timestamp: u64,
	/// Block base fee in wei.
	pub basefee: U256,
	/// Effective gas price paid by the settling transaction in wei.
	pub gas_price: U256,
}

impl BlockEnv {
	/// Creates an environment with zero fees.
	pub fn new(chain_id: u64, number: u64, timestamp: u64) -> Self {
		Self {
			chain_id,
			number,
			timestamp,
			basefee: U256::ZERO,
			gas_price: U256::ZERO,
		}
	}

	pub fn with_fees(mut self, basefee: U256, gas_price: U256) -> Self {
		self.basefee = basefee;
		self.gas_price = gas_price;
		self
	}

	pub fn timestamp_u256(&self) -> U256 {
		U256::from(self.timestamp)
	}

	pub fn number_u256(&self) -> U256 {
		U256::from(self.number)
	}

	/// Priority fee of the settling transaction (`gas_price - basefee`).
	///
	/// Returns `None` when the gas price is below the base fee, which no
	/// valid transaction can have.
	pub fn priority_fee(&self) -> Option<U256> {
		self.gas_price.checked_sub(self.basefee)
	}

	/// Advances the environment by the given number of blocks and seconds.
	pub fn advance(mut self, blocks: u64, seconds: u64) -> Self {
		self.number += blocks;
		self.timestamp += seconds;
		self
	}
}
