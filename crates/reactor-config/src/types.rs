//! Configuration types for a reactor deployment.

use reactor_fees::FeeModel;
use reactor_order::OrderKind;
use reactor_types::{address, Address};
use serde::{Deserialize, Serialize};

/// Canonical Permit2 deployment address.
pub const CANONICAL_PERMIT2: Address = address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorConfig {
	pub reactor: ReactorSection,
	#[serde(default)]
	pub permit2: Permit2Section,
	#[serde(default)]
	pub fees: FeesSection,
	/// Storage backend table, see `reactor_storage::create_storage`.
	#[serde(default = "default_storage")]
	pub storage: toml::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorSection {
	/// Address orders must be bound to.
	pub address: Address,
	/// Account allowed to change the fee controller and fee recipient.
	pub owner: Address,
	pub chain_id: u64,
	/// Order families accepted. Empty accepts every family.
	#[serde(default)]
	pub order_types: Vec<OrderKind>,
	/// Defaults to the owner.
	#[serde(default)]
	pub protocol_fee_recipient: Option<Address>,
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

impl ReactorSection {
	pub fn accepted_kinds(&self) -> Vec<OrderKind> {
		if self.order_types.is_empty() {
			OrderKind::ALL.to_vec()
		} else {
			self.order_types.clone()
		}
	}

	pub fn protocol_fee_recipient(&self) -> Address {
		self.protocol_fee_recipient.unwrap_or(self.owner)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permit2Section {
	pub address: Address,
}

impl Default for Permit2Section {
	fn default() -> Self {
		Self {
			address: CANONICAL_PERMIT2,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeesSection {
	#[serde(default)]
	pub model: FeeModel,
	/// Protocol fee controller table. Absent means no protocol fees.
	#[serde(default)]
	pub controller: Option<toml::Value>,
}

fn default_event_capacity() -> usize {
	1024
}

fn default_storage() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}
