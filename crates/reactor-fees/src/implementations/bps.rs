//! Basis-point protocol fee controller.
//!
//! Charges a per-token rate on the genuine outputs of every order, paid to a
//! single recipient. Tokens without an explicit rate use the default rate.

use crate::{ProtocolFeeController, MAX_FEE_BPS};
use alloy::primitives::{Address, U256};
use reactor_order::math::{mul_div_down, BPS};
use reactor_types::{
	parse_address, ConfigSchema, Field, FieldType, OutputToken, ResolvedOrder, Schema,
	ValidationError,
};
use std::collections::HashMap;

pub struct BpsFeeController {
	recipient: Address,
	default_bps: u64,
	token_bps: HashMap<Address, u64>,
}

impl BpsFeeController {
	pub fn new(recipient: Address, default_bps: u64) -> Self {
		Self {
			recipient,
			default_bps,
			token_bps: HashMap::new(),
		}
	}

	/// Overrides the rate charged on `token`.
	pub fn with_token_bps(mut self, token: Address, bps: u64) -> Self {
		self.token_bps.insert(token, bps);
		self
	}

	pub fn recipient(&self) -> Address {
		self.recipient
	}

	pub fn bps_for(&self, token: Address) -> u64 {
		self.token_bps
			.get(&token)
			.copied()
			.unwrap_or(self.default_bps)
	}

	/// Builds a controller from its TOML table.
	///
	/// Configuration parameters:
	/// - `recipient`: address receiving the fee legs
	/// - `default_bps`: rate for tokens without an override (default: 0)
	/// - `token_bps`: table of token address to rate
	pub fn from_config(config: &toml::Value) -> Result<Self, ValidationError> {
		BpsFeeControllerSchema.validate(config)?;

		let recipient = config
			.get("recipient")
			.and_then(|v| v.as_str())
			.ok_or_else(|| ValidationError::MissingField("recipient".into()))
			.and_then(|raw| {
				parse_address(raw).map_err(|message| ValidationError::InvalidValue {
					field: "recipient".into(),
					message,
				})
			})?;
		let default_bps = config
			.get("default_bps")
			.and_then(|v| v.as_integer())
			.unwrap_or(0) as u64;

		let mut controller = Self::new(recipient, default_bps);
		if let Some(table) = config.get("token_bps").and_then(|v| v.as_table()) {
			for (token, bps) in table {
				let token = parse_address(token).map_err(|message| ValidationError::InvalidValue {
					field: format!("token_bps.{}", token),
					message,
				})?;
				controller = controller.with_token_bps(token, bps.as_integer().unwrap_or(0) as u64);
			}
		}
		Ok(controller)
	}
}

/// Configuration schema for BpsFeeController.
pub struct BpsFeeControllerSchema;

impl ConfigSchema for BpsFeeControllerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new("recipient", FieldType::Address)],
			// Optional fields
			vec![
				Field::new("default_bps", FieldType::Bps { max: MAX_FEE_BPS }),
				Field::new(
					"token_bps",
					FieldType::AddressMap(Box::new(FieldType::Bps { max: MAX_FEE_BPS })),
				),
			],
		);

		schema.validate(config)
	}
}

impl ProtocolFeeController for BpsFeeController {
	fn name(&self) -> &str {
		"bps"
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(BpsFeeControllerSchema)
	}

	fn get_fee_outputs(&self, order: &ResolvedOrder) -> Vec<OutputToken> {
		// Totals per token, in order of first appearance.
		let mut totals: Vec<(Address, U256)> = Vec::new();
		for output in order.trade_outputs() {
			match totals.iter_mut().find(|(token, _)| *token == output.token) {
				Some((_, total)) => *total = total.saturating_add(output.amount),
				None => totals.push((output.token, output.amount)),
			}
		}

		totals
			.into_iter()
			.filter_map(|(token, total)| {
				let bps = self.bps_for(token);
				if bps == 0 {
					return None;
				}
				let fee = mul_div_down(total, U256::from(bps), U256::from(BPS)).ok()?;
				(!fee.is_zero()).then(|| OutputToken::fee(token, fee, self.recipient))
			})
			.collect()
	}
}
