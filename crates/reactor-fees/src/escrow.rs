//! Escrowed fee ledger shared between the protocol and interfaces.
//!
//! Captured fee outputs are paid to the reactor itself and credited here.
//! The protocol share lives under [`FeeRecipient::Protocol`], which resolves
//! to whoever is the protocol fee recipient when the claim happens, so
//! rotating the recipient never moves balances.
//!
//! Claims leave one unit behind in the slot. Balances of one or less have
//! nothing to claim.

use crate::FeeMarking;
use alloy::primitives::{Address, U256};
use reactor_order::math::{mul_div_down, BPS};
use reactor_types::{ReactorError, ResolvedOrder, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Units left in a ledger slot after a claim.
pub const CLAIM_RESIDUE: u64 = 1;

/// Owner of an escrowed fee bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRecipient {
	/// Whoever is the protocol fee recipient at claim time.
	Protocol,
	Interface(Address),
}

impl FeeRecipient {
	/// The bucket `caller` is entitled to claim from.
	pub fn for_caller(caller: Address, protocol_fee_recipient: Address) -> Self {
		if caller == protocol_fee_recipient {
			FeeRecipient::Protocol
		} else {
			FeeRecipient::Interface(caller)
		}
	}
}

/// One ledger slot, the persisted form of [`FeeEscrow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBalance {
	pub token: Address,
	pub recipient: FeeRecipient,
	pub amount: U256,
}

/// token -> recipient -> stored amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FeeBalance>", into = "Vec<FeeBalance>")]
pub struct FeeEscrow {
	balances: HashMap<Address, HashMap<FeeRecipient, U256>>,
}

impl FeeEscrow {
	pub fn new() -> Self {
		Self::default()
	}

	/// Raw stored amount, including any claim residue.
	pub fn stored(&self, token: Address, recipient: FeeRecipient) -> U256 {
		self.balances
			.get(&token)
			.and_then(|recipients| recipients.get(&recipient))
			.copied()
			.unwrap_or_default()
	}

	pub fn claimable(&self, token: Address, recipient: FeeRecipient) -> U256 {
		self.stored(token, recipient)
			.saturating_sub(U256::from(CLAIM_RESIDUE))
	}

	pub fn credit(&mut self, token: Address, recipient: FeeRecipient, amount: U256) -> Result<()> {
		if amount.is_zero() {
			return Ok(());
		}
		let slot = self
			.balances
			.entry(token)
			.or_default()
			.entry(recipient)
			.or_default();
		*slot = slot.checked_add(amount).ok_or(ReactorError::MathOverflow)?;
		Ok(())
	}

	/// Redirects the order's fee outputs to `custody` and credits them.
	///
	/// `protocol_fee_bps` of each fee output (rounded down) goes to the
	/// protocol bucket, the rest to the output's nominal recipient. Returns
	/// the number of outputs captured.
	pub fn capture(
		&mut self,
		order: &mut ResolvedOrder,
		custody: Address,
		protocol_fee_bps: u64,
		marking: FeeMarking,
	) -> Result<usize> {
		if protocol_fee_bps > BPS {
			return Err(ReactorError::InvalidBps(protocol_fee_bps));
		}

		let last = order.outputs.len().checked_sub(1);
		let mut captured = 0;
		for (index, output) in order.outputs.iter_mut().enumerate() {
			let is_fee = match marking {
				FeeMarking::Flagged => output.is_fee_output,
				FeeMarking::LastOutput => index > 0 && Some(index) == last,
			};
			if !is_fee {
				continue;
			}

			let protocol_share = mul_div_down(
				output.amount,
				U256::from(protocol_fee_bps),
				U256::from(BPS),
			)?;
			let interface_share = output.amount - protocol_share;
			self.credit(output.token, FeeRecipient::Protocol, protocol_share)?;
			self.credit(
				output.token,
				FeeRecipient::Interface(output.recipient),
				interface_share,
			)?;

			debug!(
				order_hash = %order.hash,
				token = %output.token,
				interface = %output.recipient,
				%protocol_share,
				%interface_share,
				"Fee output captured"
			);
			output.recipient = custody;
			output.is_fee_output = true;
			captured += 1;
		}
		Ok(captured)
	}

	/// Debits everything above the residue from `recipient`'s bucket.
	///
	/// The slot is reduced before the caller moves any tokens, so a second
	/// claim in the same call finds nothing.
	pub fn claim(&mut self, token: Address, recipient: FeeRecipient) -> Result<U256> {
		let residue = U256::from(CLAIM_RESIDUE);
		let slot = self
			.balances
			.get_mut(&token)
			.and_then(|recipients| recipients.get_mut(&recipient))
			.ok_or(ReactorError::NothingToClaim)?;
		if *slot <= residue {
			return Err(ReactorError::NothingToClaim);
		}
		let amount = *slot - residue;
		*slot = residue;
		Ok(amount)
	}

	pub fn is_empty(&self) -> bool {
		self.balances
			.values()
			.all(|recipients| recipients.values().all(|amount| amount.is_zero()))
	}
}

impl From<Vec<FeeBalance>> for FeeEscrow {
	fn from(entries: Vec<FeeBalance>) -> Self {
		let mut escrow = FeeEscrow::new();
		for entry in entries {
			escrow
				.balances
				.entry(entry.token)
				.or_default()
				.insert(entry.recipient, entry.amount);
		}
		escrow
	}
}

impl From<FeeEscrow> for Vec<FeeBalance> {
	fn from(escrow: FeeEscrow) -> Self {
		let mut entries: Vec<FeeBalance> = escrow
			.balances
			.into_iter()
			.flat_map(|(token, recipients)| {
				recipients
					.into_iter()
					.map(move |(recipient, amount)| FeeBalance {
						token,
						recipient,
						amount,
					})
			})
			.collect();
		entries.sort_by(|a, b| (a.token, a.recipient).cmp(&(b.token, b.recipient)));
		entries
	}
}
