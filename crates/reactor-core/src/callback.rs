//! Filler callbacks.
//!
//! In callback mode the reactor hands the resolved batch to the filler after
//! collecting every input and before disbursing any output. The filler gets
//! a [`CallbackContext`] scoped to its own account on the token ledger. It
//! has no handle on the reactor, so it cannot start another settlement
//! from inside the callback.

use reactor_permit::TokenLedger;
use reactor_types::{Address, ResolvedOrder, Result, NATIVE, U256};

/// How the caller takes part in a settlement.
pub enum FillMode<'a> {
	/// The caller receives inputs and pays outputs from its own balances.
	DirectTaker,
	/// The caller is a filler contract called back with the resolved batch.
	ViaCallback {
		callback: &'a mut dyn ReactorCallback,
		data: &'a [u8],
	},
}

impl FillMode<'_> {
	/// Label used in logs.
	pub fn name(&self) -> &'static str {
		match self {
			FillMode::DirectTaker => "direct_taker",
			FillMode::ViaCallback { .. } => "via_callback",
		}
	}
}

/// A filler contract.
///
/// Success means returning `Ok`. The reactor does not inspect any return
/// value; output transfers that follow fail on their own if the filler did
/// not arrange enough tokens.
pub trait ReactorCallback: Send {
	/// Called once per settlement with every resolved order of the batch and
	/// the caller's opaque `data`.
	fn reactor_callback(
		&mut self,
		orders: &[ResolvedOrder],
		data: &[u8],
		ctx: &mut CallbackContext<'_>,
	) -> std::result::Result<(), String>;
}

/// The filler's view of the token ledger during a callback.
pub struct CallbackContext<'a> {
	ledger: &'a mut TokenLedger,
	filler: Address,
	reactor: Address,
}

impl<'a> CallbackContext<'a> {
	pub(crate) fn new(ledger: &'a mut TokenLedger, filler: Address, reactor: Address) -> Self {
		Self {
			ledger,
			filler,
			reactor,
		}
	}

	/// The filler contract's own address.
	pub fn filler(&self) -> Address {
		self.filler
	}

	/// Address outputs are pulled by.
	pub fn reactor(&self) -> Address {
		self.reactor
	}

	pub fn balance_of(&self, token: Address, owner: Address) -> U256 {
		self.ledger.balance_of(token, owner)
	}

	/// Sends the filler's tokens to `to`.
	pub fn transfer(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
		self.ledger.transfer(token, self.filler, to, amount)
	}

	/// Sends native currency to the reactor to cover native outputs.
	pub fn send_native_to_reactor(&mut self, amount: U256) -> Result<()> {
		self.ledger.transfer(NATIVE, self.filler, self.reactor, amount)
	}

	/// Approves `spender` to pull the filler's tokens.
	pub fn approve(&mut self, token: Address, spender: Address, amount: U256) {
		self.ledger.approve(token, self.filler, spender, amount);
	}

	/// Pulls tokens `from` has approved the filler to spend.
	pub fn transfer_from(&mut self, token: Address, from: Address, amount: U256) -> Result<()> {
		self.ledger
			.transfer_from(token, self.filler, from, self.filler, amount)
	}
}
