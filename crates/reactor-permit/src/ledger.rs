//! In-memory token balances and allowances.
//!
//! Holds ERC20-style balances and allowances per token plus native currency
//! balances (keyed under [`NATIVE`]). Every failing operation leaves the
//! ledger untouched.

use alloy::primitives::{Address, U256};
use reactor_types::{ReactorError, Result, NATIVE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
	/// token -> owner -> balance
	balances: HashMap<Address, HashMap<Address, U256>>,
	/// token -> owner -> spender -> allowance
	allowances: HashMap<Address, HashMap<Address, HashMap<Address, U256>>>,
}

impl TokenLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn balance_of(&self, token: Address, owner: Address) -> U256 {
		self.balances
			.get(&token)
			.and_then(|owners| owners.get(&owner))
			.copied()
			.unwrap_or_default()
	}

	pub fn native_balance(&self, owner: Address) -> U256 {
		self.balance_of(NATIVE, owner)
	}

	pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
		self.allowances
			.get(&token)
			.and_then(|owners| owners.get(&owner))
			.and_then(|spenders| spenders.get(&spender))
			.copied()
			.unwrap_or_default()
	}

	/// Credits `amount` of `token` to `to` out of thin air.
	pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
		let balance = self.balance_of(token, to);
		let updated = balance
			.checked_add(amount)
			.ok_or(ReactorError::MathOverflow)?;
		self.set_balance(token, to, updated);
		Ok(())
	}

	pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
		self.allowances
			.entry(token)
			.or_default()
			.entry(owner)
			.or_default()
			.insert(spender, amount);
	}

	/// Moves `amount` of `token` from `from` to `to`.
	pub fn transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) -> Result<()> {
		let available = self.balance_of(token, from);
		if available < amount {
			return Err(ReactorError::InsufficientBalance {
				token,
				owner: from,
				needed: amount,
				available,
			});
		}
		if from == to || amount.is_zero() {
			return Ok(());
		}
		let received = self
			.balance_of(token, to)
			.checked_add(amount)
			.ok_or(ReactorError::MathOverflow)?;
		self.set_balance(token, from, available - amount);
		self.set_balance(token, to, received);
		Ok(())
	}

	/// Moves `amount` of `token` from `from` to `to` on behalf of `spender`,
	/// consuming allowance. An allowance of `U256::MAX` is never decreased.
	pub fn transfer_from(
		&mut self,
		token: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<()> {
		let allowance = self.allowance(token, from, spender);
		if spender != from && allowance < amount {
			return Err(ReactorError::InsufficientAllowance {
				token,
				owner: from,
				spender,
			});
		}
		self.transfer(token, from, to, amount)?;
		if spender != from && allowance != U256::MAX {
			self.approve(token, from, spender, allowance - amount);
		}
		Ok(())
	}

	fn set_balance(&mut self, token: Address, owner: Address, amount: U256) {
		self.balances.entry(token).or_default().insert(owner, amount);
	}
}
