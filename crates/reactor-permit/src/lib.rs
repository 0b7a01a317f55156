//! Signature-based token transfers for the settlement reactors.
//!
//! Swappers never approve a reactor directly. They approve a transfer
//! authority once, then sign a witness transfer per order that binds the
//! token, maximum amount, nonce, deadline, spending reactor and the order
//! hash. [`Permit2`] verifies those signatures, enforces at-most-once nonces
//! through an unordered bitmap and moves tokens on a [`TokenLedger`].

use alloy::primitives::{keccak256, Address, B256, U256};
use alloy::sol_types::{Eip712Domain, SolValue};
use reactor_types::{BlockEnv, ReactorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub mod ledger;

pub use ledger::TokenLedger;

/// EIP-712 domain name of the transfer authority.
pub const PERMIT2_NAME: &str = "Permit2";

const TOKEN_PERMISSIONS_TYPE: &str = "TokenPermissions(address token,uint256 amount)";
const PERMIT_WITNESS_TRANSFER_FROM_STUB: &str = "PermitWitnessTransferFrom(TokenPermissions permitted,address spender,uint256 nonce,uint256 deadline,";

/// Token and maximum amount a swapper authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPermissions {
	pub token: Address,
	pub amount: U256,
}

/// The signed part of a witness transfer, minus the spender and witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitTransferFrom {
	pub permitted: TokenPermissions,
	pub nonce: U256,
	pub deadline: U256,
}

/// Where the tokens go and how many of the permitted amount are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureTransferDetails {
	pub to: Address,
	pub requested_amount: U256,
}

/// A witness the signed transfer commits to, typically an order hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Witness<'a> {
	pub hash: B256,
	/// Type string of the witness, starting with `"<Type> witness)"`.
	pub type_string: &'a str,
}

/// The transfer authorization service reactors consume.
pub trait SignatureTransfer: Send + Sync {
	/// Address swappers approve on the token ledger.
	fn address(&self) -> Address;

	/// Verifies `sig` from `owner` over the permit, spender and witness, then
	/// consumes the nonce and transfers `details.requested_amount` to
	/// `details.to`. Nothing changes unless every check passes.
	#[allow(clippy::too_many_arguments)]
	fn permit_witness_transfer_from(
		&mut self,
		ledger: &mut TokenLedger,
		env: &BlockEnv,
		spender: Address,
		permit: &PermitTransferFrom,
		details: &SignatureTransferDetails,
		owner: Address,
		witness: Witness<'_>,
		sig: &[u8],
	) -> Result<()>;

	/// Marks every nonce whose bit is set in `mask` within word `word_pos`.
	fn invalidate_unordered_nonces(&mut self, owner: Address, word_pos: U256, mask: U256);

	fn is_nonce_used(&self, owner: Address, nonce: U256) -> bool;
}

/// Splits a nonce into its bitmap word position and bit index.
pub fn bitmap_positions(nonce: U256) -> (U256, usize) {
	let word_pos = nonce >> 8;
	let bit_pos = (nonce & U256::from(0xffu64)).to::<usize>();
	(word_pos, bit_pos)
}

/// The EIP-712 domain of a transfer authority deployment.
pub fn permit2_domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
	Eip712Domain {
		name: Some(PERMIT2_NAME.into()),
		version: None,
		chain_id: Some(U256::from(chain_id)),
		verifying_contract: Some(verifying_contract),
		salt: None,
	}
}

/// Digest a swapper signs to authorize a witness transfer.
pub fn witness_transfer_digest(
	domain: &Eip712Domain,
	permit: &PermitTransferFrom,
	spender: Address,
	witness: Witness<'_>,
) -> B256 {
	let type_hash = keccak256(
		format!("{}{}", PERMIT_WITNESS_TRANSFER_FROM_STUB, witness.type_string).as_bytes(),
	);
	let token_permissions_hash = keccak256(
		(
			keccak256(TOKEN_PERMISSIONS_TYPE.as_bytes()),
			permit.permitted.token,
			permit.permitted.amount,
		)
			.abi_encode(),
	);
	let struct_hash = keccak256(
		(
			type_hash,
			token_permissions_hash,
			spender,
			permit.nonce,
			permit.deadline,
			witness.hash,
		)
			.abi_encode(),
	);

	let mut preimage = Vec::with_capacity(66);
	preimage.extend_from_slice(&[0x19, 0x01]);
	preimage.extend_from_slice(domain.separator().as_slice());
	preimage.extend_from_slice(struct_hash.as_slice());
	keccak256(preimage)
}

/// Unordered nonce bitmaps: owner -> word position -> bitmap.
pub type NonceBitmaps = HashMap<Address, HashMap<U256, U256>>;

/// One non-empty bitmap word, the persisted form of [`NonceBitmaps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceWord {
	pub owner: Address,
	pub word_pos: U256,
	pub bitmap: U256,
}

/// In-process transfer authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permit2 {
	address: Address,
	nonce_bitmap: NonceBitmaps,
}

impl Permit2 {
	pub fn new(address: Address) -> Self {
		Self {
			address,
			nonce_bitmap: HashMap::new(),
		}
	}

	/// Rebuilds an authority from persisted nonce words.
	pub fn from_words(address: Address, words: impl IntoIterator<Item = NonceWord>) -> Self {
		let mut permit2 = Self::new(address);
		for word in words {
			permit2.invalidate_unordered_nonces(word.owner, word.word_pos, word.bitmap);
		}
		permit2
	}

	/// Every non-empty bitmap word, sorted for stable persistence.
	pub fn words(&self) -> Vec<NonceWord> {
		let mut words: Vec<NonceWord> = self
			.nonce_bitmap
			.iter()
			.flat_map(|(owner, bitmaps)| {
				bitmaps
					.iter()
					.filter(|(_, bitmap)| !bitmap.is_zero())
					.map(|(word_pos, bitmap)| NonceWord {
						owner: *owner,
						word_pos: *word_pos,
						bitmap: *bitmap,
					})
			})
			.collect();
		words.sort_by(|a, b| (a.owner, a.word_pos).cmp(&(b.owner, b.word_pos)));
		words
	}

	pub fn nonce_bitmap(&self, owner: Address, word_pos: U256) -> U256 {
		self.nonce_bitmap
			.get(&owner)
			.and_then(|words| words.get(&word_pos))
			.copied()
			.unwrap_or_default()
	}

	/// Self-service cancellation of a single nonce.
	pub fn cancel(&mut self, owner: Address, nonce: U256) {
		let (word_pos, bit_pos) = bitmap_positions(nonce);
		self.invalidate_unordered_nonces(owner, word_pos, U256::from(1u8) << bit_pos);
	}

	fn use_unordered_nonce(&mut self, owner: Address, nonce: U256) -> Result<()> {
		let (word_pos, bit_pos) = bitmap_positions(nonce);
		let bit = U256::from(1u8) << bit_pos;
		let word = self
			.nonce_bitmap
			.entry(owner)
			.or_default()
			.entry(word_pos)
			.or_default();
		if *word & bit != U256::ZERO {
			return Err(ReactorError::InvalidNonce);
		}
		*word |= bit;
		Ok(())
	}
}

impl SignatureTransfer for Permit2 {
	fn address(&self) -> Address {
		self.address
	}

	fn permit_witness_transfer_from(
		&mut self,
		ledger: &mut TokenLedger,
		env: &BlockEnv,
		spender: Address,
		permit: &PermitTransferFrom,
		details: &SignatureTransferDetails,
		owner: Address,
		witness: Witness<'_>,
		sig: &[u8],
	) -> Result<()> {
		if env.timestamp_u256() > permit.deadline {
			return Err(ReactorError::SignatureExpired(permit.deadline));
		}
		if details.requested_amount > permit.permitted.amount {
			return Err(ReactorError::InvalidAmount {
				requested: details.requested_amount,
				permitted: permit.permitted.amount,
			});
		}
		if self.is_nonce_used(owner, permit.nonce) {
			return Err(ReactorError::InvalidNonce);
		}

		let domain = permit2_domain(env.chain_id, self.address);
		let digest = witness_transfer_digest(&domain, permit, spender, witness);
		reactor_account::verify_signer(&digest, sig, owner)?;

		ledger.transfer_from(
			permit.permitted.token,
			self.address,
			owner,
			details.to,
			details.requested_amount,
		)?;
		self.use_unordered_nonce(owner, permit.nonce)?;

		debug!(
			%owner,
			nonce = %permit.nonce,
			token = %permit.permitted.token,
			amount = %details.requested_amount,
			to = %details.to,
			"Witness transfer executed"
		);
		Ok(())
	}

	fn invalidate_unordered_nonces(&mut self, owner: Address, word_pos: U256, mask: U256) {
		let word = self
			.nonce_bitmap
			.entry(owner)
			.or_default()
			.entry(word_pos)
			.or_default();
		*word |= mask;
		debug!(%owner, %word_pos, %mask, "Unordered nonces invalidated");
	}

	fn is_nonce_used(&self, owner: Address, nonce: U256) -> bool {
		let (word_pos, bit_pos) = bitmap_positions(nonce);
		self.nonce_bitmap(owner, word_pos).bit(bit_pos)
	}
}
