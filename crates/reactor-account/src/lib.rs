//! Signing accounts and signature recovery.
//!
//! Swappers and cosigners sign 32-byte digests (Permit2 witness digests and
//! cosigner digests). This crate provides the signing side through
//! [`AccountInterface`] and the verifying side through [`recover_signer`],
//! which mirrors `ecrecover` semantics: 65-byte `(r, s, v)` signatures with
//! `v` in `{27, 28}`, or 64-byte compact `(r, vs)` signatures.

use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use reactor_types::ReactorError;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

pub use implementations::local::LocalWallet;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Invalid signature length: {0}")]
	InvalidLength(usize),
	#[error("Invalid signature")]
	InvalidSignature,
}

impl From<AccountError> for ReactorError {
	fn from(error: AccountError) -> Self {
		match error {
			AccountError::InvalidLength(len) => ReactorError::InvalidSignatureLength(len),
			_ => ReactorError::InvalidSignature,
		}
	}
}

/// An account able to sign digests.
pub trait AccountInterface: Send + Sync {
	fn address(&self) -> Address;

	/// Signs a 32-byte digest without any message prefix.
	///
	/// Returns the 65-byte `(r, s, v)` encoding with `v` in `{27, 28}`.
	fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError>;
}

const COMPACT_PARITY_BIT: usize = 255;

/// Parses a raw signature the way `ecrecover`-based verification does.
pub fn parse_signature(sig: &[u8]) -> Result<Signature, AccountError> {
	match sig.len() {
		65 => {
			let r = U256::from_be_slice(&sig[..32]);
			let s = U256::from_be_slice(&sig[32..64]);
			let parity = match sig[64] {
				27 => false,
				28 => true,
				_ => return Err(AccountError::InvalidSignature),
			};
			Ok(Signature::new(r, s, parity))
		}
		64 => {
			let r = U256::from_be_slice(&sig[..32]);
			let vs = U256::from_be_slice(&sig[32..]);
			let parity = vs.bit(COMPACT_PARITY_BIT);
			let mut s = vs;
			s.set_bit(COMPACT_PARITY_BIT, false);
			Ok(Signature::new(r, s, parity))
		}
		len => Err(AccountError::InvalidLength(len)),
	}
}

/// Recovers the address that signed `hash`.
pub fn recover_signer(hash: &B256, sig: &[u8]) -> Result<Address, AccountError> {
	let signature = parse_signature(sig)?;
	let signer = signature
		.recover_address_from_prehash(hash)
		.map_err(|_| AccountError::InvalidSignature)?;
	if signer == Address::ZERO {
		return Err(AccountError::InvalidSignature);
	}
	Ok(signer)
}

/// Checks that `sig` over `hash` was produced by `expected`.
///
/// Malformed signatures surface as `InvalidSignature`/`InvalidSignatureLength`,
/// a well-formed signature from anyone else as `InvalidSigner`.
pub fn verify_signer(hash: &B256, sig: &[u8], expected: Address) -> Result<(), ReactorError> {
	let signer = recover_signer(hash, sig)?;
	if signer != expected {
		return Err(ReactorError::InvalidSigner);
	}
	Ok(())
}
