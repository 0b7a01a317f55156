//! Local private-key accounts backed by Alloy's signer.

use crate::{AccountError, AccountInterface};
use alloy::primitives::{Address, Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

/// Wallet holding its private key in memory.
///
/// Used for swappers signing Permit2 witness digests and for cosigners
/// signing their override data.
#[derive(Debug, Clone)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a wallet from a hex-encoded private key (with or without `0x`).
	pub fn from_hex(private_key_hex: &str) -> Result<Self, AccountError> {
		let key = private_key_hex
			.strip_prefix("0x")
			.unwrap_or(private_key_hex);

		if key.len() != 64 {
			return Err(AccountError::InvalidKey(
				"Private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}
		let bytes = hex::decode(key)
			.map_err(|e| AccountError::InvalidKey(format!("Invalid hex: {}", e)))?;

		let signer = PrivateKeySigner::from_slice(&bytes)
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;
		Ok(Self { signer })
	}

	/// Creates a wallet with a freshly generated key.
	pub fn random() -> Self {
		Self {
			signer: PrivateKeySigner::random(),
		}
	}
}

impl AccountInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError> {
		let signature = self
			.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		Ok(Bytes::from(signature.as_bytes().to_vec()))
	}
}
