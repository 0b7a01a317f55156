//! Cosigner verification and override tightening.
//!
//! Cosigned order families let a trusted party adjust the swapper's signed
//! bounds at fill time. The cosigner signs
//! `keccak256(order_hash ++ uint256(chain_id) ++ abi.encode(cosigner_data))`
//! and every override goes through one of the `tighten_*` functions below,
//! which only ever move a bound in the swapper's favour.

use alloy::primitives::{keccak256, Address, B256, U256};
use reactor_types::{ReactorError, Result};

/// 1.0 in 18-decimal fixed point.
pub const WAD: u64 = 1_000_000_000_000_000_000;

/// Digest the cosigner signs over.
pub fn cosigner_digest(order_hash: B256, chain_id: u64, encoded_cosigner_data: &[u8]) -> B256 {
	let mut preimage = Vec::with_capacity(64 + encoded_cosigner_data.len());
	preimage.extend_from_slice(order_hash.as_slice());
	preimage.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
	preimage.extend_from_slice(encoded_cosigner_data);
	keccak256(preimage)
}

/// Checks that `cosignature` over `digest` recovers to `cosigner`.
///
/// Every failure, malformed signatures included, is `InvalidCosignature`.
pub fn verify_cosignature(digest: B256, cosignature: &[u8], cosigner: Address) -> Result<()> {
	match reactor_account::recover_signer(&digest, cosignature) {
		Ok(signer) if signer == cosigner => Ok(()),
		_ => Err(ReactorError::InvalidCosignature),
	}
}

/// Applies a cosigner input override. Zero keeps the signed amount, any
/// other value must not exceed it.
pub fn tighten_input(signed: U256, cosigner_override: U256) -> Result<U256> {
	if cosigner_override.is_zero() {
		return Ok(signed);
	}
	if cosigner_override > signed {
		return Err(ReactorError::InvalidCosignerInput);
	}
	Ok(cosigner_override)
}

/// Applies a cosigner output override. Zero keeps the signed amount, any
/// other value must not be below it.
pub fn tighten_output(signed: U256, cosigner_override: U256) -> Result<U256> {
	if cosigner_override.is_zero() {
		return Ok(signed);
	}
	if cosigner_override < signed {
		return Err(ReactorError::InvalidCosignerOutput);
	}
	Ok(cosigner_override)
}

/// Applies per-output overrides. An empty override list keeps every signed
/// amount, otherwise it must have exactly one entry per output.
pub fn tighten_outputs(signed: &[U256], overrides: &[U256]) -> Result<Vec<U256>> {
	if overrides.is_empty() {
		return Ok(signed.to_vec());
	}
	if overrides.len() != signed.len() {
		return Err(ReactorError::InvalidCosignerOutput);
	}
	signed
		.iter()
		.zip(overrides)
		.map(|(amount, cosigner_override)| tighten_output(*amount, *cosigner_override))
		.collect()
}

/// Applies a cosigner override of a WAD scaling factor.
///
/// Factors at or above 1.0 scale outputs, so an override may only raise
/// them. Factors below 1.0 scale the input, so an override may only lower
/// them. Zero keeps the signed factor.
pub fn tighten_scaling(signed: U256, cosigner_override: U256) -> Result<U256> {
	if cosigner_override.is_zero() {
		return Ok(signed);
	}
	let wad = U256::from(WAD);
	if signed >= wad {
		if cosigner_override < signed {
			return Err(ReactorError::InvalidCosignerOutput);
		}
	} else if cosigner_override > signed {
		return Err(ReactorError::InvalidCosignerInput);
	}
	Ok(cosigner_override)
}

/// Applies a cosigner target block that may only bring an auction forward.
pub fn tighten_start_block(signed: U256, target: U256) -> U256 {
	if !target.is_zero() && target < signed {
		target
	} else {
		signed
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reactor_account::{AccountInterface, LocalWallet};

	fn u(v: u64) -> U256 {
		U256::from(v)
	}

	#[test]
	fn test_cosignature_roundtrip() {
		let cosigner = LocalWallet::random();
		let digest = cosigner_digest(B256::repeat_byte(1), 1, &[0u8; 64]);
		let sig = cosigner.sign_hash(&digest).unwrap();

		assert!(verify_cosignature(digest, &sig, cosigner.address()).is_ok());
		assert_eq!(
			verify_cosignature(digest, &sig, Address::repeat_byte(5)),
			Err(ReactorError::InvalidCosignature)
		);
		assert_eq!(
			verify_cosignature(digest, &sig[..10], cosigner.address()),
			Err(ReactorError::InvalidCosignature)
		);
	}

	#[test]
	fn test_digest_binds_chain_id() {
		let data = [7u8; 32];
		assert_ne!(
			cosigner_digest(B256::ZERO, 1, &data),
			cosigner_digest(B256::ZERO, 2, &data)
		);
	}

	#[test]
	fn test_tighten_input() {
		assert_eq!(tighten_input(u(100), U256::ZERO).unwrap(), u(100));
		assert_eq!(tighten_input(u(100), u(90)).unwrap(), u(90));
		assert_eq!(
			tighten_input(u(100), u(101)),
			Err(ReactorError::InvalidCosignerInput)
		);
	}

	#[test]
	fn test_tighten_outputs() {
		assert_eq!(tighten_outputs(&[u(10), u(20)], &[]).unwrap(), vec![u(10), u(20)]);
		assert_eq!(
			tighten_outputs(&[u(10), u(20)], &[U256::ZERO, u(25)]).unwrap(),
			vec![u(10), u(25)]
		);
		assert_eq!(
			tighten_outputs(&[u(10), u(20)], &[u(11)]),
			Err(ReactorError::InvalidCosignerOutput)
		);
		assert_eq!(
			tighten_outputs(&[u(10), u(20)], &[u(11), u(19)]),
			Err(ReactorError::InvalidCosignerOutput)
		);
	}

	#[test]
	fn test_tighten_scaling() {
		let wad = u(WAD);
		let up = wad + u(1);
		assert_eq!(tighten_scaling(up, up + u(5)).unwrap(), up + u(5));
		assert_eq!(
			tighten_scaling(up, wad),
			Err(ReactorError::InvalidCosignerOutput)
		);
		let down = wad - u(10);
		assert_eq!(tighten_scaling(down, down - u(1)).unwrap(), down - u(1));
		assert_eq!(
			tighten_scaling(down, wad),
			Err(ReactorError::InvalidCosignerInput)
		);
	}

	#[test]
	fn test_tighten_start_block() {
		assert_eq!(tighten_start_block(u(100), U256::ZERO), u(100));
		assert_eq!(tighten_start_block(u(100), u(90)), u(90));
		assert_eq!(tighten_start_block(u(100), u(110)), u(100));
	}
}
