//! Wire format of every order payload.
//!
//! A signed order's bytes are a one-byte type tag followed by
//! `abi.encode(payload)` of one of the structs below. Cosigned families carry
//! their cosigner data and cosignature on the wire, but those fields are not
//! part of the order hash (see [`crate::typed`]).
//!
//! Every output carries `isFeeOutput`, set by the order author to route that
//! leg into fee escrow. The flag is signed as part of the order hash.

use crate::math::nonlinear::NonlinearDecay;
use alloy::sol;
use reactor_types::{OrderInfo as ResolvedInfo, Result};

sol! {
	#[derive(Debug, Default, PartialEq, Eq)]
	struct OrderInfo {
		address reactor;
		address swapper;
		uint256 nonce;
		uint256 deadline;
		address additionalValidationContract;
		bytes additionalValidationData;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct InputToken {
		address token;
		uint256 amount;
		uint256 maxAmount;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct OutputToken {
		address token;
		uint256 amount;
		address recipient;
		bool isFeeOutput;
	}

	/// Fixed-price order.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct LimitOrder {
		OrderInfo info;
		InputToken input;
		OutputToken[] outputs;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct DutchInput {
		address token;
		uint256 startAmount;
		uint256 endAmount;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct DutchOutput {
		address token;
		uint256 startAmount;
		uint256 endAmount;
		address recipient;
		bool isFeeOutput;
	}

	/// Linear decay over a timestamp window.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct DutchOrder {
		OrderInfo info;
		uint256 decayStartTime;
		uint256 decayEndTime;
		DutchInput input;
		DutchOutput[] outputs;
	}

	/// Linear decay with an exclusive filler until the decay starts.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct ExclusiveDutchOrder {
		OrderInfo info;
		uint256 decayStartTime;
		uint256 decayEndTime;
		address exclusiveFiller;
		uint256 exclusivityOverrideBps;
		DutchInput input;
		DutchOutput[] outputs;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct CosignerData {
		uint256 decayStartTime;
		uint256 decayEndTime;
		address exclusiveFiller;
		uint256 exclusivityOverrideBps;
		uint256 inputOverride;
		uint256[] outputOverrides;
	}

	/// Cosigned linear decay.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct V2DutchOrder {
		OrderInfo info;
		address cosigner;
		DutchInput baseInput;
		DutchOutput[] baseOutputs;
		CosignerData cosignerData;
		bytes cosignature;
	}

	/// Block-keyed decay curve, 16-bit relative blocks packed lowest first.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct NonlinearDutchDecay {
		uint256 relativeBlocks;
		int256[] relativeAmounts;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct V3DutchInput {
		address token;
		uint256 startAmount;
		NonlinearDutchDecay curve;
		uint256 maxAmount;
		uint256 adjustmentPerGweiBaseFee;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct V3DutchOutput {
		address token;
		uint256 startAmount;
		NonlinearDutchDecay curve;
		address recipient;
		uint256 minAmount;
		uint256 adjustmentPerGweiBaseFee;
		bool isFeeOutput;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct V3CosignerData {
		uint256 decayStartBlock;
		address exclusiveFiller;
		uint256 exclusivityOverrideBps;
		uint256 inputOverride;
		uint256[] outputOverrides;
	}

	/// Cosigned block-based non-linear decay with base fee adjustment.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct V3DutchOrder {
		OrderInfo info;
		address cosigner;
		uint256 startingBaseFee;
		V3DutchInput baseInput;
		V3DutchOutput[] baseOutputs;
		V3CosignerData cosignerData;
		bytes cosignature;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct PriorityInput {
		address token;
		uint256 amount;
		uint256 mpsPerPriorityFeeWei;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct PriorityOutput {
		address token;
		uint256 amount;
		uint256 mpsPerPriorityFeeWei;
		address recipient;
		bool isFeeOutput;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct PriorityCosignerData {
		uint256 auctionTargetBlock;
	}

	/// Amounts scaled by the settling transaction's priority fee.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct PriorityOrder {
		OrderInfo info;
		address cosigner;
		uint256 auctionStartBlock;
		uint256 baselinePriorityFeeWei;
		PriorityInput input;
		PriorityOutput[] outputs;
		PriorityCosignerData cosignerData;
		bytes cosignature;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct HybridInput {
		address token;
		uint256 maxAmount;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct HybridOutput {
		address token;
		uint256 minAmount;
		address recipient;
		bool isFeeOutput;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct HybridCosignerData {
		uint256 auctionTargetBlock;
		uint256 scalingOverride;
	}

	/// Non-linear price curve combined with priority fee scaling.
	#[derive(Debug, Default, PartialEq, Eq)]
	struct HybridOrder {
		OrderInfo info;
		address cosigner;
		HybridInput input;
		HybridOutput[] outputs;
		uint256 auctionStartBlock;
		uint256 baselinePriorityFeeWei;
		uint256 mpsPerPriorityFeeWei;
		uint256 scalingFactor;
		NonlinearDutchDecay priceCurve;
		HybridCosignerData cosignerData;
		bytes cosignature;
	}
}

impl OrderInfo {
	/// Converts the wire envelope into the resolved order envelope.
	pub fn to_resolved(&self) -> ResolvedInfo {
		ResolvedInfo {
			reactor: self.reactor,
			swapper: self.swapper,
			nonce: self.nonce,
			deadline: self.deadline,
			additional_validation_contract: self.additionalValidationContract,
			additional_validation_data: self.additionalValidationData.clone(),
		}
	}
}

impl From<&ResolvedInfo> for OrderInfo {
	fn from(info: &ResolvedInfo) -> Self {
		Self {
			reactor: info.reactor,
			swapper: info.swapper,
			nonce: info.nonce,
			deadline: info.deadline,
			additionalValidationContract: info.additional_validation_contract,
			additionalValidationData: info.additional_validation_data.clone(),
		}
	}
}

impl NonlinearDutchDecay {
	/// Unpacks and validates the curve.
	pub fn to_curve(&self) -> Result<NonlinearDecay> {
		NonlinearDecay::from_packed(self.relativeBlocks, self.relativeAmounts.clone())
	}
}

impl From<&NonlinearDecay> for NonlinearDutchDecay {
	fn from(curve: &NonlinearDecay) -> Self {
		Self {
			relativeBlocks: curve.packed_blocks(),
			relativeAmounts: curve.relative_amounts.clone(),
		}
	}
}
