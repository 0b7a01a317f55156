//! EIP-712 typed structures the swapper's signature commits to.
//!
//! These mirror the wire structs in [`crate::abi`] but flatten or omit fields
//! the way each order family defines its hash: cosigner data and
//! cosignatures are never hashed, so a cosigner can adjust an order without
//! invalidating the swapper's signature.

use crate::abi;
use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolStruct;

/// Permit2's token permission type, part of every witness type string.
pub const TOKEN_PERMISSIONS_TYPE: &str = "TokenPermissions(address token,uint256 amount)";

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
	struct OutputToken {
		address token;
		uint256 amount;
		address recipient;
		bool isFeeOutput;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct LimitOrder {
		OrderInfo info;
		address inputToken;
		uint256 inputAmount;
		uint256 inputMaxAmount;
		OutputToken[] outputs;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct DutchOutput {
		address token;
		uint256 startAmount;
		uint256 endAmount;
		address recipient;
		bool isFeeOutput;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct DutchOrder {
		OrderInfo info;
		uint256 decayStartTime;
		uint256 decayEndTime;
		address inputToken;
		uint256 inputStartAmount;
		uint256 inputEndAmount;
		DutchOutput[] outputs;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct ExclusiveDutchOrder {
		OrderInfo info;
		uint256 decayStartTime;
		uint256 decayEndTime;
		address exclusiveFiller;
		uint256 exclusivityOverrideBps;
		address inputToken;
		uint256 inputStartAmount;
		uint256 inputEndAmount;
		DutchOutput[] outputs;
	}

	#[derive(Debug, Default, PartialEq, Eq)]
	struct V2DutchOrder {
		OrderInfo info;
		address cosigner;
		address baseInputToken;
		uint256 baseInputStartAmount;
		uint256 baseInputEndAmount;
		DutchOutput[] baseOutputs;
	}

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
	struct V3DutchOrder {
		OrderInfo info;
		address cosigner;
		uint256 startingBaseFee;
		V3DutchInput baseInput;
		V3DutchOutput[] baseOutputs;
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
	struct PriorityOrder {
		OrderInfo info;
		address cosigner;
		uint256 auctionStartBlock;
		uint256 baselinePriorityFeeWei;
		PriorityInput input;
		PriorityOutput[] outputs;
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
	}
}

/// EIP-712 struct hash of an order, used as the order hash.
pub fn order_hash<T: SolStruct>(order: &T) -> B256 {
	order.eip712_hash_struct()
}

/// Permit2 witness type string for an order family:
/// `"<Root> witness)"` followed by every referenced type, sorted.
pub fn witness_type<T: SolStruct>() -> String {
	let mut types: Vec<String> = T::eip712_components()
		.into_iter()
		.map(|component| component.into_owned())
		.collect();
	types.push(T::eip712_root_type().into_owned());
	types.push(TOKEN_PERMISSIONS_TYPE.to_string());
	types.sort();
	types.dedup();
	format!("{} witness){}", T::NAME, types.concat())
}

impl From<&abi::OrderInfo> for OrderInfo {
	fn from(info: &abi::OrderInfo) -> Self {
		Self {
			reactor: info.reactor,
			swapper: info.swapper,
			nonce: info.nonce,
			deadline: info.deadline,
			additionalValidationContract: info.additionalValidationContract,
			additionalValidationData: info.additionalValidationData.clone(),
		}
	}
}

impl From<&abi::OutputToken> for OutputToken {
	fn from(output: &abi::OutputToken) -> Self {
		Self {
			token: output.token,
			amount: output.amount,
			recipient: output.recipient,
			isFeeOutput: output.isFeeOutput,
		}
	}
}

impl From<&abi::DutchOutput> for DutchOutput {
	fn from(output: &abi::DutchOutput) -> Self {
		Self {
			token: output.token,
			startAmount: output.startAmount,
			endAmount: output.endAmount,
			recipient: output.recipient,
			isFeeOutput: output.isFeeOutput,
		}
	}
}

impl From<&abi::NonlinearDutchDecay> for NonlinearDutchDecay {
	fn from(curve: &abi::NonlinearDutchDecay) -> Self {
		Self {
			relativeBlocks: curve.relativeBlocks,
			relativeAmounts: curve.relativeAmounts.clone(),
		}
	}
}

impl From<&abi::LimitOrder> for LimitOrder {
	fn from(order: &abi::LimitOrder) -> Self {
		Self {
			info: (&order.info).into(),
			inputToken: order.input.token,
			inputAmount: order.input.amount,
			inputMaxAmount: order.input.maxAmount,
			outputs: order.outputs.iter().map(Into::into).collect(),
		}
	}
}

impl From<&abi::DutchOrder> for DutchOrder {
	fn from(order: &abi::DutchOrder) -> Self {
		Self {
			info: (&order.info).into(),
			decayStartTime: order.decayStartTime,
			decayEndTime: order.decayEndTime,
			inputToken: order.input.token,
			inputStartAmount: order.input.startAmount,
			inputEndAmount: order.input.endAmount,
			outputs: order.outputs.iter().map(Into::into).collect(),
		}
	}
}

impl From<&abi::ExclusiveDutchOrder> for ExclusiveDutchOrder {
	fn from(order: &abi::ExclusiveDutchOrder) -> Self {
		Self {
			info: (&order.info).into(),
			decayStartTime: order.decayStartTime,
			decayEndTime: order.decayEndTime,
			exclusiveFiller: order.exclusiveFiller,
			exclusivityOverrideBps: order.exclusivityOverrideBps,
			inputToken: order.input.token,
			inputStartAmount: order.input.startAmount,
			inputEndAmount: order.input.endAmount,
			outputs: order.outputs.iter().map(Into::into).collect(),
		}
	}
}

impl From<&abi::V2DutchOrder> for V2DutchOrder {
	fn from(order: &abi::V2DutchOrder) -> Self {
		Self {
			info: (&order.info).into(),
			cosigner: order.cosigner,
			baseInputToken: order.baseInput.token,
			baseInputStartAmount: order.baseInput.startAmount,
			baseInputEndAmount: order.baseInput.endAmount,
			baseOutputs: order.baseOutputs.iter().map(Into::into).collect(),
		}
	}
}

impl From<&abi::V3DutchOrder> for V3DutchOrder {
	fn from(order: &abi::V3DutchOrder) -> Self {
		let input = &order.baseInput;
		Self {
			info: (&order.info).into(),
			cosigner: order.cosigner,
			startingBaseFee: order.startingBaseFee,
			baseInput: V3DutchInput {
				token: input.token,
				startAmount: input.startAmount,
				curve: (&input.curve).into(),
				maxAmount: input.maxAmount,
				adjustmentPerGweiBaseFee: input.adjustmentPerGweiBaseFee,
			},
			baseOutputs: order
				.baseOutputs
				.iter()
				.map(|output| V3DutchOutput {
					token: output.token,
					startAmount: output.startAmount,
					curve: (&output.curve).into(),
					recipient: output.recipient,
					minAmount: output.minAmount,
					adjustmentPerGweiBaseFee: output.adjustmentPerGweiBaseFee,
					isFeeOutput: output.isFeeOutput,
				})
				.collect(),
		}
	}
}

impl From<&abi::PriorityOrder> for PriorityOrder {
	fn from(order: &abi::PriorityOrder) -> Self {
		Self {
			info: (&order.info).into(),
			cosigner: order.cosigner,
			auctionStartBlock: order.auctionStartBlock,
			baselinePriorityFeeWei: order.baselinePriorityFeeWei,
			input: PriorityInput {
				token: order.input.token,
				amount: order.input.amount,
				mpsPerPriorityFeeWei: order.input.mpsPerPriorityFeeWei,
			},
			outputs: order
				.outputs
				.iter()
				.map(|output| PriorityOutput {
					token: output.token,
					amount: output.amount,
					mpsPerPriorityFeeWei: output.mpsPerPriorityFeeWei,
					recipient: output.recipient,
					isFeeOutput: output.isFeeOutput,
				})
				.collect(),
		}
	}
}

impl From<&abi::HybridOrder> for HybridOrder {
	fn from(order: &abi::HybridOrder) -> Self {
		Self {
			info: (&order.info).into(),
			cosigner: order.cosigner,
			input: HybridInput {
				token: order.input.token,
				maxAmount: order.input.maxAmount,
			},
			outputs: order
				.outputs
				.iter()
				.map(|output| HybridOutput {
					token: output.token,
					minAmount: output.minAmount,
					recipient: output.recipient,
					isFeeOutput: output.isFeeOutput,
				})
				.collect(),
			auctionStartBlock: order.auctionStartBlock,
			baselinePriorityFeeWei: order.baselinePriorityFeeWei,
			mpsPerPriorityFeeWei: order.mpsPerPriorityFeeWei,
			scalingFactor: order.scalingFactor,
			priceCurve: (&order.priceCurve).into(),
		}
	}
}
