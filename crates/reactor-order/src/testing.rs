//! Shared fixtures for resolver tests.

use crate::abi;
use crate::payload::ResolveContext;
use alloy::primitives::{Address, U256};
use reactor_types::BlockEnv;

pub const E18: u64 = 1_000_000_000_000_000_000;
pub const CHAIN_ID: u64 = 1;
pub const NOW: u64 = 1_700_000_000;
pub const BLOCK: u64 = 20_000_000;

pub fn reactor() -> Address {
	Address::repeat_byte(0x11)
}

pub fn swapper() -> Address {
	Address::repeat_byte(0x22)
}

pub fn filler() -> Address {
	Address::repeat_byte(0x33)
}

pub fn token_in() -> Address {
	Address::repeat_byte(0xaa)
}

pub fn token_out() -> Address {
	Address::repeat_byte(0xbb)
}

pub fn u(v: u64) -> U256 {
	U256::from(v)
}

pub fn e18(v: u64) -> U256 {
	U256::from(v) * U256::from(E18)
}

pub fn env() -> BlockEnv {
	BlockEnv::new(CHAIN_ID, BLOCK, NOW)
}

pub fn ctx() -> ResolveContext {
	ResolveContext::new(env(), filler())
}

pub fn ctx_at(env: BlockEnv) -> ResolveContext {
	ResolveContext::new(env, filler())
}

pub fn info(nonce: U256) -> abi::OrderInfo {
	abi::OrderInfo {
		reactor: reactor(),
		swapper: swapper(),
		nonce,
		deadline: u(NOW + 1_000),
		..Default::default()
	}
}

pub fn limit_order(nonce: U256) -> abi::LimitOrder {
	abi::LimitOrder {
		info: info(nonce),
		input: abi::InputToken {
			token: token_in(),
			amount: e18(1),
			maxAmount: e18(1),
		},
		outputs: vec![abi::OutputToken {
			token: token_out(),
			amount: e18(2),
			recipient: swapper(),
			isFeeOutput: false,
		}],
	}
}

pub fn dutch_output(start: U256, end: U256) -> abi::DutchOutput {
	abi::DutchOutput {
		token: token_out(),
		startAmount: start,
		endAmount: end,
		recipient: swapper(),
		isFeeOutput: false,
	}
}

pub fn dutch_input(start: U256, end: U256) -> abi::DutchInput {
	abi::DutchInput {
		token: token_in(),
		startAmount: start,
		endAmount: end,
	}
}
