//! Settlement fixtures: a funded reactor, a swapper key and filler contracts.

use crate::callback::{CallbackContext, ReactorCallback};
use crate::reactor::Reactor;
use crate::signing::sign_order;
use reactor_account::{AccountInterface, LocalWallet};
use reactor_fees::{FeeModel, ProtocolFeeController};
use reactor_order::{abi, OrderPayload};
use reactor_permit::TokenLedger;
use reactor_types::{Address, BlockEnv, ResolvedOrder, SignedOrder, NATIVE, U256};

pub const CHAIN_ID: u64 = 1;
pub const NOW: u64 = 1_700_000_000;
pub const BLOCK: u64 = 20_000_000;

pub fn reactor() -> Address {
	Address::repeat_byte(0x11)
}

pub fn owner() -> Address {
	Address::repeat_byte(0x0a)
}

pub fn permit2() -> Address {
	Address::repeat_byte(0x02)
}

pub fn filler() -> Address {
	Address::repeat_byte(0x33)
}

pub fn token_a() -> Address {
	Address::repeat_byte(0xaa)
}

pub fn token_b() -> Address {
	Address::repeat_byte(0xbb)
}

pub fn e18(v: u64) -> U256 {
	U256::from(v) * U256::from(1_000_000_000_000_000_000u64)
}

/// Gives `swapper` 10e18 of token A approved to Permit2.
pub fn seed_swapper(ledger: &mut TokenLedger, swapper: Address) {
	ledger.mint(token_a(), swapper, e18(10)).unwrap();
	ledger.approve(token_a(), swapper, permit2(), U256::MAX);
}

/// Gives `filler` 10e18 of token B approved to the reactor and 5e18 native.
pub fn seed_filler(ledger: &mut TokenLedger, filler: Address) {
	ledger.mint(token_b(), filler, e18(10)).unwrap();
	ledger.approve(token_b(), filler, reactor(), U256::MAX);
	ledger.mint(NATIVE, filler, e18(5)).unwrap();
}

pub fn order_info(swapper: Address, nonce: u64) -> abi::OrderInfo {
	abi::OrderInfo {
		reactor: reactor(),
		swapper,
		nonce: U256::from(nonce),
		deadline: U256::from(NOW + 100),
		..Default::default()
	}
}

/// 1e18 of token A for 2e18 of token B.
pub fn limit_order(swapper: Address, nonce: u64) -> abi::LimitOrder {
	abi::LimitOrder {
		info: order_info(swapper, nonce),
		input: abi::InputToken {
			token: token_a(),
			amount: e18(1),
			maxAmount: e18(1),
		},
		outputs: vec![abi::OutputToken {
			token: token_b(),
			amount: e18(2),
			recipient: swapper,
			isFeeOutput: false,
		}],
	}
}

/// A reactor where the swapper holds 10e18 of token A approved to Permit2,
/// and the filler holds 10e18 of token B approved to the reactor plus 5e18
/// native currency.
pub struct Harness {
	pub reactor: Reactor,
	pub wallet: LocalWallet,
	pub env: BlockEnv,
}

impl Harness {
	pub fn new() -> Self {
		let mut harness = Self {
			reactor: Reactor::new(reactor(), owner(), permit2()),
			wallet: LocalWallet::random(),
			env: BlockEnv::new(CHAIN_ID, BLOCK, NOW),
		};
		let swapper = harness.swapper();
		seed_swapper(harness.reactor.ledger_mut(), swapper);
		harness.fund_filler(filler());
		harness
	}

	pub fn with_controller(mut self, controller: Box<dyn ProtocolFeeController>) -> Self {
		self.reactor = self.reactor.with_fee_controller(controller);
		self
	}

	pub fn with_fee_model(mut self, fee_model: FeeModel) -> Self {
		self.reactor = self.reactor.with_fee_model(fee_model);
		self
	}

	pub fn fund_filler(&mut self, filler: Address) {
		seed_filler(self.reactor.ledger_mut(), filler);
	}

	pub fn swapper(&self) -> Address {
		self.wallet.address()
	}

	pub fn env_at(&self, timestamp: u64) -> BlockEnv {
		BlockEnv::new(CHAIN_ID, BLOCK, timestamp)
	}

	pub fn balance(&self, token: Address, owner: Address) -> U256 {
		self.reactor.ledger().balance_of(token, owner)
	}

	pub fn info(&self, nonce: u64) -> abi::OrderInfo {
		order_info(self.swapper(), nonce)
	}

	pub fn limit(&self, nonce: u64) -> abi::LimitOrder {
		limit_order(self.swapper(), nonce)
	}

	/// 1e18 of token A for token B decaying over `[NOW, NOW + 100]`.
	pub fn dutch(&self, nonce: u64, start: U256, end: U256) -> abi::DutchOrder {
		abi::DutchOrder {
			info: self.info(nonce),
			decayStartTime: U256::from(NOW),
			decayEndTime: U256::from(NOW + 100),
			input: abi::DutchInput {
				token: token_a(),
				startAmount: e18(1),
				endAmount: e18(1),
			},
			outputs: vec![abi::DutchOutput {
				token: token_b(),
				startAmount: start,
				endAmount: end,
				recipient: self.swapper(),
				isFeeOutput: false,
			}],
		}
	}

	/// Exclusive until `NOW + 10`, then 2e18 decaying to 1e18 by `NOW + 100`.
	pub fn exclusive_dutch(
		&self,
		nonce: u64,
		exclusive: Address,
		override_bps: u64,
	) -> abi::ExclusiveDutchOrder {
		abi::ExclusiveDutchOrder {
			info: self.info(nonce),
			decayStartTime: U256::from(NOW + 10),
			decayEndTime: U256::from(NOW + 100),
			exclusiveFiller: exclusive,
			exclusivityOverrideBps: U256::from(override_bps),
			input: abi::DutchInput {
				token: token_a(),
				startAmount: e18(1),
				endAmount: e18(1),
			},
			outputs: vec![abi::DutchOutput {
				token: token_b(),
				startAmount: e18(2),
				endAmount: e18(1),
				recipient: self.swapper(),
				isFeeOutput: false,
			}],
		}
	}

	pub fn sign<P: OrderPayload>(&self, payload: &P) -> SignedOrder {
		sign_with(&self.wallet, payload)
	}
}

pub fn sign_with<P: OrderPayload>(wallet: &LocalWallet, payload: &P) -> SignedOrder {
	sign_order(payload, wallet, CHAIN_ID, permit2()).unwrap()
}

/// Buys the batch's output tokens from a market maker during the callback.
pub struct SourcingFiller {
	maker: Address,
	amount: U256,
	pub calls: usize,
	pub seen_orders: usize,
	pub seen_data: Vec<u8>,
	pub input_at_callback: U256,
}

impl SourcingFiller {
	pub fn new(maker: Address, amount: U256) -> Self {
		Self {
			maker,
			amount,
			calls: 0,
			seen_orders: 0,
			seen_data: Vec::new(),
			input_at_callback: U256::ZERO,
		}
	}
}

impl ReactorCallback for SourcingFiller {
	fn reactor_callback(
		&mut self,
		orders: &[ResolvedOrder],
		data: &[u8],
		ctx: &mut CallbackContext<'_>,
	) -> Result<(), String> {
		self.calls += 1;
		self.seen_orders = orders.len();
		self.seen_data = data.to_vec();
		self.input_at_callback = ctx.balance_of(token_a(), ctx.filler());
		ctx.transfer_from(token_b(), self.maker, self.amount)
			.map_err(|e| e.to_string())
	}
}

pub struct FailingFiller;

impl ReactorCallback for FailingFiller {
	fn reactor_callback(
		&mut self,
		_orders: &[ResolvedOrder],
		_data: &[u8],
		_ctx: &mut CallbackContext<'_>,
	) -> Result<(), String> {
		Err("no route".to_string())
	}
}

/// Sends a fixed amount of native currency to the reactor.
pub struct NativeFiller(pub U256);

impl ReactorCallback for NativeFiller {
	fn reactor_callback(
		&mut self,
		_orders: &[ResolvedOrder],
		_data: &[u8],
		ctx: &mut CallbackContext<'_>,
	) -> Result<(), String> {
		ctx.send_native_to_reactor(self.0)
			.map_err(|e| e.to_string())
	}
}
