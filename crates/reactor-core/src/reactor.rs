//! The settlement engine shared by every order family.
//!
//! A settlement call moves through fixed phases:
//!
//! 1. resolve every order (decay, cosigner overrides, exclusivity)
//! 2. inject protocol fees and capture escrowed fee outputs
//! 3. validate the envelope and any additional validation contract
//! 4. pull each input through the transfer authority, which checks the
//!    swapper's signature and consumes the nonce
//! 5. call the filler back, in callback mode
//! 6. disburse every output and record a fill per order
//! 7. refund native currency the outputs did not use
//!
//! Any error restores the world as it was before the call. Events are only
//! published once the call has committed.

use crate::callback::{CallbackContext, FillMode, ReactorCallback};
use crate::validation::{validate_order_info, AdditionalValidation, ValidationRegistry};
use crate::world::{World, WorldSnapshot};
use arc_swap::ArcSwapOption;
use reactor_fees::{
	inject_fees, FeeEscrow, FeeMarking, FeeModel, FeeRecipient, ProtocolFeeController,
};
use reactor_order::{OrderKind, OrderService, ResolveContext};
use reactor_permit::{
	Permit2, PermitTransferFrom, SignatureTransfer, SignatureTransferDetails, TokenLedger,
	TokenPermissions, Witness,
};
use reactor_types::{
	Address, BlockEnv, EventBus, Fill, ReactorError, ReactorEvent, ResolvedOrder, Result,
	SignedOrder, NATIVE, U256,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Settles signed orders against an in-process world of token balances,
/// Permit2 nonces and escrowed fees.
pub struct Reactor {
	/// Address orders must name as their reactor. Also the custody address
	/// for escrowed fees and native value received during a call.
	address: Address,
	/// Only address allowed to change the fee controller and recipient.
	owner: Address,
	/// Resolvers for the order families this reactor accepts.
	orders: OrderService,
	/// State rolled back as a whole when a call fails.
	world: World,
	/// How fee outputs are paid out or escrowed.
	fee_model: FeeModel,
	/// Loaded once per call, so a swap never affects a call in flight.
	fee_controller: ArcSwapOption<Box<dyn ProtocolFeeController>>,
	/// Claims the protocol bucket of the fee escrow.
	protocol_fee_recipient: Address,
	/// Additional validation contracts, keyed by address.
	validations: ValidationRegistry,
	/// Fills and admin changes, published after commit.
	events: EventBus,
}

impl Reactor {
	/// Creates a reactor accepting every order family, with no protocol fee
	/// controller. The owner starts out as the protocol fee recipient.
	pub fn new(address: Address, owner: Address, permit2: Address) -> Self {
		Self {
			address,
			owner,
			orders: OrderService::all(),
			world: World::new(permit2),
			fee_model: FeeModel::default(),
			fee_controller: ArcSwapOption::empty(),
			protocol_fee_recipient: owner,
			validations: ValidationRegistry::new(),
			events: EventBus::default(),
		}
	}

	/// Restricts the reactor to the given order families.
	pub fn with_order_kinds(mut self, kinds: &[OrderKind]) -> Self {
		self.orders = OrderService::with_kinds(kinds);
		self
	}

	/// Sets the fee model.
	pub fn with_fee_model(mut self, fee_model: FeeModel) -> Self {
		self.fee_model = fee_model;
		self
	}

	/// Installs a protocol fee controller.
	pub fn with_fee_controller(self, controller: Box<dyn ProtocolFeeController>) -> Self {
		self.fee_controller.store(Some(Arc::new(controller)));
		self
	}

	/// Sets who claims the protocol share of escrowed fees.
	pub fn with_protocol_fee_recipient(mut self, recipient: Address) -> Self {
		self.protocol_fee_recipient = recipient;
		self
	}

	/// Publishes events on a shared bus instead of a private one.
	pub fn with_event_bus(mut self, events: EventBus) -> Self {
		self.events = events;
		self
	}

	/// Address the reactor settles as.
	pub fn address(&self) -> Address {
		self.address
	}

	/// Address allowed to run admin operations.
	pub fn owner(&self) -> Address {
		self.owner
	}

	/// The fee model in force.
	pub fn fee_model(&self) -> FeeModel {
		self.fee_model
	}

	/// Current claimant of the protocol fee bucket.
	pub fn protocol_fee_recipient(&self) -> Address {
		self.protocol_fee_recipient
	}

	/// Name of the installed protocol fee controller, if any.
	pub fn fee_controller_name(&self) -> Option<String> {
		self.fee_controller
			.load_full()
			.map(|controller| controller.name().to_string())
	}

	/// Whether orders of `kind` can be settled here.
	pub fn accepts(&self, kind: OrderKind) -> bool {
		self.orders.accepts(kind)
	}

	/// Token balances and allowances.
	pub fn ledger(&self) -> &TokenLedger {
		&self.world.ledger
	}

	/// Direct access to balances and allowances outside of settlement.
	pub fn ledger_mut(&mut self) -> &mut TokenLedger {
		&mut self.world.ledger
	}

	/// The transfer authority holding swapper nonces.
	pub fn permit2(&self) -> &Permit2 {
		&self.world.permit2
	}

	/// Fees captured under the escrow split model.
	pub fn escrow(&self) -> &FeeEscrow {
		&self.world.escrow
	}

	/// Bus the reactor publishes on.
	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// Receives every event published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<ReactorEvent> {
		self.events.subscribe()
	}

	/// Whether `nonce` was filled or cancelled by `swapper`.
	pub fn is_nonce_used(&self, swapper: Address, nonce: U256) -> bool {
		self.world.permit2.is_nonce_used(swapper, nonce)
	}

	/// Persistable copy of the world.
	pub fn snapshot(&self) -> WorldSnapshot {
		self.world.snapshot()
	}

	/// Replaces the world with a persisted snapshot.
	pub fn restore(&mut self, snapshot: WorldSnapshot) {
		let permit2 = self.world.permit2_address();
		self.world = World::from_snapshot(permit2, snapshot);
	}

	/// Makes `validation` callable for orders naming `contract` as their
	/// additional validation contract.
	pub fn register_validation(
		&mut self,
		contract: Address,
		validation: Box<dyn AdditionalValidation>,
	) {
		self.validations.register(contract, validation);
	}

	/// Settles one order with the caller as direct taker.
	pub fn execute(
		&mut self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		order: SignedOrder,
	) -> Result<Vec<Fill>> {
		self.settle(env, caller, value, &[order], FillMode::DirectTaker)
	}

	/// Settles several orders with the caller as direct taker. All of them
	/// settle or none do.
	pub fn execute_batch(
		&mut self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		orders: &[SignedOrder],
	) -> Result<Vec<Fill>> {
		self.settle(env, caller, value, orders, FillMode::DirectTaker)
	}

	/// Settles one order, calling `callback` once inputs have been
	/// collected so the filler can source the outputs.
	pub fn execute_with_callback(
		&mut self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		order: SignedOrder,
		callback: &mut dyn ReactorCallback,
		data: &[u8],
	) -> Result<Vec<Fill>> {
		self.settle(
			env,
			caller,
			value,
			&[order],
			FillMode::ViaCallback { callback, data },
		)
	}

	/// Settles several orders with a single callback for the whole batch.
	pub fn execute_batch_with_callback(
		&mut self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		orders: &[SignedOrder],
		callback: &mut dyn ReactorCallback,
		data: &[u8],
	) -> Result<Vec<Fill>> {
		self.settle(
			env,
			caller,
			value,
			orders,
			FillMode::ViaCallback { callback, data },
		)
	}

	/// Settles `orders` atomically.
	///
	/// `value` is native currency the caller sends along; whatever the
	/// outputs do not use is refunded.
	pub fn settle(
		&mut self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		orders: &[SignedOrder],
		mode: FillMode<'_>,
	) -> Result<Vec<Fill>> {
		if orders.is_empty() {
			return Err(ReactorError::EmptyBatch);
		}

		let mode_name = mode.name();
		let checkpoint = self.world.clone();
		match self.try_settle(env, caller, value, orders, mode) {
			Ok(fills) => {
				self.events
					.publish_all(fills.iter().cloned().map(ReactorEvent::Fill));
				Ok(fills)
			}
			Err(error) => {
				self.world = checkpoint;
				warn!(
					%caller,
					orders = orders.len(),
					mode = mode_name,
					%error,
					"Settlement reverted"
				);
				Err(error)
			}
		}
	}

	fn try_settle(
		&mut self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		orders: &[SignedOrder],
		mode: FillMode<'_>,
	) -> Result<Vec<Fill>> {
		let controller = self.fee_controller.load_full();
		let native_baseline = self.world.ledger.native_balance(self.address);
		if !value.is_zero() {
			self.world
				.ledger
				.transfer(NATIVE, caller, self.address, value)?;
		}

		let ctx = ResolveContext::new(*env, caller);
		let mut resolved = Vec::with_capacity(orders.len());
		for signed in orders {
			let mut order = self.orders.resolve(signed, &ctx)?;
			self.prepare(
				&mut order,
				controller.as_deref().map(|boxed| &**boxed),
				env,
				caller,
			)?;
			resolved.push(order);
		}
		debug!(orders = resolved.len(), mode = mode.name(), "Inputs collected");

		if let FillMode::ViaCallback { callback, data } = mode {
			let mut ctx = CallbackContext::new(&mut self.world.ledger, caller, self.address);
			callback
				.reactor_callback(&resolved, data, &mut ctx)
				.map_err(ReactorError::CallbackFailed)?;
		}

		let mut retained = U256::ZERO;
		let mut fills = Vec::with_capacity(resolved.len());
		for order in &resolved {
			self.disburse(order, caller, native_baseline, &mut retained)?;

			let fill = Fill {
				order_hash: order.hash,
				filler: caller,
				swapper: order.info.swapper,
				nonce: order.info.nonce,
			};
			info!(
				order_hash = %fill.order_hash,
				filler = %fill.filler,
				swapper = %fill.swapper,
				nonce = %fill.nonce,
				fee_outputs = order.fee_outputs().count(),
				"Order filled"
			);
			fills.push(fill);
		}

		self.refund_native(caller, native_baseline, retained)?;
		Ok(fills)
	}

	/// Fees, validation and input collection for one resolved order.
	fn prepare(
		&mut self,
		order: &mut ResolvedOrder,
		controller: Option<&dyn ProtocolFeeController>,
		env: &BlockEnv,
		caller: Address,
	) -> Result<()> {
		let escrow = match self.fee_model {
			FeeModel::ProtocolController => None,
			FeeModel::EscrowSplit {
				protocol_fee_bps,
				marking,
			} => Some((protocol_fee_bps, marking)),
		};

		// The last-output convention names one of the swapper's own legs, so
		// it is captured before injected legs are appended.
		if let Some((protocol_fee_bps, FeeMarking::LastOutput)) = escrow {
			self.world.escrow.capture(
				order,
				self.address,
				protocol_fee_bps,
				FeeMarking::LastOutput,
			)?;
		}
		if let Some(controller) = controller {
			inject_fees(order, controller)?;
		}
		if let Some((protocol_fee_bps, FeeMarking::Flagged)) = escrow {
			self.world.escrow.capture(
				order,
				self.address,
				protocol_fee_bps,
				FeeMarking::Flagged,
			)?;
		}

		validate_order_info(&order.info, self.address, env.timestamp_u256())?;
		self.validations.validate(caller, order)?;

		let World {
			ledger, permit2, ..
		} = &mut self.world;
		let permit = PermitTransferFrom {
			permitted: TokenPermissions {
				token: order.input.token,
				amount: order.input.max_amount,
			},
			nonce: order.info.nonce,
			deadline: order.info.deadline,
		};
		let details = SignatureTransferDetails {
			to: caller,
			requested_amount: order.input.amount,
		};
		permit2.permit_witness_transfer_from(
			ledger,
			env,
			self.address,
			&permit,
			&details,
			order.info.swapper,
			Witness {
				hash: order.hash,
				type_string: &order.witness_type,
			},
			&order.sig,
		)
	}

	fn disburse(
		&mut self,
		order: &ResolvedOrder,
		caller: Address,
		native_baseline: U256,
		retained: &mut U256,
	) -> Result<()> {
		// Every native leg of the order must be covered before any is paid.
		if order.native_owed() > self.native_available(native_baseline, *retained) {
			return Err(ReactorError::NativeTransferFailed);
		}
		for output in &order.outputs {
			if output.is_native() {
				self.pay_native(output.recipient, output.amount, retained)?;
			} else {
				self.world.ledger.transfer_from(
					output.token,
					self.address,
					caller,
					output.recipient,
					output.amount,
				)?;
			}
		}
		Ok(())
	}

	/// Native currency received during this call and not yet paid out.
	fn native_available(&self, native_baseline: U256, retained: U256) -> U256 {
		self.world
			.ledger
			.native_balance(self.address)
			.saturating_sub(native_baseline)
			.saturating_sub(retained)
	}

	fn pay_native(&mut self, recipient: Address, amount: U256, retained: &mut U256) -> Result<()> {
		if recipient == self.address {
			*retained += amount;
			return Ok(());
		}
		self.world
			.ledger
			.transfer(NATIVE, self.address, recipient, amount)
	}

	fn refund_native(&mut self, caller: Address, native_baseline: U256, retained: U256) -> Result<()> {
		let excess = self.native_available(native_baseline, retained);
		if excess.is_zero() {
			return Ok(());
		}
		debug!(%caller, %excess, "Refunding unused native value");
		self.world.ledger.transfer(NATIVE, self.address, caller, excess)
	}

	fn only_owner(&self, caller: Address) -> Result<()> {
		if caller != self.owner {
			return Err(ReactorError::Unauthorized(caller));
		}
		Ok(())
	}

	/// Installs or removes the protocol fee controller.
	pub fn set_protocol_fee_controller(
		&self,
		caller: Address,
		controller: Option<Box<dyn ProtocolFeeController>>,
	) -> Result<()> {
		self.only_owner(caller)?;
		let new_controller = controller
			.as_ref()
			.map(|controller| controller.name().to_string());
		let old = self.fee_controller.swap(controller.map(Arc::new));
		let old_controller = old.map(|controller| controller.name().to_string());

		info!(?old_controller, ?new_controller, "Protocol fee controller set");
		self.events.publish(ReactorEvent::ProtocolFeeControllerSet {
			old_controller,
			new_controller,
		});
		Ok(())
	}

	/// Rotates the protocol fee recipient. Balances already in the protocol
	/// bucket move with it.
	pub fn set_protocol_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<()> {
		self.only_owner(caller)?;
		let old_recipient = self.protocol_fee_recipient;
		self.protocol_fee_recipient = recipient;

		info!(%old_recipient, new_recipient = %recipient, "Protocol fee recipient set");
		self.events.publish(ReactorEvent::ProtocolFeeRecipientSet {
			old_recipient,
			new_recipient: recipient,
		});
		Ok(())
	}

	/// Pays out the caller's escrowed fees in `token`.
	///
	/// The current protocol fee recipient claims the protocol bucket, anyone
	/// else their own interface bucket.
	pub fn claim(&mut self, caller: Address, token: Address) -> Result<U256> {
		let bucket = FeeRecipient::for_caller(caller, self.protocol_fee_recipient);
		let checkpoint = self.world.escrow.clone();

		let amount = self.world.escrow.claim(token, bucket)?;
		if let Err(error) = self
			.world
			.ledger
			.transfer(token, self.address, caller, amount)
		{
			self.world.escrow = checkpoint;
			return Err(error);
		}

		info!(%token, claimant = %caller, %amount, "Fees claimed");
		self.events.publish(ReactorEvent::FeesClaimed {
			token,
			claimant: caller,
			amount,
		});
		Ok(amount)
	}

	/// Self-service cancellation of one of the caller's nonces.
	pub fn cancel(&mut self, swapper: Address, nonce: U256) {
		self.world.permit2.cancel(swapper, nonce);
	}

	/// Cancels every nonce set in `mask` within word `word_pos` of the
	/// swapper's nonce bitmap.
	pub fn invalidate_unordered_nonces(&mut self, swapper: Address, word_pos: U256, mask: U256) {
		self.world
			.permit2
			.invalidate_unordered_nonces(swapper, word_pos, mask);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::*;
	use crate::validation::ValidationVerdict;
	use reactor_account::{AccountInterface, LocalWallet};
	use reactor_fees::BpsFeeController;
	use reactor_order::{abi, OrderPayload};
	use reactor_types::{ConfigSchema, OutputToken};

	#[test]
	fn test_limit_order_settles_directly() {
		let mut h = Harness::new();
		let mut rx = h.reactor.subscribe();
		let order = h.limit(1);
		let signed = h.sign(&order);

		let fills = h
			.reactor
			.execute(&h.env, filler(), U256::ZERO, signed)
			.unwrap();

		assert_eq!(h.balance(token_a(), h.swapper()), e18(9));
		assert_eq!(h.balance(token_b(), h.swapper()), e18(2));
		assert_eq!(h.balance(token_a(), filler()), e18(1));
		assert_eq!(h.balance(token_b(), filler()), e18(8));

		let expected = Fill {
			order_hash: order.order_hash(),
			filler: filler(),
			swapper: h.swapper(),
			nonce: U256::from(1),
		};
		assert_eq!(fills, vec![expected.clone()]);
		assert_eq!(rx.try_recv().unwrap(), ReactorEvent::Fill(expected));
		assert!(rx.try_recv().is_err());
	}

	#[test]
	fn test_signature_commits_to_nonce() {
		let mut h = Harness::new();
		let signed = h.sign(&h.limit(1));
		let forged = SignedOrder::new(h.limit(2).encode(), signed.sig);

		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, forged),
			Err(ReactorError::InvalidSigner)
		);
		assert!(!h.reactor.is_nonce_used(h.swapper(), U256::from(2)));
	}

	#[test]
	fn test_nonce_consumed_once() {
		let mut h = Harness::new();
		let signed = h.sign(&h.limit(7));
		h.reactor
			.execute(&h.env, filler(), U256::ZERO, signed.clone())
			.unwrap();
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::InvalidNonce)
		);

		// A differently shaped order reusing the nonce fails too.
		let mut other = h.limit(7);
		other.outputs[0].amount = e18(3);
		let signed = h.sign(&other);
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::InvalidNonce)
		);
	}

	#[test]
	fn test_dutch_order_at_half_decay() {
		let mut h = Harness::new();
		let order = h.dutch(1, e18(2), e18(1));
		let signed = h.sign(&order);
		let env = h.env_at(NOW + 50);

		h.reactor
			.execute(&env, filler(), U256::ZERO, signed)
			.unwrap();
		assert_eq!(h.balance(token_b(), h.swapper()), e18(2) - e18(1) / U256::from(2));
	}

	#[test]
	fn test_dutch_output_rounds_against_filler() {
		let mut h = Harness::new();
		// 3 -> 0 over 100s, at 50s the exact value is 1.5.
		let order = h.dutch(1, U256::from(3), U256::ZERO);
		let signed = h.sign(&order);
		h.reactor
			.execute(&h.env_at(NOW + 50), filler(), U256::ZERO, signed)
			.unwrap();
		assert_eq!(h.balance(token_b(), h.swapper()), U256::from(2));
	}

	#[test]
	fn test_envelope_checks() {
		let mut h = Harness::new();
		let signed = h.sign(&h.limit(1));
		assert_eq!(
			h.reactor
				.execute(&h.env_at(NOW + 101), filler(), U256::ZERO, signed),
			Err(ReactorError::DeadlinePassed)
		);

		let mut order = h.limit(2);
		order.info.reactor = Address::repeat_byte(0x12);
		let signed = h.sign(&order);
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::InvalidReactor)
		);
	}

	#[test]
	fn test_protocol_fee_controller() {
		let mut h = Harness::new();
		let fee_recipient = Address::repeat_byte(0xfe);
		let mut rx = h.reactor.subscribe();

		assert_eq!(
			h.reactor.set_protocol_fee_controller(
				filler(),
				Some(Box::new(BpsFeeController::new(fee_recipient, 5)))
			),
			Err(ReactorError::Unauthorized(filler()))
		);
		h.reactor
			.set_protocol_fee_controller(
				owner(),
				Some(Box::new(BpsFeeController::new(fee_recipient, 5))),
			)
			.unwrap();
		assert_eq!(
			rx.try_recv().unwrap(),
			ReactorEvent::ProtocolFeeControllerSet {
				old_controller: None,
				new_controller: Some("bps".to_string()),
			}
		);

		let signed = h.sign(&h.limit(1));
		h.reactor
			.execute(&h.env, filler(), U256::ZERO, signed)
			.unwrap();
		// 5 bps of 2e18
		assert_eq!(h.balance(token_b(), fee_recipient), U256::from(1_000_000_000_000_000u64));
		assert_eq!(h.balance(token_b(), h.swapper()), e18(2));
	}

	struct Greedy;

	impl ProtocolFeeController for Greedy {
		fn name(&self) -> &str {
			"greedy"
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(reactor_fees::implementations::bps::BpsFeeControllerSchema)
		}

		fn get_fee_outputs(&self, order: &ResolvedOrder) -> Vec<OutputToken> {
			order
				.outputs
				.iter()
				.map(|output| OutputToken::new(output.token, output.amount, Address::repeat_byte(0xfe)))
				.collect()
		}
	}

	#[test]
	fn test_oversized_fee_reverts() {
		let mut h = Harness::new().with_controller(Box::new(Greedy));
		let signed = h.sign(&h.limit(1));
		let before = h.reactor.ledger().clone();

		assert!(matches!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::FeeTooLarge { .. })
		));
		assert_eq!(h.reactor.ledger(), &before);
		assert!(!h.reactor.is_nonce_used(h.swapper(), U256::from(1)));
	}

	#[test]
	fn test_exclusivity() {
		let mut h = Harness::new();
		let exclusive = Address::repeat_byte(0x44);

		let strict = h.exclusive_dutch(1, exclusive, 0);
		let signed = h.sign(&strict);
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::NoExclusiveOverride)
		);

		let with_override = h.exclusive_dutch(2, exclusive, 100);
		let signed = h.sign(&with_override);
		h.reactor
			.execute(&h.env, filler(), U256::ZERO, signed)
			.unwrap();
		// 2e18 * 1.01
		assert_eq!(
			h.balance(token_b(), h.swapper()),
			e18(2) + e18(2) / U256::from(100)
		);

		// The exclusive filler pays no override.
		h.fund_filler(exclusive);
		let signed = h.sign(&h.exclusive_dutch(3, exclusive, 100));
		let before = h.balance(token_b(), h.swapper());
		h.reactor
			.execute(&h.env, exclusive, U256::ZERO, signed)
			.unwrap();
		assert_eq!(h.balance(token_b(), h.swapper()) - before, e18(2));
	}

	#[test]
	fn test_escrowed_fees_and_claims() {
		let mut h = Harness::new().with_fee_model(FeeModel::EscrowSplit {
			protocol_fee_bps: 2_000,
			marking: FeeMarking::LastOutput,
		});
		let interface = Address::repeat_byte(0x1f);
		let mut order = h.limit(1);
		order.outputs.push(abi::OutputToken {
			token: token_b(),
			amount: U256::from(10_000),
			recipient: interface,
			isFeeOutput: false,
		});
		let signed = h.sign(&order);
		h.reactor
			.execute(&h.env, filler(), U256::ZERO, signed)
			.unwrap();

		assert_eq!(h.balance(token_b(), reactor()), U256::from(10_000));
		assert_eq!(h.balance(token_b(), interface), U256::ZERO);

		let mut rx = h.reactor.subscribe();
		assert_eq!(h.reactor.claim(interface, token_b()).unwrap(), U256::from(7_999));
		assert_eq!(h.balance(token_b(), interface), U256::from(7_999));
		assert_eq!(
			rx.try_recv().unwrap(),
			ReactorEvent::FeesClaimed {
				token: token_b(),
				claimant: interface,
				amount: U256::from(7_999),
			}
		);
		assert_eq!(
			h.reactor.claim(interface, token_b()),
			Err(ReactorError::NothingToClaim)
		);

		// The protocol bucket follows the current recipient.
		let treasury = Address::repeat_byte(0x7e);
		assert_eq!(
			h.reactor.set_protocol_fee_recipient(filler(), treasury),
			Err(ReactorError::Unauthorized(filler()))
		);
		h.reactor
			.set_protocol_fee_recipient(owner(), treasury)
			.unwrap();
		assert_eq!(h.reactor.claim(treasury, token_b()).unwrap(), U256::from(1_999));
		assert_eq!(
			h.reactor.claim(owner(), token_b()),
			Err(ReactorError::NothingToClaim)
		);
		assert_eq!(h.balance(token_b(), reactor()), U256::from(2));
	}

	#[test]
	fn test_injected_fees_escrowed_when_flagged() {
		let fee_recipient = Address::repeat_byte(0xfe);
		let mut h = Harness::new()
			.with_fee_model(FeeModel::EscrowSplit {
				protocol_fee_bps: 5_000,
				marking: FeeMarking::Flagged,
			})
			.with_controller(Box::new(BpsFeeController::new(fee_recipient, 5)));
		let signed = h.sign(&h.limit(1));
		h.reactor
			.execute(&h.env, filler(), U256::ZERO, signed)
			.unwrap();

		// 5 bps of 2e18, held by the reactor and split evenly.
		let fee = U256::from(1_000_000_000_000_000u64);
		assert_eq!(h.balance(token_b(), reactor()), fee);
		assert_eq!(h.balance(token_b(), fee_recipient), U256::ZERO);
		assert_eq!(
			h.reactor.claim(fee_recipient, token_b()).unwrap(),
			fee / U256::from(2) - U256::from(1)
		);
		assert_eq!(
			h.reactor.claim(owner(), token_b()).unwrap(),
			fee / U256::from(2) - U256::from(1)
		);
	}

	#[test]
	fn test_signed_fee_output_escrowed_when_flagged() {
		let mut h = Harness::new().with_fee_model(FeeModel::EscrowSplit {
			protocol_fee_bps: 2_000,
			marking: FeeMarking::Flagged,
		});
		let interface = Address::repeat_byte(0x1f);
		let mut order = h.limit(1);
		order.outputs.push(abi::OutputToken {
			token: token_b(),
			amount: U256::from(10_000),
			recipient: interface,
			isFeeOutput: true,
		});
		let signed = h.sign(&order);
		let swapper_before = h.balance(token_b(), h.swapper());
		h.reactor
			.execute(&h.env, filler(), U256::ZERO, signed)
			.unwrap();

		// The trade leg is paid out, the signed fee leg goes to escrow.
		assert_eq!(h.balance(token_b(), h.swapper()) - swapper_before, e18(2));
		assert_eq!(h.balance(token_b(), reactor()), U256::from(10_000));
		assert_eq!(h.balance(token_b(), interface), U256::ZERO);

		assert_eq!(h.reactor.claim(interface, token_b()).unwrap(), U256::from(7_999));
		assert_eq!(h.reactor.claim(owner(), token_b()).unwrap(), U256::from(1_999));
		assert_eq!(h.balance(token_b(), interface), U256::from(7_999));
		assert_eq!(h.balance(token_b(), reactor()), U256::from(2));
	}

	#[test]
	fn test_fee_flag_is_signed() {
		let h = Harness::new();
		let mut order = h.limit(1);
		order.outputs.push(abi::OutputToken {
			token: token_b(),
			amount: U256::from(10_000),
			recipient: Address::repeat_byte(0x1f),
			isFeeOutput: true,
		});
		let signed = h.sign(&order);

		// Clearing the flag after signing sends the leg to the interface
		// directly, which the swapper never authorized.
		order.outputs[1].isFeeOutput = false;
		let tampered = SignedOrder::new(order.encode(), signed.sig.clone());
		let mut h = h.with_fee_model(FeeModel::EscrowSplit {
			protocol_fee_bps: 2_000,
			marking: FeeMarking::Flagged,
		});
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, tampered),
			Err(ReactorError::InvalidSigner)
		);
		assert!(!h.reactor.is_nonce_used(h.swapper(), U256::from(1)));
	}

	#[test]
	fn test_batch_is_atomic() {
		let mut h = Harness::new();
		let good = h.sign(&h.limit(1));
		let mut expired = h.limit(2);
		expired.info.deadline = U256::from(NOW - 1);
		let expired = h.sign(&expired);
		let before = h.reactor.ledger().clone();

		assert_eq!(
			h.reactor
				.execute_batch(&h.env, filler(), U256::ZERO, &[good.clone(), expired]),
			Err(ReactorError::DeadlinePassed)
		);
		assert_eq!(h.reactor.ledger(), &before);
		assert!(!h.reactor.is_nonce_used(h.swapper(), U256::from(1)));

		let orders = [good, h.sign(&h.limit(3))];
		let fills = h
			.reactor
			.execute_batch(&h.env, filler(), U256::ZERO, &orders)
			.unwrap();
		assert_eq!(fills.len(), 2);
		assert_eq!(h.balance(token_b(), h.swapper()), e18(4));
	}

	#[test]
	fn test_empty_batch() {
		let mut h = Harness::new();
		assert_eq!(
			h.reactor.execute_batch(&h.env, filler(), U256::ZERO, &[]),
			Err(ReactorError::EmptyBatch)
		);
	}

	#[test]
	fn test_callback_sees_whole_batch_once() {
		let mut h = Harness::new();
		// The filler contract starts without output tokens and sources them
		// from a market maker during the callback.
		let maker = Address::repeat_byte(0x55);
		h.reactor
			.ledger_mut()
			.mint(token_b(), maker, e18(10))
			.unwrap();
		h.reactor
			.ledger_mut()
			.approve(token_b(), maker, filler(), U256::MAX);
		let filler_b = h.balance(token_b(), filler());
		h.reactor
			.ledger_mut()
			.transfer(token_b(), filler(), Address::repeat_byte(0x56), filler_b)
			.unwrap();

		let mut callback = SourcingFiller::new(maker, e18(4));
		let orders = [h.sign(&h.limit(1)), h.sign(&h.limit(2))];
		h.reactor
			.execute_batch_with_callback(&h.env, filler(), U256::ZERO, &orders, &mut callback, b"route")
			.unwrap();

		assert_eq!(callback.calls, 1);
		assert_eq!(callback.seen_orders, 2);
		assert_eq!(callback.seen_data, b"route".to_vec());
		// Inputs were delivered before the callback ran.
		assert_eq!(callback.input_at_callback, e18(2));
		assert_eq!(h.balance(token_b(), h.swapper()), e18(4));
	}

	#[test]
	fn test_failing_callback_reverts() {
		let mut h = Harness::new();
		let signed = h.sign(&h.limit(1));
		let before = h.reactor.ledger().clone();
		let mut callback = FailingFiller;

		assert_eq!(
			h.reactor
				.execute_with_callback(&h.env, filler(), U256::ZERO, signed, &mut callback, &[]),
			Err(ReactorError::CallbackFailed("no route".to_string()))
		);
		assert_eq!(h.reactor.ledger(), &before);
		assert!(!h.reactor.is_nonce_used(h.swapper(), U256::from(1)));
	}

	#[test]
	fn test_native_outputs_and_refund() {
		let mut h = Harness::new();
		let mut order = h.limit(1);
		order.outputs[0].token = NATIVE;
		order.outputs[0].amount = e18(1);

		let short = h.sign(&order);
		assert_eq!(
			h.reactor
				.execute(&h.env, filler(), e18(1) / U256::from(2), short.clone()),
			Err(ReactorError::NativeTransferFailed)
		);
		assert_eq!(h.reactor.ledger().native_balance(filler()), e18(5));

		h.reactor
			.execute(&h.env, filler(), e18(2), short)
			.unwrap();
		assert_eq!(h.reactor.ledger().native_balance(h.swapper()), e18(1));
		assert_eq!(h.reactor.ledger().native_balance(filler()), e18(4));
		assert_eq!(h.reactor.ledger().native_balance(reactor()), U256::ZERO);
	}

	#[test]
	fn test_native_shortfall_across_legs() {
		let mut h = Harness::new();
		let mut order = h.limit(1);
		order.outputs[0].token = NATIVE;
		order.outputs[0].amount = e18(1);
		order.outputs.push(abi::OutputToken {
			token: NATIVE,
			amount: e18(1),
			recipient: Address::repeat_byte(0x1f),
			isFeeOutput: false,
		});
		let signed = h.sign(&order);

		// Enough for the first leg only.
		let value = e18(3) / U256::from(2);
		assert_eq!(
			h.reactor.execute(&h.env, filler(), value, signed.clone()),
			Err(ReactorError::NativeTransferFailed)
		);
		assert_eq!(h.reactor.ledger().native_balance(h.swapper()), U256::ZERO);
		assert_eq!(h.reactor.ledger().native_balance(filler()), e18(5));

		h.reactor
			.execute(&h.env, filler(), e18(2), signed)
			.unwrap();
		assert_eq!(h.reactor.ledger().native_balance(h.swapper()), e18(1));
		assert_eq!(
			h.reactor.ledger().native_balance(Address::repeat_byte(0x1f)),
			e18(1)
		);
		assert_eq!(h.reactor.ledger().native_balance(filler()), e18(3));
	}

	#[test]
	fn test_native_sent_during_callback() {
		let mut h = Harness::new();
		let mut order = h.limit(1);
		order.outputs[0].token = NATIVE;
		order.outputs[0].amount = e18(1);
		let signed = h.sign(&order);

		let mut callback = NativeFiller(e18(1));
		h.reactor
			.execute_with_callback(&h.env, filler(), U256::ZERO, signed, &mut callback, &[])
			.unwrap();
		assert_eq!(h.reactor.ledger().native_balance(h.swapper()), e18(1));
	}

	#[test]
	fn test_swapper_cancellation() {
		let mut h = Harness::new();
		let signed = h.sign(&h.limit(9));
		h.reactor.cancel(h.swapper(), U256::from(9));
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::InvalidNonce)
		);

		// Word 0, bits 10 and 11.
		h.reactor
			.invalidate_unordered_nonces(h.swapper(), U256::ZERO, U256::from(0b11u64 << 10));
		assert!(h.reactor.is_nonce_used(h.swapper(), U256::from(11)));
		assert!(!h.reactor.is_nonce_used(h.swapper(), U256::from(12)));
	}

	struct RejectAll;

	impl AdditionalValidation for RejectAll {
		fn validate(
			&self,
			_filler: Address,
			_order: &ResolvedOrder,
		) -> std::result::Result<ValidationVerdict, String> {
			Ok(ValidationVerdict::Valid(false))
		}
	}

	#[test]
	fn test_additional_validation() {
		let mut h = Harness::new();
		let contract = Address::repeat_byte(0xc1);
		h.reactor.register_validation(contract, Box::new(RejectAll));

		let mut order = h.limit(1);
		order.info.additionalValidationContract = contract;
		let signed = h.sign(&order);
		assert!(matches!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::ValidationFailed(_))
		));
	}

	#[test]
	fn test_unaccepted_order_family() {
		let mut h = Harness::new();
		h.reactor = Reactor::new(reactor(), owner(), permit2()).with_order_kinds(&[OrderKind::Dutch]);
		let signed = h.sign(&h.limit(1));
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::UnsupportedOrderType("limit".to_string()))
		);
	}

	#[test]
	fn test_wrong_swapper_key() {
		let mut h = Harness::new();
		let order = h.limit(1);
		let stranger = LocalWallet::random();
		let signed = crate::signing::sign_order(&order, &stranger, CHAIN_ID, permit2()).unwrap();
		assert_ne!(stranger.address(), h.swapper());
		assert_eq!(
			h.reactor.execute(&h.env, filler(), U256::ZERO, signed),
			Err(ReactorError::InvalidSigner)
		);
	}
}
