//! Async front end over a [`Reactor`] with persistent state.
//!
//! Calls are serialized through a mutex, which gives settlement the same
//! one-call-at-a-time semantics a chain does. After every call that changes
//! state, the world is written to storage before the lock is released.

use crate::callback::ReactorCallback;
use crate::error::CoreError;
use crate::reactor::Reactor;
use crate::world::WorldSnapshot;
use reactor_config::ReactorConfig;
use reactor_fees::{BpsFeeController, ProtocolFeeController};
use reactor_storage::{create_storage, StorageService};
use reactor_types::{
	Address, BlockEnv, EventBus, Fill, ReactorError, ReactorEvent, SignedOrder, U256,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

const WORLD_NAMESPACE: &str = "world";

/// A reactor shared across tasks, persisted after every change.
pub struct ReactorService {
	/// Held for the whole of each call, persistence included.
	reactor: Mutex<Reactor>,
	/// Where the world snapshot lives.
	storage: StorageService,
	/// Clone of the reactor's bus, so subscribing does not take the lock.
	events: EventBus,
	/// Chain the reactor settles on, used to sign and verify orders.
	chain_id: u64,
	/// Storage id of this deployment's world.
	id: String,
}

impl ReactorService {
	/// Wraps `reactor` without touching storage. Call [`Self::restore`] to
	/// load a persisted world.
	pub fn new(reactor: Reactor, storage: StorageService, chain_id: u64) -> Self {
		let events = reactor.events().clone();
		let id = reactor.address().to_string();
		Self {
			reactor: Mutex::new(reactor),
			storage,
			events,
			chain_id,
			id,
		}
	}

	/// Builds the reactor a configuration describes and restores its
	/// persisted world, if any.
	pub async fn from_config(config: &ReactorConfig) -> Result<Self, CoreError> {
		let section = &config.reactor;
		let mut reactor = Reactor::new(section.address, section.owner, config.permit2.address)
			.with_order_kinds(&section.accepted_kinds())
			.with_fee_model(config.fees.model)
			.with_protocol_fee_recipient(section.protocol_fee_recipient())
			.with_event_bus(EventBus::new(section.event_capacity));

		if let Some(table) = &config.fees.controller {
			let controller = BpsFeeController::from_config(table)
				.map_err(|e| CoreError::Configuration(e.to_string()))?;
			reactor = reactor.with_fee_controller(Box::new(controller));
		}

		let storage = StorageService::new(create_storage(&config.storage)?);
		let service = Self::new(reactor, storage, section.chain_id);
		service.restore().await?;

		info!(
			reactor = %section.address,
			chain_id = section.chain_id,
			order_types = ?section.accepted_kinds(),
			"Reactor service ready"
		);
		Ok(service)
	}

	/// Chain id orders must be signed for.
	pub fn chain_id(&self) -> u64 {
		self.chain_id
	}

	/// Receives fills and admin events.
	pub fn subscribe(&self) -> broadcast::Receiver<ReactorEvent> {
		self.events.subscribe()
	}

	/// Loads the persisted world. Returns whether one was found.
	pub async fn restore(&self) -> Result<bool, CoreError> {
		let snapshot: Option<WorldSnapshot> = self
			.storage
			.retrieve_optional(WORLD_NAMESPACE, &self.id)
			.await?;
		match snapshot {
			Some(snapshot) => {
				debug!(
					nonce_words = snapshot.nonces.len(),
					"Restoring persisted reactor state"
				);
				self.reactor.lock().await.restore(snapshot);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn persist(&self, reactor: &Reactor) -> Result<(), CoreError> {
		self.storage
			.store(WORLD_NAMESPACE, &self.id, &reactor.snapshot())
			.await?;
		Ok(())
	}

	/// Runs `f` against the reactor and persists the result.
	///
	/// For administrative setup such as seeding balances or registering
	/// validation contracts.
	pub async fn with_reactor<R>(&self, f: impl FnOnce(&mut Reactor) -> R) -> Result<R, CoreError> {
		let mut reactor = self.reactor.lock().await;
		let result = f(&mut reactor);
		self.persist(&reactor).await?;
		Ok(result)
	}

	/// Settles one order with the caller as direct taker.
	pub async fn execute(
		&self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		order: SignedOrder,
	) -> Result<Fill, CoreError> {
		let mut fills = self.execute_batch(env, caller, value, &[order]).await?;
		fills.pop().ok_or(CoreError::Reactor(ReactorError::EmptyBatch))
	}

	/// Settles a batch with the caller as direct taker, all or nothing.
	pub async fn execute_batch(
		&self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		orders: &[SignedOrder],
	) -> Result<Vec<Fill>, CoreError> {
		let mut reactor = self.reactor.lock().await;
		let fills = reactor.execute_batch(env, caller, value, orders)?;
		self.persist(&reactor).await?;
		Ok(fills)
	}

	/// Settles one order through the filler's callback.
	pub async fn execute_with_callback(
		&self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		order: SignedOrder,
		callback: &mut dyn ReactorCallback,
		data: &[u8],
	) -> Result<Fill, CoreError> {
		let mut fills = self
			.execute_batch_with_callback(env, caller, value, &[order], callback, data)
			.await?;
		fills.pop().ok_or(CoreError::Reactor(ReactorError::EmptyBatch))
	}

	/// Settles a batch through a single filler callback.
	pub async fn execute_batch_with_callback(
		&self,
		env: &BlockEnv,
		caller: Address,
		value: U256,
		orders: &[SignedOrder],
		callback: &mut dyn ReactorCallback,
		data: &[u8],
	) -> Result<Vec<Fill>, CoreError> {
		let mut reactor = self.reactor.lock().await;
		let fills = reactor.execute_batch_with_callback(env, caller, value, orders, callback, data)?;
		self.persist(&reactor).await?;
		Ok(fills)
	}

	/// Pays out the caller's escrowed fees in `token`.
	pub async fn claim(&self, caller: Address, token: Address) -> Result<U256, CoreError> {
		let mut reactor = self.reactor.lock().await;
		let amount = reactor.claim(caller, token)?;
		self.persist(&reactor).await?;
		Ok(amount)
	}

	/// Marks one of the swapper's nonces used.
	pub async fn cancel(&self, swapper: Address, nonce: U256) -> Result<(), CoreError> {
		let mut reactor = self.reactor.lock().await;
		reactor.cancel(swapper, nonce);
		self.persist(&reactor).await
	}

	/// Marks every nonce in `mask` of bitmap word `word_pos` used.
	pub async fn invalidate_unordered_nonces(
		&self,
		swapper: Address,
		word_pos: U256,
		mask: U256,
	) -> Result<(), CoreError> {
		let mut reactor = self.reactor.lock().await;
		reactor.invalidate_unordered_nonces(swapper, word_pos, mask);
		self.persist(&reactor).await
	}

	/// Owner-only. Controllers come from configuration, so the change is not
	/// persisted.
	pub async fn set_protocol_fee_controller(
		&self,
		caller: Address,
		controller: Option<Box<dyn ProtocolFeeController>>,
	) -> Result<(), CoreError> {
		let reactor = self.reactor.lock().await;
		reactor.set_protocol_fee_controller(caller, controller)?;
		Ok(())
	}

	/// Owner-only. Not persisted, like the controller.
	pub async fn set_protocol_fee_recipient(
		&self,
		caller: Address,
		recipient: Address,
	) -> Result<(), CoreError> {
		let mut reactor = self.reactor.lock().await;
		reactor.set_protocol_fee_recipient(caller, recipient)?;
		Ok(())
	}

	/// Whether the swapper's nonce was filled or cancelled.
	pub async fn is_nonce_used(&self, swapper: Address, nonce: U256) -> bool {
		self.reactor.lock().await.is_nonce_used(swapper, nonce)
	}

	/// Ledger balance of `owner` in `token`.
	pub async fn balance_of(&self, token: Address, owner: Address) -> U256 {
		self.reactor.lock().await.ledger().balance_of(token, owner)
	}

	/// Name of the installed protocol fee controller.
	pub async fn fee_controller_name(&self) -> Option<String> {
		self.reactor.lock().await.fee_controller_name()
	}
}
