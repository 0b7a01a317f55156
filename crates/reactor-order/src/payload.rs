//! The resolve extension point every order family implements.

use crate::codec::{decode_body, encode_tagged, OrderKind};
use crate::{abi, typed, OrderResolver};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolStruct, SolType, SolValue};
use reactor_types::{BlockEnv, InputToken, OutputToken, ResolvedOrder, Result};
use std::marker::PhantomData;
use tracing::debug;

/// Everything resolution may depend on besides the order itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
	pub env: BlockEnv,
	/// The settling caller, checked against exclusivity windows.
	pub filler: Address,
}

impl ResolveContext {
	pub fn new(env: BlockEnv, filler: Address) -> Self {
		Self { env, filler }
	}
}

/// A decoded order payload of one family.
///
/// Implementors only describe how to hash and resolve themselves; decoding,
/// signature plumbing and dispatch are shared through [`PayloadResolver`].
pub trait OrderPayload:
	SolValue + From<<Self::SolType as SolType>::RustType> + Send + Sync + Sized + 'static
{
	const KIND: OrderKind;

	/// EIP-712 structure the swapper signs.
	type Typed: SolStruct;

	fn typed(&self) -> Self::Typed;

	fn info(&self) -> &abi::OrderInfo;

	/// Token and maximum amount the swapper authorizes for transfer.
	fn permitted(&self) -> (Address, U256);

	/// Computes concrete amounts for the given context.
	///
	/// `order_hash` is computed from the signed fields before this runs and
	/// must be carried through unchanged.
	fn resolve(&self, order_hash: B256, ctx: &ResolveContext) -> Result<ResolvedOrder>;

	fn order_hash(&self) -> B256 {
		typed::order_hash(&self.typed())
	}

	fn witness_type() -> String {
		typed::witness_type::<Self::Typed>()
	}

	/// Tagged wire bytes for a [`reactor_types::SignedOrder`].
	fn encode(&self) -> Bytes {
		encode_tagged(Self::KIND, self)
	}
}

/// Builds a resolved order without signature or witness; the shared
/// resolver fills those in.
pub(crate) fn resolved(
	info: &abi::OrderInfo,
	input: InputToken,
	outputs: Vec<OutputToken>,
	order_hash: B256,
) -> ResolvedOrder {
	ResolvedOrder {
		info: info.to_resolved(),
		input,
		outputs,
		sig: Bytes::new(),
		hash: order_hash,
		witness_type: String::new(),
	}
}

/// [`OrderResolver`] for any [`OrderPayload`].
pub struct PayloadResolver<T> {
	_payload: PhantomData<fn() -> T>,
}

impl<T> PayloadResolver<T> {
	pub fn new() -> Self {
		Self {
			_payload: PhantomData,
		}
	}
}

impl<T> Default for PayloadResolver<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: OrderPayload> OrderResolver for PayloadResolver<T> {
	fn kind(&self) -> OrderKind {
		T::KIND
	}

	fn resolve(&self, body: &[u8], sig: &Bytes, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		let payload: T = decode_body(T::KIND, body)?;
		let order_hash = payload.order_hash();
		let mut order = payload.resolve(order_hash, ctx)?;
		order.sig = sig.clone();
		order.witness_type = T::witness_type();

		debug!(
			kind = %T::KIND,
			order_hash = %order.hash,
			swapper = %order.info.swapper,
			input_amount = %order.input.amount,
			outputs = order.outputs.len(),
			"Resolved order"
		);
		Ok(order)
	}
}
