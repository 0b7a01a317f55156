//! Order resolution for the settlement reactors.
//!
//! Turns a type-tagged [`SignedOrder`] into a [`ResolvedOrder`]: decodes the
//! payload, hashes the swapper-signed fields, checks cosignatures, applies
//! decay and priority fee scaling and finally the exclusivity rules for the
//! settling filler. Every order family plugs in through [`OrderPayload`];
//! [`OrderService`] dispatches on the payload's type tag.

use reactor_types::{ReactorError, ResolvedOrder, Result, SignedOrder};
use std::collections::HashMap;

pub mod abi;
pub mod codec;
pub mod cosigner;
pub mod exclusivity;
pub mod math;
pub mod payload;
pub mod typed;

/// Re-export implementations
pub mod implementations {
	pub mod dutch;
	pub mod exclusive_dutch;
	pub mod hybrid;
	pub mod limit;
	pub mod priority;
	pub mod v2_dutch;
	pub mod v3_dutch;
}

#[cfg(test)]
pub(crate) mod testing;

pub use codec::OrderKind;
pub use payload::{OrderPayload, PayloadResolver, ResolveContext};

/// Resolves the ABI body of one order family.
pub trait OrderResolver: Send + Sync {
	fn kind(&self) -> OrderKind;

	/// Decodes `body` and resolves it for `ctx`, attaching `sig`.
	fn resolve(
		&self,
		body: &[u8],
		sig: &alloy::primitives::Bytes,
		ctx: &ResolveContext,
	) -> Result<ResolvedOrder>;
}

/// Returns the resolver for an order family.
pub fn resolver_for(kind: OrderKind) -> Box<dyn OrderResolver> {
	match kind {
		OrderKind::Limit => Box::new(PayloadResolver::<abi::LimitOrder>::new()),
		OrderKind::Dutch => Box::new(PayloadResolver::<abi::DutchOrder>::new()),
		OrderKind::ExclusiveDutch => Box::new(PayloadResolver::<abi::ExclusiveDutchOrder>::new()),
		OrderKind::V2Dutch => Box::new(PayloadResolver::<abi::V2DutchOrder>::new()),
		OrderKind::V3Dutch => Box::new(PayloadResolver::<abi::V3DutchOrder>::new()),
		OrderKind::Priority => Box::new(PayloadResolver::<abi::PriorityOrder>::new()),
		OrderKind::Hybrid => Box::new(PayloadResolver::<abi::HybridOrder>::new()),
	}
}

/// Service that resolves signed orders of the accepted families.
///
/// A reactor deployment accepts a configured subset of order families;
/// orders of any other family fail with `UnsupportedOrderType`.
pub struct OrderService {
	/// Map of order families to their resolvers.
	resolvers: HashMap<OrderKind, Box<dyn OrderResolver>>,
}

impl OrderService {
	pub fn new(resolvers: HashMap<OrderKind, Box<dyn OrderResolver>>) -> Self {
		Self { resolvers }
	}

	/// Accepts every order family.
	pub fn all() -> Self {
		Self::with_kinds(&OrderKind::ALL)
	}

	pub fn with_kinds(kinds: &[OrderKind]) -> Self {
		let resolvers = kinds
			.iter()
			.map(|kind| (*kind, resolver_for(*kind)))
			.collect();
		Self::new(resolvers)
	}

	pub fn accepts(&self, kind: OrderKind) -> bool {
		self.resolvers.contains_key(&kind)
	}

	/// Accepted order families, in tag order.
	pub fn kinds(&self) -> Vec<OrderKind> {
		let mut kinds: Vec<OrderKind> = self.resolvers.keys().copied().collect();
		kinds.sort_by_key(|kind| kind.tag());
		kinds
	}

	/// Resolves a signed order using the resolver for its type tag.
	pub fn resolve(&self, signed: &SignedOrder, ctx: &ResolveContext) -> Result<ResolvedOrder> {
		let (kind, body) = codec::split_tagged(&signed.order)?;
		let resolver = self
			.resolvers
			.get(&kind)
			.ok_or_else(|| ReactorError::UnsupportedOrderType(kind.to_string()))?;

		resolver.resolve(body, &signed.sig, ctx)
	}
}

impl Default for OrderService {
	fn default() -> Self {
		Self::all()
	}
}
