//! Settlement for signed swap orders.
//!
//! A [`Reactor`] takes orders a swapper signed off-chain, resolves them to
//! concrete amounts for the current block, pulls each input through the
//! Permit2 transfer authority and makes sure every output reaches its
//! recipient before the call returns. [`ReactorService`] wraps a reactor for
//! async callers and keeps its state in storage.

pub mod callback;
pub mod error;
pub mod reactor;
pub mod service;
pub mod signing;
pub mod validation;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use callback::{CallbackContext, FillMode, ReactorCallback};
pub use error::CoreError;
pub use reactor::Reactor;
pub use service::ReactorService;
pub use signing::{permit_digest, sign_order};
pub use validation::{AdditionalValidation, ValidationRegistry, ValidationVerdict};
pub use world::{World, WorldSnapshot};
