//! Shared types for the settlement reactors.
//!
//! This crate defines the canonical order model every reactor settles
//! (order envelope, input and output legs, resolved orders), the block
//! environment a settlement runs against, the error taxonomy surfaced to
//! callers, settlement events and the configuration validation helpers.

pub mod block;
pub mod errors;
pub mod events;
pub mod order;
pub mod validation;

pub use alloy::primitives::{address, Address, Bytes, B256, I256, U256};

pub use block::*;
pub use errors::*;
pub use events::*;
pub use order::*;
pub use validation::*;
