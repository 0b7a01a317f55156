//! Ledger state a settlement call reads and writes.
//!
//! Every settlement call runs against a checkpoint of the world and either
//! commits all of its writes or restores the checkpoint.

use reactor_fees::FeeEscrow;
use reactor_permit::{NonceWord, Permit2, SignatureTransfer, TokenLedger};
use reactor_types::Address;
use serde::{Deserialize, Serialize};

/// Everything a settlement call may write. Cloned as the rollback
/// checkpoint, so a call costs a copy of the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
	/// Token balances and allowances, native currency included.
	pub ledger: TokenLedger,
	/// Transfer authority and its nonce bitmaps.
	pub permit2: Permit2,
	/// Fees captured under the escrow split model.
	pub escrow: FeeEscrow,
}

impl World {
	/// An empty world whose transfer authority lives at `permit2`.
	pub fn new(permit2: Address) -> Self {
		Self {
			ledger: TokenLedger::new(),
			permit2: Permit2::new(permit2),
			escrow: FeeEscrow::new(),
		}
	}

	/// Copies the persistent parts of the world.
	pub fn snapshot(&self) -> WorldSnapshot {
		WorldSnapshot {
			nonces: self.permit2.words(),
			escrow: self.escrow.clone(),
			ledger: self.ledger.clone(),
		}
	}

	/// Rebuilds a world from a snapshot taken by [`Self::snapshot`].
	pub fn from_snapshot(permit2: Address, snapshot: WorldSnapshot) -> Self {
		Self {
			ledger: snapshot.ledger,
			permit2: Permit2::from_words(permit2, snapshot.nonces),
			escrow: snapshot.escrow,
		}
	}

	pub fn permit2_address(&self) -> Address {
		self.permit2.address()
	}
}

/// Persisted form of a [`World`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
	/// Every non-empty nonce bitmap word.
	pub nonces: Vec<NonceWord>,
	pub escrow: FeeEscrow,
	pub ledger: TokenLedger,
}
