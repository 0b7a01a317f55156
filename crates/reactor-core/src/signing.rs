//! Swapper-side helpers for producing signed orders.

use reactor_account::{AccountError, AccountInterface};
use reactor_order::OrderPayload;
use reactor_permit::{
	permit2_domain, witness_transfer_digest, PermitTransferFrom, TokenPermissions, Witness,
};
use reactor_types::{Address, SignedOrder, B256};

/// Digest the swapper signs so that `payload` can be settled by the reactor
/// named in its envelope.
pub fn permit_digest<P: OrderPayload>(payload: &P, chain_id: u64, permit2: Address) -> B256 {
	let (token, amount) = payload.permitted();
	let info = payload.info();
	let permit = PermitTransferFrom {
		permitted: TokenPermissions { token, amount },
		nonce: info.nonce,
		deadline: info.deadline,
	};
	let witness_type = P::witness_type();
	witness_transfer_digest(
		&permit2_domain(chain_id, permit2),
		&permit,
		info.reactor,
		Witness {
			hash: payload.order_hash(),
			type_string: &witness_type,
		},
	)
}

/// Encodes `payload` and signs its transfer authorization.
pub fn sign_order<P: OrderPayload>(
	payload: &P,
	swapper: &dyn AccountInterface,
	chain_id: u64,
	permit2: Address,
) -> Result<SignedOrder, AccountError> {
	let sig = swapper.sign_hash(&permit_digest(payload, chain_id, permit2))?;
	Ok(SignedOrder::new(payload.encode(), sig))
}
