//! Type-tagged order payload encoding.
//!
//! `order = [tag] ++ abi.encode(payload)`. Decoding dispatches on the tag
//! and fails cleanly on unknown tags or payloads that do not decode as the
//! tagged type.

use alloy::primitives::Bytes;
use alloy::sol_types::{SolType, SolValue};
use reactor_types::{ReactorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order families the reactor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
	Limit,
	Dutch,
	ExclusiveDutch,
	V2Dutch,
	V3Dutch,
	Priority,
	Hybrid,
}

impl OrderKind {
	pub const ALL: [OrderKind; 7] = [
		OrderKind::Limit,
		OrderKind::Dutch,
		OrderKind::ExclusiveDutch,
		OrderKind::V2Dutch,
		OrderKind::V3Dutch,
		OrderKind::Priority,
		OrderKind::Hybrid,
	];

	pub fn tag(self) -> u8 {
		match self {
			OrderKind::Limit => 0x01,
			OrderKind::Dutch => 0x02,
			OrderKind::ExclusiveDutch => 0x03,
			OrderKind::V2Dutch => 0x04,
			OrderKind::V3Dutch => 0x05,
			OrderKind::Priority => 0x06,
			OrderKind::Hybrid => 0x07,
		}
	}

	pub fn from_tag(tag: u8) -> Result<Self> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.tag() == tag)
			.ok_or(ReactorError::UnknownOrderType(tag))
	}

	/// Name used in configuration files.
	pub fn name(self) -> &'static str {
		match self {
			OrderKind::Limit => "limit",
			OrderKind::Dutch => "dutch",
			OrderKind::ExclusiveDutch => "exclusive_dutch",
			OrderKind::V2Dutch => "v2_dutch",
			OrderKind::V3Dutch => "v3_dutch",
			OrderKind::Priority => "priority",
			OrderKind::Hybrid => "hybrid",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.name() == name)
	}
}

impl fmt::Display for OrderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Encodes a payload behind its type tag.
pub fn encode_tagged<T: SolValue>(kind: OrderKind, payload: &T) -> Bytes {
	let body = payload.abi_encode();
	let mut encoded = Vec::with_capacity(body.len() + 1);
	encoded.push(kind.tag());
	encoded.extend_from_slice(&body);
	Bytes::from(encoded)
}

/// Splits tagged order bytes into their kind and ABI body.
pub fn split_tagged(order: &[u8]) -> Result<(OrderKind, &[u8])> {
	let (tag, body) = order
		.split_first()
		.ok_or_else(|| ReactorError::MalformedOrder("empty order bytes".into()))?;
	Ok((OrderKind::from_tag(*tag)?, body))
}

/// Decodes an ABI body as `T`.
pub fn decode_body<T>(kind: OrderKind, body: &[u8]) -> Result<T>
where
	T: SolValue + From<<T::SolType as SolType>::RustType>,
{
	T::abi_decode(body).map_err(|e| ReactorError::MalformedOrder(format!("{}: {}", kind, e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::abi;
	use alloy::primitives::{Address, U256};

	#[test]
	fn test_tags_roundtrip() {
		for kind in OrderKind::ALL {
			assert_eq!(OrderKind::from_tag(kind.tag()).unwrap(), kind);
			assert_eq!(OrderKind::from_name(kind.name()), Some(kind));
		}
		assert_eq!(OrderKind::from_tag(0x00), Err(ReactorError::UnknownOrderType(0)));
		assert_eq!(OrderKind::from_tag(0xff), Err(ReactorError::UnknownOrderType(0xff)));
	}

	#[test]
	fn test_encode_then_decode_limit_order() {
		let order = abi::LimitOrder {
			info: abi::OrderInfo {
				swapper: Address::repeat_byte(1),
				nonce: U256::from(9),
				..Default::default()
			},
			..Default::default()
		};
		let encoded = encode_tagged(OrderKind::Limit, &order);
		assert_eq!(encoded[0], 0x01);

		let (kind, body) = split_tagged(&encoded).unwrap();
		assert_eq!(kind, OrderKind::Limit);
		let decoded: abi::LimitOrder = decode_body(kind, body).unwrap();
		assert_eq!(decoded, order);
	}

	#[test]
	fn test_malformed_inputs() {
		assert!(matches!(split_tagged(&[]), Err(ReactorError::MalformedOrder(_))));
		assert!(matches!(
			decode_body::<abi::DutchOrder>(OrderKind::Dutch, &[1, 2, 3]),
			Err(ReactorError::MalformedOrder(_))
		));
	}
}
