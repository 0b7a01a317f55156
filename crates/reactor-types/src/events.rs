//! Settlement events and the broadcast bus they are published on.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Externally observable record of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
	/// Hash of the order as signed, before any amount was adjusted.
	pub order_hash: B256,
	pub filler: Address,
	pub swapper: Address,
	pub nonce: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactorEvent {
	/// Emitted exactly once per settled order.
	Fill(Fill),
	ProtocolFeeControllerSet {
		old_controller: Option<String>,
		new_controller: Option<String>,
	},
	ProtocolFeeRecipientSet {
		old_recipient: Address,
		new_recipient: Address,
	},
	FeesClaimed {
		token: Address,
		claimant: Address,
		amount: U256,
	},
}

/// Fan-out channel for reactor events.
///
/// Events are only published once the call that produced them has
/// committed, so subscribers never see fills that were rolled back.
pub struct EventBus {
	sender: broadcast::Sender<ReactorEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<ReactorEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Having no subscribers is not an error.
	pub fn publish(&self, event: ReactorEvent) {
		let _ = self.sender.send(event);
	}

	pub fn publish_all(&self, events: impl IntoIterator<Item = ReactorEvent>) {
		for event in events {
			self.publish(event);
		}
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1024)
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_publish_reaches_subscribers() {
		let bus = EventBus::new(8);
		let mut rx = bus.subscribe();

		let fill = Fill {
			order_hash: B256::repeat_byte(1),
			filler: Address::repeat_byte(2),
			swapper: Address::repeat_byte(3),
			nonce: U256::from(7),
		};
		bus.publish(ReactorEvent::Fill(fill.clone()));

		assert_eq!(rx.recv().await.unwrap(), ReactorEvent::Fill(fill));
	}

	#[test]
	fn test_publish_without_subscribers() {
		let bus = EventBus::default();
		bus.publish_all(vec![ReactorEvent::FeesClaimed {
			token: Address::ZERO,
			claimant: Address::ZERO,
			amount: U256::ZERO,
		}]);
	}
}
