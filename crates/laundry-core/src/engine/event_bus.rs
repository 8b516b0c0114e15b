//! Per-order event bus.
//!
//! Subscribers join the topic of a single order and receive its
//! `order.status.updated` events; publication is fire-and-forget after the
//! transition commit. The bus is handed to the engine explicitly; no
//! global broadcast handle exists anywhere.

use laundry_types::OrderEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Event bus with one broadcast channel per order topic.
#[derive(Clone)]
pub struct EventBus {
	/// Topic senders keyed by order id.
	topics: Arc<RwLock<HashMap<String, broadcast::Sender<OrderEvent>>>>,
	/// Buffered events per topic before slow subscribers lag.
	capacity: usize,
}

impl EventBus {
	/// Creates a new event bus with the given per-topic capacity.
	pub fn new(capacity: usize) -> Self {
		Self {
			topics: Arc::new(RwLock::new(HashMap::new())),
			capacity,
		}
	}

	/// Joins the topic for an order.
	///
	/// The topic is created on first use; dropping the receiver leaves the
	/// topic, and the topic itself is pruned on the next publish once the
	/// last subscriber is gone.
	pub async fn subscribe(&self, order_id: &str) -> broadcast::Receiver<OrderEvent> {
		let mut topics = self.topics.write().await;
		topics
			.entry(order_id.to_string())
			.or_insert_with(|| broadcast::channel(self.capacity).0)
			.subscribe()
	}

	/// Publishes an event to its order's topic.
	///
	/// Returns the number of subscribers that received it; 0 when the
	/// topic has no subscribers. Never fails.
	pub async fn publish(&self, event: OrderEvent) -> usize {
		let order_id = event.order_id().to_string();
		let mut topics = self.topics.write().await;
		match topics.get(&order_id) {
			Some(sender) => match sender.send(event) {
				Ok(received) => received,
				Err(_) => {
					// Last subscriber left; drop the dead topic.
					topics.remove(&order_id);
					0
				}
			},
			None => 0,
		}
	}

	/// Number of live topics, for operational visibility.
	pub async fn topic_count(&self) -> usize {
		self.topics.read().await.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use laundry_types::OrderStatus;

	fn status_event(order_id: &str) -> OrderEvent {
		OrderEvent::StatusUpdated {
			order_id: order_id.into(),
			status: OrderStatus::Dicuci,
			notes: None,
			timestamp: 1,
		}
	}

	#[tokio::test]
	async fn subscriber_receives_own_topic_only() {
		let bus = EventBus::new(8);
		let mut watching = bus.subscribe("o-1").await;
		let mut other = bus.subscribe("o-2").await;

		let received = bus.publish(status_event("o-1")).await;
		assert_eq!(received, 1);

		let event = watching.recv().await.unwrap();
		assert_eq!(event.order_id(), "o-1");
		assert!(matches!(
			other.try_recv(),
			Err(broadcast::error::TryRecvError::Empty)
		));
	}

	#[tokio::test]
	async fn publish_without_subscribers_is_a_no_op() {
		let bus = EventBus::new(8);
		assert_eq!(bus.publish(status_event("o-1")).await, 0);
		assert_eq!(bus.topic_count().await, 0);
	}

	#[tokio::test]
	async fn dead_topic_is_pruned_on_publish() {
		let bus = EventBus::new(8);
		let receiver = bus.subscribe("o-1").await;
		assert_eq!(bus.topic_count().await, 1);

		drop(receiver);
		assert_eq!(bus.publish(status_event("o-1")).await, 0);
		assert_eq!(bus.topic_count().await, 0);
	}
}
