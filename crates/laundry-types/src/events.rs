//! Event types published on the real-time event bus.
//!
//! Events flow through per-order topics so that subscribers (a websocket
//! fanout, a dashboard) receive updates only for the orders they watch.
//! Publication is fire-and-forget after the transition commit.

use crate::OrderStatus;
use serde::{Deserialize, Serialize};

/// Real-time events about a single order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum OrderEvent {
	/// The order's status changed through a lifecycle transition.
	#[serde(rename = "order.status.updated")]
	StatusUpdated {
		#[serde(rename = "orderId")]
		order_id: String,
		status: OrderStatus,
		#[serde(skip_serializing_if = "Option::is_none")]
		notes: Option<String>,
		timestamp: u64,
	},
}

impl OrderEvent {
	/// The order this event concerns; doubles as the topic key.
	pub fn order_id(&self) -> &str {
		match self {
			OrderEvent::StatusUpdated { order_id, .. } => order_id,
		}
	}
}
