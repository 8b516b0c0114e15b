//! Notification records created by lifecycle side effects.
//!
//! The in-app notification row is written transactionally with the status
//! change that caused it; email dispatch through the notification
//! dispatcher is best-effort and happens after commit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A notification addressed to a user about one of their orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
	/// Unique identifier for this notification.
	pub id: String,
	/// The order this notification is about.
	pub order_id: String,
	/// The user this notification is addressed to.
	pub user_id: String,
	/// Typed template name for the notification content.
	pub kind: NotificationKind,
	/// Template context as JSON.
	pub payload: serde_json::Value,
	/// Channel this record belongs to.
	pub channel: Channel,
	/// Timestamp when read/sent; None means unread.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sent_at: Option<u64>,
	/// Timestamp when this record was created.
	pub created_at: u64,
}

/// Delivery channels for notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
	InApp,
	Email,
}

impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Channel::InApp => write!(f, "in_app"),
			Channel::Email => write!(f, "email"),
		}
	}
}

impl FromStr for Channel {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"in_app" => Ok(Channel::InApp),
			"email" => Ok(Channel::Email),
			other => Err(format!("unknown channel '{}'", other)),
		}
	}
}

/// The kinds of notifications the lifecycle engine produces.
///
/// Template rendering happens behind the dispatcher; the engine only names
/// the template and supplies its context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
	/// Order placed, confirmation for the customer.
	OrderCreated,
	/// Courier dispatch approved by an admin.
	OrderApproved,
	/// Generic status change.
	StatusUpdated,
	/// Washing done; the customer must choose a delivery method.
	DeliveryChoiceRequested,
	/// Customer chose to collect in person.
	SelfPickupChosen,
	/// Courier return chosen; the delivery fee must be paid first.
	DeliveryFeeDue,
}

impl NotificationKind {
	/// Template name handed to the notification dispatcher.
	pub fn template(&self) -> &'static str {
		match self {
			NotificationKind::OrderCreated => "order_created",
			NotificationKind::OrderApproved => "order_approved",
			NotificationKind::StatusUpdated => "status_updated",
			NotificationKind::DeliveryChoiceRequested => "delivery_choice_requested",
			NotificationKind::SelfPickupChosen => "self_pickup_chosen",
			NotificationKind::DeliveryFeeDue => "delivery_fee_due",
		}
	}
}
