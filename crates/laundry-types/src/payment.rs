//! Payment records attached to orders.
//!
//! An order accumulates payments over its lifetime: the initial order
//! payment at creation, plus a separate delivery-fee payment when courier
//! return is chosen later. PENDING to PAID is the only mutation and is
//! terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A payment record belonging to an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
	/// Unique identifier for this payment.
	pub id: String,
	/// The order this payment belongs to.
	pub order_id: String,
	/// Payment method.
	pub method: PaymentMethod,
	/// Amount in rupiah.
	pub amount: u64,
	/// Current payment state.
	pub status: PaymentStatus,
	/// Timestamp when the payment was confirmed; None while pending.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paid_at: Option<u64>,
	/// Timestamp when this record was created.
	pub created_at: u64,
}

impl Payment {
	/// Returns true while this payment awaits confirmation.
	pub fn is_pending(&self) -> bool {
		self.status == PaymentStatus::Pending
	}
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
	Qris,
	Cash,
	Transfer,
}

impl fmt::Display for PaymentMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PaymentMethod::Qris => write!(f, "QRIS"),
			PaymentMethod::Cash => write!(f, "CASH"),
			PaymentMethod::Transfer => write!(f, "TRANSFER"),
		}
	}
}

/// State of a payment record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
	/// Created, awaiting confirmation.
	Pending,
	/// Confirmed. Terminal.
	Paid,
}

impl fmt::Display for PaymentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PaymentStatus::Pending => write!(f, "PENDING"),
			PaymentStatus::Paid => write!(f, "PAID"),
		}
	}
}
