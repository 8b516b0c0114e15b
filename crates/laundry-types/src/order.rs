//! Order types for the laundry system.
//!
//! This module defines the order aggregate, its line items, and the status
//! vocabulary driven by the lifecycle engine's state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer's laundry order with its lifecycle state.
///
/// Orders are created through the lifecycle engine and mutated only through
/// engine commits; callers never write fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Identifier of the customer who owns this order.
	pub customer_id: String,
	/// How the dirty laundry reaches the shop.
	pub pickup_method: PickupMethod,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Total price in rupiah, including pickup and delivery surcharges.
	pub price_total: u64,
	/// Pickup surcharge applied at creation; 0 for SELF orders.
	pub pickup_fee: u64,
	/// Whether the finished laundry is returned by courier.
	/// None until the customer has made the delivery choice.
	pub delivery_required: Option<bool>,
	/// Whether an admin has approved courier dispatch for a PICKUP order.
	pub admin_approved: bool,
	/// Optional email override used by the notification dispatcher.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notification_email: Option<String>,
	/// Estimated courier arrival, set when entering PESANAN_DIJEMPUT.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_arrival: Option<u64>,
	/// Timestamp when this order was created.
	pub created_at: u64,
	/// Timestamp when this order was last updated.
	pub updated_at: u64,
}

impl Order {
	/// Returns true when the given user owns this order.
	pub fn is_owned_by(&self, user_id: &str) -> bool {
		self.customer_id == user_id
	}
}

/// A single line item of an order.
///
/// Items snapshot the catalog price at order time and are immutable after
/// creation, even if the catalog price later changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
	/// Unique identifier for this item.
	pub id: String,
	/// The order this item belongs to.
	pub order_id: String,
	/// The catalog service this item references.
	pub service_id: String,
	/// Quantity, at least 1.
	pub qty: u32,
	/// Unit price snapshot taken from the catalog at order time.
	pub unit_price: u64,
	/// qty * unit_price.
	pub subtotal: u64,
}

/// Request payload for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
	/// How the dirty laundry reaches the shop.
	pub pickup_method: PickupMethod,
	/// Requested line items; must be non-empty.
	pub items: Vec<NewOrderItem>,
	/// Optional email override for notifications on this order.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notification_email: Option<String>,
}

/// A requested line item within a [`NewOrder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
	/// Catalog service to order.
	pub service_id: String,
	/// Quantity, at least 1.
	pub qty: u32,
}

/// How the dirty laundry reaches the shop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PickupMethod {
	/// A courier collects the laundry from the customer.
	#[serde(rename = "PICKUP")]
	Pickup,
	/// The customer drops the laundry off themselves.
	#[serde(rename = "SELF")]
	SelfDrop,
}

impl fmt::Display for PickupMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PickupMethod::Pickup => write!(f, "PICKUP"),
			PickupMethod::SelfDrop => write!(f, "SELF"),
		}
	}
}

/// The customer's choice for getting finished laundry back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeliveryMethod {
	/// The customer collects the laundry in person.
	#[serde(rename = "SELF_PICKUP")]
	SelfPickup,
	/// A courier returns the laundry for an added fee.
	#[serde(rename = "DELIVERY")]
	Delivery,
}

impl fmt::Display for DeliveryMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DeliveryMethod::SelfPickup => write!(f, "SELF_PICKUP"),
			DeliveryMethod::Delivery => write!(f, "DELIVERY"),
		}
	}
}

/// Status of an order in the lifecycle state machine.
///
/// The wire names are the Indonesian operational vocabulary used by the
/// shop; the lifecycle engine owns the adjacency between them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order placed, awaiting pickup or drop-off.
	Dipesan,
	/// Courier dispatched to collect the laundry.
	PesananDijemput,
	/// Courier has collected the laundry.
	Diambil,
	/// Laundry is being washed.
	Dicuci,
	/// Washing done, waiting for the customer's delivery choice.
	MenungguKonfirmasiDelivery,
	/// Customer will collect in person.
	MenungguAmbilSendiri,
	/// Courier return chosen, waiting for the delivery fee payment.
	MenungguPembayaranDelivery,
	/// Out for delivery.
	Dikirim,
	/// Order complete. Terminal.
	Selesai,
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OrderStatus::Dipesan => "DIPESAN",
			OrderStatus::PesananDijemput => "PESANAN_DIJEMPUT",
			OrderStatus::Diambil => "DIAMBIL",
			OrderStatus::Dicuci => "DICUCI",
			OrderStatus::MenungguKonfirmasiDelivery => "MENUNGGU_KONFIRMASI_DELIVERY",
			OrderStatus::MenungguAmbilSendiri => "MENUNGGU_AMBIL_SENDIRI",
			OrderStatus::MenungguPembayaranDelivery => "MENUNGGU_PEMBAYARAN_DELIVERY",
			OrderStatus::Dikirim => "DIKIRIM",
			OrderStatus::Selesai => "SELESAI",
		};
		write!(f, "{}", name)
	}
}

impl OrderStatus {
	/// Returns an iterator over all status variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Dipesan,
			Self::PesananDijemput,
			Self::Diambil,
			Self::Dicuci,
			Self::MenungguKonfirmasiDelivery,
			Self::MenungguAmbilSendiri,
			Self::MenungguPembayaranDelivery,
			Self::Dikirim,
			Self::Selesai,
		]
		.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_wire_names_match_operational_vocabulary() {
		let json = serde_json::to_string(&OrderStatus::MenungguKonfirmasiDelivery).unwrap();
		assert_eq!(json, "\"MENUNGGU_KONFIRMASI_DELIVERY\"");
		let parsed: OrderStatus = serde_json::from_str("\"PESANAN_DIJEMPUT\"").unwrap();
		assert_eq!(parsed, OrderStatus::PesananDijemput);
	}

	#[test]
	fn pickup_method_self_serializes_as_self() {
		assert_eq!(
			serde_json::to_string(&PickupMethod::SelfDrop).unwrap(),
			"\"SELF\""
		);
		assert_eq!(PickupMethod::SelfDrop.to_string(), "SELF");
	}
}
