//! Pricing engine for the laundry order system.
//!
//! Computes order totals from catalog prices plus the configured pickup
//! and delivery surcharges. The pickup fee is decided once at order
//! creation and never recomputed; the delivery fee is added later by
//! mutating the total upward, which keeps earlier partial payments valid
//! against the original amount.

use laundry_types::{Order, OrderItem, PickupMethod};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while pricing an order.
#[derive(Debug, Error)]
pub enum PricingError {
	/// A quantity/price combination does not fit the monetary type.
	#[error("Price overflow for qty {qty} at unit price {unit_price}")]
	Overflow { qty: u32, unit_price: u64 },
	/// The summed order total does not fit the monetary type.
	#[error("Order total overflow")]
	TotalOverflow,
}

/// Fixed surcharges for a deployment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeSchedule {
	/// Surcharge when a courier collects the laundry. Rupiah.
	pub pickup_fee: u64,
	/// Surcharge when courier return is chosen. Rupiah.
	pub delivery_fee: u64,
}

/// Deterministic price arithmetic over a fee schedule.
#[derive(Debug, Clone)]
pub struct PricingService {
	fees: FeeSchedule,
}

impl PricingService {
	/// Creates a new PricingService with the given fee schedule.
	pub fn new(fees: FeeSchedule) -> Self {
		Self { fees }
	}

	/// The pickup surcharge for a pickup method.
	pub fn pickup_fee(&self, method: PickupMethod) -> u64 {
		match method {
			PickupMethod::Pickup => self.fees.pickup_fee,
			PickupMethod::SelfDrop => 0,
		}
	}

	/// The courier-return surcharge.
	pub fn delivery_fee(&self) -> u64 {
		self.fees.delivery_fee
	}

	/// Subtotal for one line item.
	pub fn line_subtotal(&self, qty: u32, unit_price: u64) -> Result<u64, PricingError> {
		u64::from(qty)
			.checked_mul(unit_price)
			.ok_or(PricingError::Overflow { qty, unit_price })
	}

	/// Order total at creation: item subtotals plus the pickup surcharge.
	pub fn order_total(
		&self,
		subtotals: impl IntoIterator<Item = u64>,
		pickup_fee: u64,
	) -> Result<u64, PricingError> {
		let mut total = pickup_fee;
		for subtotal in subtotals {
			total = total
				.checked_add(subtotal)
				.ok_or(PricingError::TotalOverflow)?;
		}
		Ok(total)
	}

	/// Recomputes what an order's total must be from its parts.
	///
	/// `price_total = sum(item subtotals) + pickup_fee + delivery fee if
	/// chosen`. Used by tests to assert the invariant after every
	/// transition.
	pub fn expected_total(&self, order: &Order, items: &[OrderItem]) -> u64 {
		let items_sum: u64 = items.iter().map(|i| i.subtotal).sum();
		let delivery = if order.delivery_required == Some(true) {
			self.fees.delivery_fee
		} else {
			0
		};
		items_sum + order.pickup_fee + delivery
	}
}
