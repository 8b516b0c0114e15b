//! Store-boundary types.
//!
//! The order store exposes batched reads and atomic, precondition-checked
//! writes. These types carry the batched result, the field patch a commit
//! applies, and the guard the store re-checks inside its critical section.

use crate::{Order, OrderItem, OrderStatus, Payment};
use serde::{Deserialize, Serialize};

/// An order together with its items and payments, read in one store call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBundle {
	pub order: Order,
	pub items: Vec<OrderItem>,
	pub payments: Vec<Payment>,
}

/// Field changes applied atomically by a transition commit.
///
/// Only the fields a transition touches are set; everything else is left
/// untouched. `updated_at` is stamped by the store.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
	pub status: Option<OrderStatus>,
	pub admin_approved: Option<bool>,
	/// Outer None = leave alone, Some(inner) = write the tri-state value.
	pub delivery_required: Option<Option<bool>>,
	pub price_total: Option<u64>,
	pub estimated_arrival: Option<u64>,
}

impl OrderPatch {
	/// Applies this patch to an order in place.
	pub fn apply(&self, order: &mut Order) {
		if let Some(status) = self.status {
			order.status = status;
		}
		if let Some(approved) = self.admin_approved {
			order.admin_approved = approved;
		}
		if let Some(required) = self.delivery_required {
			order.delivery_required = required;
		}
		if let Some(total) = self.price_total {
			order.price_total = total;
		}
		if let Some(eta) = self.estimated_arrival {
			order.estimated_arrival = Some(eta);
		}
	}
}

/// Precondition re-checked by the store inside its critical section.
///
/// Two concurrent commits against the same order cannot both succeed off
/// the same pre-transition snapshot: the loser fails the guard check and
/// is rejected with a stale-state error.
#[derive(Debug, Clone)]
pub struct TransitionGuard {
	/// The status the order must still have.
	pub status: OrderStatus,
	/// When set, the approval flag the order must still have.
	pub admin_approved: Option<bool>,
}

impl TransitionGuard {
	/// Guard on status alone.
	pub fn status(status: OrderStatus) -> Self {
		Self {
			status,
			admin_approved: None,
		}
	}

	/// Returns true when the order still satisfies this guard.
	pub fn holds(&self, order: &Order) -> bool {
		order.status == self.status
			&& self
				.admin_approved
				.is_none_or(|expected| order.admin_approved == expected)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::PickupMethod;

	fn order() -> Order {
		Order {
			id: "o-1".into(),
			customer_id: "c-1".into(),
			pickup_method: PickupMethod::SelfDrop,
			status: OrderStatus::Dipesan,
			price_total: 16000,
			pickup_fee: 0,
			delivery_required: None,
			admin_approved: true,
			notification_email: None,
			estimated_arrival: None,
			created_at: 0,
			updated_at: 0,
		}
	}

	#[test]
	fn patch_only_touches_set_fields() {
		let mut o = order();
		OrderPatch {
			status: Some(OrderStatus::Dicuci),
			price_total: Some(26000),
			..Default::default()
		}
		.apply(&mut o);
		assert_eq!(o.status, OrderStatus::Dicuci);
		assert_eq!(o.price_total, 26000);
		assert!(o.admin_approved);
		assert_eq!(o.delivery_required, None);
	}

	#[test]
	fn patch_writes_tri_state_delivery_choice() {
		let mut o = order();
		OrderPatch {
			delivery_required: Some(Some(false)),
			..Default::default()
		}
		.apply(&mut o);
		assert_eq!(o.delivery_required, Some(false));
	}

	#[test]
	fn guard_rejects_stale_status_and_stale_approval() {
		let o = order();
		assert!(TransitionGuard::status(OrderStatus::Dipesan).holds(&o));
		assert!(!TransitionGuard::status(OrderStatus::Dicuci).holds(&o));
		let guard = TransitionGuard {
			status: OrderStatus::Dipesan,
			admin_approved: Some(false),
		};
		assert!(!guard.holds(&o));
	}
}
