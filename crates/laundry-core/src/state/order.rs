//! Order state machine implementation.
//!
//! Defines which statuses the generic update-status operation may reach
//! from each current status, and the guard rules checked before a commit.
//! DICUCI -> MENUNGGU_KONFIRMASI_DELIVERY and the resolution of
//! MENUNGGU_KONFIRMASI_DELIVERY are deliberately absent from the table:
//! those edges belong to the dedicated confirm-delivery and
//! delivery-choice operations.

use crate::error::LifecycleError;
use laundry_types::{Order, OrderStatus, PickupMethod};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

// Static transition table - each state maps to allowed next states
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Dipesan,
		HashSet::from([OrderStatus::PesananDijemput, OrderStatus::Dicuci]),
	);
	m.insert(
		OrderStatus::PesananDijemput,
		HashSet::from([OrderStatus::Diambil]),
	);
	m.insert(OrderStatus::Diambil, HashSet::from([OrderStatus::Dicuci]));
	// DICUCI advances only through the confirm-delivery operation
	m.insert(OrderStatus::Dicuci, HashSet::new());
	// Resolved only through the delivery-choice operation
	m.insert(OrderStatus::MenungguKonfirmasiDelivery, HashSet::new());
	m.insert(
		OrderStatus::MenungguPembayaranDelivery,
		HashSet::from([OrderStatus::Dikirim]),
	);
	m.insert(
		OrderStatus::MenungguAmbilSendiri,
		HashSet::from([OrderStatus::Selesai]),
	);
	m.insert(OrderStatus::Dikirim, HashSet::from([OrderStatus::Selesai]));
	m.insert(OrderStatus::Selesai, HashSet::new()); // terminal
	m
});

/// Checks if a generic status transition is valid.
pub fn is_valid_transition(from: &OrderStatus, to: &OrderStatus) -> bool {
	TRANSITIONS.get(from).is_some_and(|set| set.contains(to))
}

/// Enforces the guard rules for a target status.
///
/// Callers run this after the adjacency check and before the commit; the
/// commit itself re-checks the pre-status inside the store.
pub fn check_guards(order: &Order, target: OrderStatus) -> Result<(), LifecycleError> {
	match target {
		OrderStatus::PesananDijemput => {
			if order.pickup_method != PickupMethod::Pickup {
				return Err(LifecycleError::PreconditionFailed(
					"courier dispatch requires a PICKUP order".into(),
				));
			}
			if !order.admin_approved {
				return Err(LifecycleError::PreconditionFailed(
					"courier dispatch requires admin approval".into(),
				));
			}
		}
		OrderStatus::Diambil => {
			if order.pickup_method != PickupMethod::Pickup {
				return Err(LifecycleError::PreconditionFailed(
					"courier collection requires a PICKUP order".into(),
				));
			}
		}
		_ => {}
	}
	Ok(())
}
