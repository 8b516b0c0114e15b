//! Service catalog types.
//!
//! Catalog entries are read-only from the lifecycle engine's perspective;
//! order items snapshot their price at order time.

use serde::{Deserialize, Serialize};

/// A catalog service that can be ordered (e.g. wash-and-fold per kg).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
	/// Unique identifier for this service.
	pub id: String,
	/// Human-readable service name.
	pub name: String,
	/// Price per unit in rupiah.
	pub base_price: u64,
	/// Billing unit, e.g. "kg" or "piece".
	pub unit: String,
}
