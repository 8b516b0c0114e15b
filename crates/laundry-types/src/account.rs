//! Principal and role types used for authorization decisions.
//!
//! Authentication and session mechanics live outside this system; callers
//! hand the engine an already-authenticated principal. Admin-only
//! operations require the ADMIN role, customer-scoped operations require
//! ownership of the order.

use serde::{Deserialize, Serialize};

/// An authenticated caller of the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
	/// User identifier.
	pub id: String,
	/// Authorization role.
	pub role: Role,
}

impl Principal {
	/// Creates a customer principal.
	pub fn customer(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			role: Role::Customer,
		}
	}

	/// Creates an admin principal.
	pub fn admin(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			role: Role::Admin,
		}
	}

	/// Returns true for ADMIN-role principals.
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}

/// Authorization roles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	Customer,
	Admin,
}
