//! Order store module for the laundry order system.
//!
//! This module provides the persistence abstraction for orders, items,
//! payments and notifications. The interface is domain-shaped rather than
//! key-value: reads are batched (an order comes back with its items and
//! payments in one call) and writes are atomic units that re-check their
//! precondition inside the backend's critical section, so concurrent
//! transitions against the same order serialize and the loser is rejected
//! instead of corrupting state.

use async_trait::async_trait;
use laundry_types::{
	ConfigSchema, ImplementationRegistry, Notification, Order, OrderBundle, OrderItem,
	OrderStatus, Payment, PaymentMethod, ServiceItem, TransitionGuard,
};
use std::time::Duration;
use thiserror::Error;

pub(crate) mod dataset;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
	/// A requested record does not exist.
	#[error("Not found")]
	NotFound,
	/// A commit lost the race: the order no longer satisfies the guard.
	#[error("Stale order state: order is now {actual}")]
	StaleOrder { actual: OrderStatus },
	/// A payment mutation targeted a payment that is no longer pending.
	#[error("Payment is not pending")]
	PaymentNotPending,
	/// An insert collided with an existing id.
	#[error("Duplicate id: {0}")]
	Duplicate(String),
	/// Serialization/deserialization failure.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Failure in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Configuration failure while constructing a backend.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// The backend did not answer within the bounded timeout.
	#[error("Store operation timed out")]
	Timeout,
}

/// Trait defining the interface for order store backends.
///
/// Every write that must be atomic is a single method here, so a
/// backend can wrap it in whatever transaction mechanism it has. The
/// guard passed to [`commit_transition`](StoreInterface::commit_transition)
/// must be re-checked against the live record inside the critical section.
#[async_trait]
pub trait StoreInterface: Send + Sync {
	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Inserts or replaces a catalog service.
	async fn upsert_service(&self, service: ServiceItem) -> Result<(), StoreError>;

	/// Retrieves a catalog service by id.
	async fn get_service(&self, id: &str) -> Result<ServiceItem, StoreError>;

	/// Atomically inserts an order, its items and its initial payment.
	async fn create_order(
		&self,
		order: Order,
		items: Vec<OrderItem>,
		payment: Payment,
	) -> Result<(), StoreError>;

	/// Retrieves an order by id.
	async fn get_order(&self, id: &str) -> Result<Order, StoreError>;

	/// Retrieves an order together with its items and payments.
	async fn get_order_bundle(&self, id: &str) -> Result<OrderBundle, StoreError>;

	/// Atomically applies a transition commit: re-checks the guard, applies
	/// the patch, stamps `updated_at`, and inserts the accompanying
	/// notification and payment records when present.
	async fn commit_transition(
		&self,
		order_id: &str,
		guard: TransitionGuard,
		patch: laundry_types::OrderPatch,
		notification: Option<Notification>,
		payment: Option<Payment>,
	) -> Result<Order, StoreError>;

	/// Inserts a notification record outside a transition commit.
	async fn insert_notification(&self, notification: Notification) -> Result<(), StoreError>;

	/// Marks a notification as read, stamping `sent_at`.
	///
	/// Fails with NotFound when the notification does not exist or is
	/// addressed to a different user.
	async fn mark_notification_read(
		&self,
		id: &str,
		user_id: &str,
	) -> Result<Notification, StoreError>;

	/// Lists notifications addressed to a user, newest first.
	async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, StoreError>;

	/// Lists payments belonging to an order, oldest first.
	async fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError>;

	/// Flips a PENDING payment to PAID, recording the method actually used
	/// and the confirmation timestamp.
	async fn mark_payment_paid(
		&self,
		order_id: &str,
		payment_id: &str,
		method: PaymentMethod,
		paid_at: u64,
	) -> Result<Payment, StoreError>;
}

/// Type alias for store factory functions.
pub type StoreFactory = fn(&toml::Value) -> Result<Box<dyn StoreInterface>, StoreError>;

/// Registry trait for store implementations.
pub trait StoreRegistry: ImplementationRegistry<Factory = StoreFactory> {}

/// Get all registered store implementations.
///
/// Returns a vector of (name, factory) tuples for all available store
/// implementations, used by the engine builder to register defaults.
pub fn get_all_implementations() -> Vec<(&'static str, StoreFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level store service with bounded operation timeouts.
///
/// Wraps a backend and applies `tokio::time::timeout` to every call. A
/// store timeout is a dependency failure: the caller's operation fails.
pub struct StoreService {
	/// The underlying store backend implementation.
	backend: Box<dyn StoreInterface>,
	/// Upper bound for any single backend call.
	op_timeout: Duration,
}

impl StoreService {
	/// Creates a new StoreService with the specified backend and timeout.
	pub fn new(backend: Box<dyn StoreInterface>, op_timeout: Duration) -> Self {
		Self {
			backend,
			op_timeout,
		}
	}

	async fn bounded<T>(
		&self,
		fut: impl std::future::Future<Output = Result<T, StoreError>>,
	) -> Result<T, StoreError> {
		match tokio::time::timeout(self.op_timeout, fut).await {
			Ok(result) => result,
			Err(_) => Err(StoreError::Timeout),
		}
	}

	pub async fn upsert_service(&self, service: ServiceItem) -> Result<(), StoreError> {
		self.bounded(self.backend.upsert_service(service)).await
	}

	pub async fn get_service(&self, id: &str) -> Result<ServiceItem, StoreError> {
		self.bounded(self.backend.get_service(id)).await
	}

	pub async fn create_order(
		&self,
		order: Order,
		items: Vec<OrderItem>,
		payment: Payment,
	) -> Result<(), StoreError> {
		self.bounded(self.backend.create_order(order, items, payment))
			.await
	}

	pub async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
		self.bounded(self.backend.get_order(id)).await
	}

	pub async fn get_order_bundle(&self, id: &str) -> Result<OrderBundle, StoreError> {
		self.bounded(self.backend.get_order_bundle(id)).await
	}

	pub async fn commit_transition(
		&self,
		order_id: &str,
		guard: TransitionGuard,
		patch: laundry_types::OrderPatch,
		notification: Option<Notification>,
		payment: Option<Payment>,
	) -> Result<Order, StoreError> {
		self.bounded(
			self.backend
				.commit_transition(order_id, guard, patch, notification, payment),
		)
		.await
	}

	pub async fn insert_notification(&self, notification: Notification) -> Result<(), StoreError> {
		self.bounded(self.backend.insert_notification(notification))
			.await
	}

	pub async fn mark_notification_read(
		&self,
		id: &str,
		user_id: &str,
	) -> Result<Notification, StoreError> {
		self.bounded(self.backend.mark_notification_read(id, user_id))
			.await
	}

	pub async fn notifications_for_user(
		&self,
		user_id: &str,
	) -> Result<Vec<Notification>, StoreError> {
		self.bounded(self.backend.notifications_for_user(user_id))
			.await
	}

	pub async fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError> {
		self.bounded(self.backend.payments_for_order(order_id))
			.await
	}

	pub async fn mark_payment_paid(
		&self,
		order_id: &str,
		payment_id: &str,
		method: PaymentMethod,
		paid_at: u64,
	) -> Result<Payment, StoreError> {
		self.bounded(
			self.backend
				.mark_payment_paid(order_id, payment_id, method, paid_at),
		)
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use laundry_types::{Schema, ValidationError};

	struct StalledStore;

	struct StalledSchema;

	impl ConfigSchema for StalledSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![]).validate(config)
		}
	}

	#[async_trait]
	impl StoreInterface for StalledStore {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(StalledSchema)
		}

		async fn upsert_service(&self, _service: ServiceItem) -> Result<(), StoreError> {
			std::future::pending().await
		}

		async fn get_service(&self, _id: &str) -> Result<ServiceItem, StoreError> {
			std::future::pending().await
		}

		async fn create_order(
			&self,
			_order: Order,
			_items: Vec<OrderItem>,
			_payment: Payment,
		) -> Result<(), StoreError> {
			std::future::pending().await
		}

		async fn get_order(&self, _id: &str) -> Result<Order, StoreError> {
			std::future::pending().await
		}

		async fn get_order_bundle(&self, _id: &str) -> Result<OrderBundle, StoreError> {
			std::future::pending().await
		}

		async fn commit_transition(
			&self,
			_order_id: &str,
			_guard: TransitionGuard,
			_patch: laundry_types::OrderPatch,
			_notification: Option<Notification>,
			_payment: Option<Payment>,
		) -> Result<Order, StoreError> {
			std::future::pending().await
		}

		async fn insert_notification(
			&self,
			_notification: Notification,
		) -> Result<(), StoreError> {
			std::future::pending().await
		}

		async fn mark_notification_read(
			&self,
			_id: &str,
			_user_id: &str,
		) -> Result<Notification, StoreError> {
			std::future::pending().await
		}

		async fn notifications_for_user(
			&self,
			_user_id: &str,
		) -> Result<Vec<Notification>, StoreError> {
			std::future::pending().await
		}

		async fn payments_for_order(&self, _order_id: &str) -> Result<Vec<Payment>, StoreError> {
			std::future::pending().await
		}

		async fn mark_payment_paid(
			&self,
			_order_id: &str,
			_payment_id: &str,
			_method: PaymentMethod,
			_paid_at: u64,
		) -> Result<Payment, StoreError> {
			std::future::pending().await
		}
	}

	#[tokio::test(start_paused = true)]
	async fn stalled_backend_times_out() {
		let service = StoreService::new(Box::new(StalledStore), Duration::from_secs(1));
		let result = service.get_order("o-1").await;
		assert!(matches!(result, Err(StoreError::Timeout)));
	}
}
