//! In-memory store backend.
//!
//! Keeps the whole dataset in a HashMap behind a read-write lock. Fast,
//! unpersisted, used for development and tests. Every write takes the
//! write lock, so concurrent commits against the same order serialize and
//! a stale guard loses cleanly.

use crate::dataset::Dataset;
use crate::{StoreError, StoreFactory, StoreInterface, StoreRegistry};
use async_trait::async_trait;
use laundry_types::{
	ConfigSchema, ImplementationRegistry, Notification, Order, OrderBundle, OrderItem, OrderPatch,
	Payment, PaymentMethod, Schema, ServiceItem, TransitionGuard, ValidationError,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory store implementation.
pub struct MemoryStore {
	/// The dataset protected by a read-write lock.
	data: Arc<RwLock<Dataset>>,
}

impl MemoryStore {
	/// Creates a new, empty MemoryStore.
	pub fn new() -> Self {
		Self {
			data: Arc::new(RwLock::new(Dataset::default())),
		}
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StoreInterface for MemoryStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStoreSchema)
	}

	async fn upsert_service(&self, service: ServiceItem) -> Result<(), StoreError> {
		self.data.write().await.upsert_service(service);
		Ok(())
	}

	async fn get_service(&self, id: &str) -> Result<ServiceItem, StoreError> {
		self.data.read().await.get_service(id)
	}

	async fn create_order(
		&self,
		order: Order,
		items: Vec<OrderItem>,
		payment: Payment,
	) -> Result<(), StoreError> {
		self.data.write().await.create_order(order, items, payment)
	}

	async fn get_order(&self, id: &str) -> Result<Order, StoreError> {
		self.data.read().await.get_order(id)
	}

	async fn get_order_bundle(&self, id: &str) -> Result<OrderBundle, StoreError> {
		self.data.read().await.get_order_bundle(id)
	}

	async fn commit_transition(
		&self,
		order_id: &str,
		guard: TransitionGuard,
		patch: OrderPatch,
		notification: Option<Notification>,
		payment: Option<Payment>,
	) -> Result<Order, StoreError> {
		self.data
			.write()
			.await
			.commit_transition(order_id, guard, patch, notification, payment)
	}

	async fn insert_notification(&self, notification: Notification) -> Result<(), StoreError> {
		self.data.write().await.insert_notification(notification)
	}

	async fn mark_notification_read(
		&self,
		id: &str,
		user_id: &str,
	) -> Result<Notification, StoreError> {
		self.data.write().await.mark_notification_read(id, user_id)
	}

	async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, StoreError> {
		Ok(self.data.read().await.notifications_for_user(user_id))
	}

	async fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError> {
		self.data.read().await.payments_for_order(order_id)
	}

	async fn mark_payment_paid(
		&self,
		order_id: &str,
		payment_id: &str,
		method: PaymentMethod,
		paid_at: u64,
	) -> Result<Payment, StoreError> {
		self.data
			.write()
			.await
			.mark_payment_paid(order_id, payment_id, method, paid_at)
	}
}

/// Configuration schema for MemoryStore.
pub struct MemoryStoreSchema;

impl ConfigSchema for MemoryStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		Schema::new(vec![]).validate(config)
	}
}

/// Factory function to create a memory store from configuration.
pub fn create_store(_config: &toml::Value) -> Result<Box<dyn StoreInterface>, StoreError> {
	Ok(Box::new(MemoryStore::new()))
}

/// Registry entry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use laundry_types::{OrderStatus, PaymentStatus, PickupMethod};

	fn order(id: &str) -> Order {
		Order {
			id: id.into(),
			customer_id: "c-1".into(),
			pickup_method: PickupMethod::SelfDrop,
			status: OrderStatus::Dipesan,
			price_total: 16000,
			pickup_fee: 0,
			delivery_required: None,
			admin_approved: true,
			notification_email: None,
			estimated_arrival: None,
			created_at: 1,
			updated_at: 1,
		}
	}

	fn payment(id: &str, order_id: &str, amount: u64) -> Payment {
		Payment {
			id: id.into(),
			order_id: order_id.into(),
			method: PaymentMethod::Qris,
			amount,
			status: PaymentStatus::Pending,
			paid_at: None,
			created_at: 1,
		}
	}

	#[tokio::test]
	async fn create_and_bundle_round_trip() {
		let store = MemoryStore::new();
		store
			.create_order(order("o-1"), vec![], payment("p-1", "o-1", 16000))
			.await
			.unwrap();

		let bundle = store.get_order_bundle("o-1").await.unwrap();
		assert_eq!(bundle.order.id, "o-1");
		assert_eq!(bundle.payments.len(), 1);
		assert!(matches!(
			store.get_order_bundle("missing").await,
			Err(StoreError::NotFound)
		));
	}

	#[tokio::test]
	async fn duplicate_order_id_rejected() {
		let store = MemoryStore::new();
		store
			.create_order(order("o-1"), vec![], payment("p-1", "o-1", 16000))
			.await
			.unwrap();
		let result = store
			.create_order(order("o-1"), vec![], payment("p-2", "o-1", 16000))
			.await;
		assert!(matches!(result, Err(StoreError::Duplicate(_))));
	}

	#[tokio::test]
	async fn stale_guard_loses_the_race() {
		let store = MemoryStore::new();
		store
			.create_order(order("o-1"), vec![], payment("p-1", "o-1", 16000))
			.await
			.unwrap();

		// First commit wins.
		store
			.commit_transition(
				"o-1",
				TransitionGuard::status(OrderStatus::Dipesan),
				OrderPatch {
					status: Some(OrderStatus::Dicuci),
					..Default::default()
				},
				None,
				None,
			)
			.await
			.unwrap();

		// Second commit carries the now-stale guard.
		let result = store
			.commit_transition(
				"o-1",
				TransitionGuard::status(OrderStatus::Dipesan),
				OrderPatch {
					status: Some(OrderStatus::Dicuci),
					..Default::default()
				},
				None,
				None,
			)
			.await;
		assert!(matches!(
			result,
			Err(StoreError::StaleOrder {
				actual: OrderStatus::Dicuci
			})
		));
	}

	#[tokio::test]
	async fn payment_flip_is_terminal() {
		let store = MemoryStore::new();
		store
			.create_order(order("o-1"), vec![], payment("p-1", "o-1", 16000))
			.await
			.unwrap();

		let paid = store
			.mark_payment_paid("o-1", "p-1", PaymentMethod::Cash, 42)
			.await
			.unwrap();
		assert_eq!(paid.status, PaymentStatus::Paid);
		assert_eq!(paid.method, PaymentMethod::Cash);
		assert_eq!(paid.paid_at, Some(42));

		let again = store
			.mark_payment_paid("o-1", "p-1", PaymentMethod::Cash, 43)
			.await;
		assert!(matches!(again, Err(StoreError::PaymentNotPending)));
	}
}
