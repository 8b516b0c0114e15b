//! File-backed store backend.
//!
//! Persists the dataset as one JSON snapshot, rewritten through a
//! write-to-temp-then-rename sequence after every mutation so a crash never
//! leaves a half-written snapshot behind. An fs2 exclusive lock on a
//! sibling lock file keeps two processes from opening the same snapshot.

use crate::dataset::Dataset;
use crate::{StoreError, StoreFactory, StoreInterface, StoreRegistry};
use async_trait::async_trait;
use fs2::FileExt;
use laundry_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Notification, Order, OrderBundle,
	OrderItem, OrderPatch, Payment, PaymentMethod, Schema, ServiceItem, TransitionGuard,
	ValidationError,
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// File-backed store implementation.
pub struct FileStore {
	/// Snapshot path.
	path: PathBuf,
	/// Held for the lifetime of the store; released on drop.
	_lock_file: std::fs::File,
	/// The dataset protected by a read-write lock.
	data: Arc<RwLock<Dataset>>,
}

impl FileStore {
	/// Opens (or creates) a snapshot at the given path.
	pub fn open(path: PathBuf) -> Result<Self, StoreError> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| StoreError::Backend(format!("Failed to create directory: {}", e)))?;
		}

		let lock_path = path.with_extension("lock");
		let lock_file = OpenOptions::new()
			.create(true)
			.truncate(false)
			.write(true)
			.open(&lock_path)
			.map_err(|e| StoreError::Backend(format!("Failed to open lock file: {}", e)))?;
		lock_file.try_lock_exclusive().map_err(|_| {
			StoreError::Backend(format!(
				"Snapshot {} is locked by another process",
				path.display()
			))
		})?;

		let dataset = match std::fs::read(&path) {
			Ok(bytes) => serde_json::from_slice(&bytes)
				.map_err(|e| StoreError::Serialization(e.to_string()))?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Dataset::default(),
			Err(e) => {
				return Err(StoreError::Backend(format!(
					"Failed to read snapshot: {}",
					e
				)))
			}
		};

		tracing::info!(
			path = %path.display(),
			orders = dataset.orders.len(),
			"Opened order snapshot"
		);

		Ok(Self {
			path,
			_lock_file: lock_file,
			data: Arc::new(RwLock::new(dataset)),
		})
	}

	/// Runs a mutation and persists the snapshot while still holding the
	/// write lock, so readers never observe unpersisted state.
	async fn mutate<T>(
		&self,
		apply: impl FnOnce(&mut Dataset) -> Result<T, StoreError>,
	) -> Result<T, StoreError> {
		let mut data = self.data.write().await;
		let out = apply(&mut data)?;

		let bytes = serde_json::to_vec_pretty(&*data)
			.map_err(|e| StoreError::Serialization(e.to_string()))?;
		let tmp = self.path.with_extension("json.tmp");
		tokio::fs::write(&tmp, &bytes)
			.await
			.map_err(|e| StoreError::Backend(format!("Failed to write snapshot: {}", e)))?;
		tokio::fs::rename(&tmp, &self.path)
			.await
			.map_err(|e| StoreError::Backend(format!("Failed to replace snapshot: {}", e)))?;

		Ok(out)
	}
}

#[async_trait]
impl StoreInterface for FileStore {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStoreSchema)
	}

	async fn upsert_service(&self, service: ServiceItem) -> Result<(), StoreError> {
		self.mutate(|data| {
			data.upsert_service(service);
			Ok(())
		})
		.await
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
		self.mutate(|data| data.create_order(order, items, payment))
			.await
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
		self.mutate(|data| data.commit_transition(order_id, guard, patch, notification, payment))
			.await
	}

	async fn insert_notification(&self, notification: Notification) -> Result<(), StoreError> {
		self.mutate(|data| data.insert_notification(notification))
			.await
	}

	async fn mark_notification_read(
		&self,
		id: &str,
		user_id: &str,
	) -> Result<Notification, StoreError> {
		self.mutate(|data| data.mark_notification_read(id, user_id))
			.await
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
		self.mutate(|data| data.mark_payment_paid(order_id, payment_id, method, paid_at))
			.await
	}
}

/// Configuration schema for FileStore.
pub struct FileStoreSchema;

impl ConfigSchema for FileStoreSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::required("path", FieldType::String)]).validate(config)
	}
}

/// Factory function to create a file store from configuration.
///
/// Configuration parameters:
/// - `path`: snapshot file location (required)
pub fn create_store(config: &toml::Value) -> Result<Box<dyn StoreInterface>, StoreError> {
	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StoreError::Configuration("'path' is required".into()))?;
	Ok(Box::new(FileStore::open(PathBuf::from(path))?))
}

/// Registry entry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StoreFactory;

	fn factory() -> Self::Factory {
		create_store
	}
}

impl StoreRegistry for Registry {}
