//! Builder for constructing a LifecycleEngine with pluggable implementations.
//!
//! The builder uses the factory pattern so different store backends and
//! notifier gateways can be plugged in based on configuration. Each
//! implementation's configuration block is validated against its schema
//! before the engine is assembled, so a bad deployment fails at startup.

use crate::engine::{event_bus::EventBus, LifecycleEngine};
use laundry_config::Config;
use laundry_notify::{NotifyFactory, NotifyInterface, NotifyService};
use laundry_pricing::{FeeSchedule, PricingService};
use laundry_storage::{StoreFactory, StoreService};
use laundry_types::Channel;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while assembling an engine.
#[derive(Debug, Error)]
pub enum BuildError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Builder wiring configuration to concrete implementations.
pub struct EngineBuilder {
	config: Config,
	store_factories: HashMap<String, StoreFactory>,
	notify_factories: HashMap<String, NotifyFactory>,
}

impl EngineBuilder {
	/// Creates a new builder with no factories registered.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			store_factories: HashMap::new(),
			notify_factories: HashMap::new(),
		}
	}

	/// Registers every implementation shipped in the workspace.
	pub fn with_defaults(mut self) -> Self {
		for (name, factory) in laundry_storage::get_all_implementations() {
			self.store_factories.insert(name.to_string(), factory);
		}
		for (name, factory) in laundry_notify::get_all_implementations() {
			self.notify_factories.insert(name.to_string(), factory);
		}
		self
	}

	/// Registers a store factory under a configuration name.
	pub fn with_store_factory(mut self, name: &str, factory: StoreFactory) -> Self {
		self.store_factories.insert(name.to_string(), factory);
		self
	}

	/// Registers a notifier factory under a configuration name.
	pub fn with_notify_factory(mut self, name: &str, factory: NotifyFactory) -> Self {
		self.notify_factories.insert(name.to_string(), factory);
		self
	}

	/// Builds the LifecycleEngine using the configured factories.
	pub fn build(self) -> Result<LifecycleEngine, BuildError> {
		let config = self.config;

		// Create the store backend
		let primary = &config.storage.primary;
		let store_config = config
			.storage
			.implementations
			.get(primary)
			.ok_or_else(|| BuildError::Config(format!("Primary storage '{}' not configured", primary)))?;
		let factory = self.store_factories.get(primary).ok_or_else(|| {
			BuildError::Config(format!("No store factory registered for '{}'", primary))
		})?;
		let backend = factory(store_config).map_err(|e| {
			tracing::error!(
				component = "storage",
				implementation = %primary,
				error = %e,
				"Failed to create store backend"
			);
			BuildError::Config(format!("Failed to create store backend '{}': {}", primary, e))
		})?;
		backend.config_schema().validate(store_config).map_err(|e| {
			BuildError::Config(format!(
				"Invalid configuration for store backend '{}': {}",
				primary, e
			))
		})?;
		tracing::info!(component = "storage", implementation = %primary, "Loaded");
		let store = Arc::new(StoreService::new(
			backend,
			Duration::from_secs(config.laundry.operation_timeout_seconds),
		));

		// Create notifier channels
		let mut channels: HashMap<Channel, Box<dyn NotifyInterface>> = HashMap::new();
		for (channel_name, impl_name) in &config.notify.channels {
			let channel: Channel = channel_name
				.parse()
				.map_err(|e: String| BuildError::Config(e))?;
			let notify_config = config.notify.implementations.get(impl_name).ok_or_else(|| {
				BuildError::Config(format!(
					"Notifier implementation '{}' not configured",
					impl_name
				))
			})?;
			let factory = self.notify_factories.get(impl_name).ok_or_else(|| {
				BuildError::Config(format!("No notifier factory registered for '{}'", impl_name))
			})?;
			let notifier = factory(notify_config).map_err(|e| {
				tracing::error!(
					component = "notify",
					implementation = %impl_name,
					error = %e,
					"Failed to create notifier"
				);
				BuildError::Config(format!("Failed to create notifier '{}': {}", impl_name, e))
			})?;
			notifier.config_schema().validate(notify_config).map_err(|e| {
				BuildError::Config(format!(
					"Invalid configuration for notifier '{}': {}",
					impl_name, e
				))
			})?;
			tracing::info!(
				component = "notify",
				channel = %channel_name,
				implementation = %impl_name,
				"Loaded"
			);
			channels.insert(channel, notifier);
		}
		let notify = Arc::new(NotifyService::new(
			channels,
			Duration::from_secs(config.laundry.notify_timeout_seconds),
		));

		let pricing = Arc::new(PricingService::new(FeeSchedule {
			pickup_fee: config.pricing.pickup_fee,
			delivery_fee: config.pricing.delivery_fee,
		}));
		let event_bus = EventBus::new(config.events.channel_capacity);

		Ok(LifecycleEngine::new(
			config, store, notify, pricing, event_bus,
		))
	}
}
