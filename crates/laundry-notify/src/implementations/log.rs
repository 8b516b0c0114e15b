//! Logging notification sink.
//!
//! Writes every dispatch to the tracing log instead of delivering it
//! anywhere, for development and test scenarios where no gateway exists.

use crate::{NotifyError, NotifyFactory, NotifyInterface, NotifyRegistry};
use async_trait::async_trait;
use laundry_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// Notifier that logs instead of sending.
pub struct LogNotifier;

#[async_trait]
impl NotifyInterface for LogNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LogNotifierSchema)
	}

	async fn send(
		&self,
		user_id: &str,
		template: &str,
		context: &serde_json::Value,
	) -> Result<(), NotifyError> {
		tracing::info!(
			user_id = %user_id,
			template = %template,
			context = %context,
			"Notification dispatched to log sink"
		);
		Ok(())
	}
}

/// Configuration schema for LogNotifier.
pub struct LogNotifierSchema;

impl ConfigSchema for LogNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// The log sink has no required configuration
		Schema::new(vec![]).validate(config)
	}
}

/// Factory function to create a log notifier from configuration.
pub fn create_notifier(_config: &toml::Value) -> Result<Box<dyn NotifyInterface>, NotifyError> {
	Ok(Box::new(LogNotifier))
}

/// Registry entry for the log sink.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = NotifyFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifyRegistry for Registry {}
