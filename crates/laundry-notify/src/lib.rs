//! Notification dispatch module for the laundry order system.
//!
//! This module handles delivery of notifications to customers through
//! pluggable channel implementations (an email gateway, an in-app sink).
//! Dispatch is best-effort from the lifecycle engine's point of view: a
//! failed or timed-out send is logged by the caller and never rolls back
//! the state transition that produced it.

use async_trait::async_trait;
use laundry_types::{Channel, ConfigSchema, ImplementationRegistry};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod log;
	pub mod webhook;
}

/// Errors that can occur during notification dispatch.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The gateway answered but refused the message.
	#[error("Dispatch rejected: {0}")]
	Rejected(String),
	/// No implementation is configured for the requested channel.
	#[error("No dispatcher for channel {0}")]
	NoChannel(Channel),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// The dispatch did not complete within the bounded timeout.
	#[error("Dispatch timed out")]
	Timeout,
}

/// Trait defining the interface for notification dispatchers.
///
/// Implementations deliver a named template with a JSON context to a user.
/// Resolving the user id to a concrete address (and rendering the
/// template) is the gateway's concern; an email override, when present, is
/// part of the context.
#[async_trait]
pub trait NotifyInterface: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Delivers one notification.
	async fn send(
		&self,
		user_id: &str,
		template: &str,
		context: &serde_json::Value,
	) -> Result<(), NotifyError>;
}

/// Type alias for notifier factory functions.
pub type NotifyFactory = fn(&toml::Value) -> Result<Box<dyn NotifyInterface>, NotifyError>;

/// Registry trait for notifier implementations.
pub trait NotifyRegistry: ImplementationRegistry<Factory = NotifyFactory> {}

/// Get all registered notifier implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NotifyFactory)> {
	use implementations::{log, webhook};

	vec![
		(log::Registry::NAME, log::Registry::factory()),
		(webhook::Registry::NAME, webhook::Registry::factory()),
	]
}

/// Service that routes notifications to per-channel dispatchers.
///
/// Holds one dispatcher per configured channel and bounds every send with
/// a timeout. Callers that treat dispatch as best-effort log the error and
/// move on; nothing here retries.
pub struct NotifyService {
	/// Map of channels to their dispatcher implementations.
	channels: HashMap<Channel, Box<dyn NotifyInterface>>,
	/// Upper bound for any single dispatch.
	send_timeout: Duration,
}

impl NotifyService {
	/// Creates a new NotifyService with the specified dispatchers.
	pub fn new(channels: HashMap<Channel, Box<dyn NotifyInterface>>, send_timeout: Duration) -> Self {
		Self {
			channels,
			send_timeout,
		}
	}

	/// Dispatches a notification on the given channel.
	pub async fn send(
		&self,
		channel: Channel,
		user_id: &str,
		template: &str,
		context: &serde_json::Value,
	) -> Result<(), NotifyError> {
		let dispatcher = self
			.channels
			.get(&channel)
			.ok_or(NotifyError::NoChannel(channel))?;

		match tokio::time::timeout(self.send_timeout, dispatcher.send(user_id, template, context))
			.await
		{
			Ok(result) => result,
			Err(_) => Err(NotifyError::Timeout),
		}
	}

	/// Returns true when a dispatcher exists for the channel.
	pub fn supports(&self, channel: Channel) -> bool {
		self.channels.contains_key(&channel)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[tokio::test]
	async fn missing_channel_is_reported() {
		let service = NotifyService::new(HashMap::new(), Duration::from_secs(1));
		let result = service
			.send(Channel::Email, "c-1", "order_created", &json!({}))
			.await;
		assert!(matches!(result, Err(NotifyError::NoChannel(Channel::Email))));
		assert!(!service.supports(Channel::Email));
	}

	#[tokio::test(start_paused = true)]
	async fn slow_dispatcher_times_out() {
		struct Stalled;

		#[async_trait]
		impl NotifyInterface for Stalled {
			fn config_schema(&self) -> Box<dyn ConfigSchema> {
				Box::new(implementations::log::LogNotifierSchema)
			}

			async fn send(
				&self,
				_user_id: &str,
				_template: &str,
				_context: &serde_json::Value,
			) -> Result<(), NotifyError> {
				std::future::pending().await
			}
		}

		let mut channels: HashMap<Channel, Box<dyn NotifyInterface>> = HashMap::new();
		channels.insert(Channel::Email, Box::new(Stalled));
		let service = NotifyService::new(channels, Duration::from_secs(1));

		let result = service
			.send(Channel::Email, "c-1", "order_created", &json!({}))
			.await;
		assert!(matches!(result, Err(NotifyError::Timeout)));
	}
}
