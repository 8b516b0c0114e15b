//! Configuration module for the laundry order system.
//!
//! Provides structures and utilities for managing deployment configuration.
//! Configuration is loaded from TOML files, supports `${VAR}` and
//! `${VAR:-default}` environment-variable references, and is validated
//! before use so that a misconfigured deployment fails at startup.

use laundry_types::PaymentMethod;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the laundry order system.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this deployment.
	pub laundry: LaundryConfig,
	/// Configuration for the order store backend.
	pub storage: StorageConfig,
	/// Configuration for the notification dispatcher.
	pub notify: NotifyConfig,
	/// Fee schedule and payment defaults.
	#[serde(default)]
	pub pricing: PricingConfig,
	/// Real-time event bus tuning.
	#[serde(default)]
	pub events: EventsConfig,
}

/// Configuration specific to this deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LaundryConfig {
	/// Unique identifier for this deployment instance.
	pub id: String,
	/// Bound timeout for order store operations, in seconds.
	/// A store timeout fails the operation.
	#[serde(default = "default_operation_timeout_seconds")]
	pub operation_timeout_seconds: u64,
	/// Bound timeout for notification dispatch, in seconds.
	/// A dispatch timeout is logged and never fails the transition.
	#[serde(default = "default_notify_timeout_seconds")]
	pub notify_timeout_seconds: u64,
}

fn default_operation_timeout_seconds() -> u64 {
	10
}

fn default_notify_timeout_seconds() -> u64 {
	5
}

/// Configuration for the order store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of store implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the notification dispatcher.
///
/// `channels` maps a channel name ("email", "in_app") to the name of the
/// implementation that serves it; `implementations` holds the per-
/// implementation configuration blocks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
	/// Map of channel name to implementation name.
	pub channels: HashMap<String, String>,
	/// Map of notifier implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Fee schedule and payment defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
	/// Surcharge applied when a courier collects the laundry. Rupiah.
	#[serde(default = "default_pickup_fee")]
	pub pickup_fee: u64,
	/// Surcharge applied when courier return is chosen. Rupiah.
	#[serde(default = "default_delivery_fee")]
	pub delivery_fee: u64,
	/// Payment method recorded on the initial order payment.
	#[serde(default = "default_payment_method")]
	pub default_payment_method: PaymentMethod,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			pickup_fee: default_pickup_fee(),
			delivery_fee: default_delivery_fee(),
			default_payment_method: default_payment_method(),
		}
	}
}

fn default_pickup_fee() -> u64 {
	5000
}

fn default_delivery_fee() -> u64 {
	10000
}

fn default_payment_method() -> PaymentMethod {
	PaymentMethod::Qris
}

/// Real-time event bus tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
	/// Buffered events per order topic before slow subscribers lag.
	#[serde(default = "default_channel_capacity")]
	pub channel_capacity: usize,
}

impl Default for EventsConfig {
	fn default() -> Self {
		Self {
			channel_capacity: default_channel_capacity(),
		}
	}
}

fn default_channel_capacity() -> usize {
	64
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		raw.parse()
	}

	/// Validates the configuration to ensure all required fields are set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.laundry.id.is_empty() {
			return Err(ConfigError::Validation(
				"Deployment ID cannot be empty".into(),
			));
		}
		if self.laundry.operation_timeout_seconds == 0
			|| self.laundry.operation_timeout_seconds > 300
		{
			return Err(ConfigError::Validation(
				"operation_timeout_seconds must be between 1 and 300".into(),
			));
		}
		if self.laundry.notify_timeout_seconds == 0 || self.laundry.notify_timeout_seconds > 300 {
			return Err(ConfigError::Validation(
				"notify_timeout_seconds must be between 1 and 300".into(),
			));
		}

		// Validate storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Validate notify config
		if self.notify.channels.is_empty() {
			return Err(ConfigError::Validation(
				"At least one notification channel must be configured".into(),
			));
		}
		for (channel, implementation) in &self.notify.channels {
			if channel.parse::<laundry_types::Channel>().is_err() {
				return Err(ConfigError::Validation(format!(
					"Unknown notification channel '{}'",
					channel
				)));
			}
			if !self.notify.implementations.contains_key(implementation) {
				return Err(ConfigError::Validation(format!(
					"Notification channel '{}' references implementation '{}' which is not configured",
					channel, implementation
				)));
			}
		}

		// Validate pricing config
		if self.pricing.pickup_fee == 0 {
			return Err(ConfigError::Validation(
				"pricing.pickup_fee must be greater than 0".into(),
			));
		}
		if self.pricing.delivery_fee == 0 {
			return Err(ConfigError::Validation(
				"pricing.delivery_fee must be greater than 0".into(),
			));
		}

		if self.events.channel_capacity == 0 {
			return Err(ConfigError::Validation(
				"events.channel_capacity must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
