//! Webhook notification gateway.
//!
//! Posts each notification as JSON to a configured HTTP endpoint (a mail
//! provider bridge or an in-app push gateway). The gateway owns template
//! rendering and address resolution; this implementation only carries the
//! user id, the template name and the context.

use crate::{NotifyError, NotifyFactory, NotifyInterface, NotifyRegistry};
use async_trait::async_trait;
use laundry_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use serde::Serialize;
use std::time::Duration;

/// Request body posted to the gateway.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
	user_id: &'a str,
	template: &'a str,
	context: &'a serde_json::Value,
}

/// Notifier that delivers through an HTTP gateway.
pub struct WebhookNotifier {
	client: reqwest::Client,
	endpoint: String,
	auth_token: Option<String>,
}

impl WebhookNotifier {
	/// Creates a new webhook notifier.
	pub fn new(
		endpoint: String,
		auth_token: Option<String>,
		request_timeout: Duration,
	) -> Result<Self, NotifyError> {
		let client = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(|e| NotifyError::Configuration(e.to_string()))?;
		Ok(Self {
			client,
			endpoint,
			auth_token,
		})
	}
}

#[async_trait]
impl NotifyInterface for WebhookNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookNotifierSchema)
	}

	async fn send(
		&self,
		user_id: &str,
		template: &str,
		context: &serde_json::Value,
	) -> Result<(), NotifyError> {
		let payload = WebhookPayload {
			user_id,
			template,
			context,
		};

		let mut request = self.client.post(&self.endpoint).json(&payload);
		if let Some(token) = &self.auth_token {
			request = request.bearer_auth(token);
		}

		let response = request
			.send()
			.await
			.map_err(|e| NotifyError::Network(e.to_string()))?;

		if !response.status().is_success() {
			return Err(NotifyError::Rejected(format!(
				"gateway returned {}",
				response.status()
			)));
		}

		Ok(())
	}
}

/// Configuration schema for WebhookNotifier.
pub struct WebhookNotifierSchema;

impl ConfigSchema for WebhookNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![
			Field::required("endpoint", FieldType::String),
			Field::optional("auth_token", FieldType::String),
			Field::optional(
				"request_timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			),
		])
		.validate(config)
	}
}

/// Factory function to create a webhook notifier from configuration.
///
/// Configuration parameters:
/// - `endpoint`: gateway URL (required)
/// - `auth_token`: bearer token (optional)
/// - `request_timeout_seconds`: per-request timeout, default 5 (optional)
pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifyInterface>, NotifyError> {
	let endpoint = config
		.get("endpoint")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NotifyError::Configuration("'endpoint' is required".into()))?
		.to_string();
	let auth_token = config
		.get("auth_token")
		.and_then(|v| v.as_str())
		.map(|s| s.to_string());
	let timeout = config
		.get("request_timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(5) as u64;

	Ok(Box::new(WebhookNotifier::new(
		endpoint,
		auth_token,
		Duration::from_secs(timeout),
	)?))
}

/// Registry entry for the webhook gateway.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = NotifyFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifyRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_requires_endpoint() {
		let schema = WebhookNotifierSchema;
		let missing: toml::Value = toml::from_str("auth_token = \"t\"").unwrap();
		assert!(schema.validate(&missing).is_err());

		let valid: toml::Value =
			toml::from_str("endpoint = \"http://mail.internal/send\"").unwrap();
		assert!(schema.validate(&valid).is_ok());
	}

	#[test]
	fn factory_requires_endpoint() {
		let empty: toml::Value = toml::from_str("").unwrap();
		assert!(matches!(
			create_notifier(&empty),
			Err(NotifyError::Configuration(_))
		));
	}
}
