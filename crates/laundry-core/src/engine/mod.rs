//! Lifecycle engine that orchestrates order state and side effects.
//!
//! This module contains the main LifecycleEngine struct which validates
//! and commits order transitions against the order store and triggers the
//! accompanying side effects: the transactional in-app notification row,
//! the best-effort email dispatch, and the real-time event on the order's
//! topic. Operations are request-scoped; the engine keeps no state of its
//! own beyond handles to its services.

pub mod create;
pub mod delivery;
pub mod event_bus;
pub mod payment;
pub mod status;

use crate::error::LifecycleError;
use event_bus::EventBus;
use laundry_config::Config;
use laundry_notify::NotifyService;
use laundry_pricing::PricingService;
use laundry_storage::StoreService;
use laundry_types::{
	current_timestamp, truncate_id, Channel, Notification, Order, OrderBundle, OrderEvent,
	NotificationKind, Principal,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Main engine driving the order lifecycle.
#[derive(Clone)]
pub struct LifecycleEngine {
	/// Deployment configuration.
	pub(crate) config: Config,
	/// Order store with bounded operation timeouts.
	pub(crate) store: Arc<StoreService>,
	/// Notification dispatcher, best-effort from the engine's view.
	pub(crate) notify: Arc<NotifyService>,
	/// Fee schedule arithmetic.
	pub(crate) pricing: Arc<PricingService>,
	/// Per-order real-time event bus.
	pub(crate) event_bus: EventBus,
}

impl std::fmt::Debug for LifecycleEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LifecycleEngine").finish_non_exhaustive()
	}
}

impl LifecycleEngine {
	/// Creates a new engine over the given services.
	pub fn new(
		config: Config,
		store: Arc<StoreService>,
		notify: Arc<NotifyService>,
		pricing: Arc<PricingService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			config,
			store,
			notify,
			pricing,
			event_bus,
		}
	}

	/// Returns a reference to the event bus.
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Returns a reference to the order store.
	pub fn store(&self) -> &Arc<StoreService> {
		&self.store
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Retrieves an order with its items and payments in one batched read.
	///
	/// Customers only see their own orders; other customers' orders read
	/// as absent rather than as forbidden.
	pub async fn get_order(
		&self,
		principal: &Principal,
		order_id: &str,
	) -> Result<OrderBundle, LifecycleError> {
		let bundle = self
			.store
			.get_order_bundle(order_id)
			.await
			.map_err(|e| LifecycleError::from_store(e, "order", order_id))?;

		if !principal.is_admin() && !bundle.order.is_owned_by(&principal.id) {
			return Err(LifecycleError::NotFound {
				entity: "order",
				id: order_id.to_string(),
			});
		}

		Ok(bundle)
	}

	/// Lists the caller's notifications, newest first.
	pub async fn list_notifications(
		&self,
		principal: &Principal,
	) -> Result<Vec<Notification>, LifecycleError> {
		self.store
			.notifications_for_user(&principal.id)
			.await
			.map_err(|e| LifecycleError::Dependency(e.to_string()))
	}

	/// Marks one of the caller's notifications as read.
	///
	/// The only mutation a notification ever receives.
	pub async fn mark_notification_read(
		&self,
		principal: &Principal,
		notification_id: &str,
	) -> Result<Notification, LifecycleError> {
		self.store
			.mark_notification_read(notification_id, &principal.id)
			.await
			.map_err(|e| LifecycleError::from_store(e, "notification", notification_id))
	}

	pub(crate) fn require_admin(
		&self,
		principal: &Principal,
		operation: &str,
	) -> Result<(), LifecycleError> {
		if principal.is_admin() {
			Ok(())
		} else {
			Err(LifecycleError::Unauthorized(format!(
				"{} requires the ADMIN role",
				operation
			)))
		}
	}

	pub(crate) fn require_owner(
		order: &Order,
		principal: &Principal,
	) -> Result<(), LifecycleError> {
		if order.is_owned_by(&principal.id) {
			Ok(())
		} else {
			Err(LifecycleError::Unauthorized(
				"caller does not own this order".into(),
			))
		}
	}

	pub(crate) async fn load_order(&self, order_id: &str) -> Result<Order, LifecycleError> {
		self.store
			.get_order(order_id)
			.await
			.map_err(|e| LifecycleError::from_store(e, "order", order_id))
	}

	/// Builds the in-app notification row committed with a transition.
	pub(crate) fn notification(
		&self,
		order: &Order,
		kind: NotificationKind,
		payload: serde_json::Value,
	) -> Notification {
		Notification {
			id: Uuid::new_v4().to_string(),
			order_id: order.id.clone(),
			user_id: order.customer_id.clone(),
			kind,
			payload,
			channel: Channel::InApp,
			sent_at: None,
			created_at: current_timestamp(),
		}
	}

	/// Best-effort email dispatch, after commit, never awaited by callers.
	///
	/// A failed or timed-out send is logged and swallowed.
	pub(crate) fn dispatch_email(
		&self,
		order: &Order,
		kind: NotificationKind,
		mut context: serde_json::Value,
	) {
		context["orderId"] = json!(order.id);
		if let Some(email) = &order.notification_email {
			context["email"] = json!(email);
		}

		let notify = Arc::clone(&self.notify);
		let user_id = order.customer_id.clone();
		let order_id = order.id.clone();
		tokio::spawn(async move {
			if let Err(e) = notify
				.send(Channel::Email, &user_id, kind.template(), &context)
				.await
			{
				tracing::warn!(
					order_id = %truncate_id(&order_id),
					error = %e,
					"Email dispatch failed"
				);
			}
		});
	}

	/// Publishes order.status.updated on the order's topic, after commit.
	pub(crate) async fn publish_status_event(&self, order: &Order, notes: Option<String>) {
		let received = self
			.event_bus
			.publish(OrderEvent::StatusUpdated {
				order_id: order.id.clone(),
				status: order.status,
				notes,
				timestamp: current_timestamp(),
			})
			.await;
		tracing::debug!(
			order_id = %truncate_id(&order.id),
			subscribers = received,
			"Published order.status.updated"
		);
	}
}


#[cfg(test)]
mod tests {
	use super::testkit::*;
	use super::*;
	use async_trait::async_trait;
	use laundry_notify::{NotifyError, NotifyInterface};
	use laundry_types::{ConfigSchema, DeliveryMethod, OrderStatus};

	#[tokio::test]
	async fn self_drop_order_walks_to_completion() {
		let engine = engine().await;
		let admin = admin();
		let owner = owner();

		let bundle = engine.create_order(&owner, self_order()).await.unwrap();
		let id = bundle.order.id.clone();
		assert_eq!(bundle.order.status, OrderStatus::Dipesan);
		assert_price_invariant(&engine, &id).await;

		engine
			.update_status(&admin, &id, OrderStatus::Dicuci, None, None)
			.await
			.unwrap();
		assert_price_invariant(&engine, &id).await;

		engine.confirm_delivery(&admin, &id).await.unwrap();
		assert_price_invariant(&engine, &id).await;

		engine
			.choose_delivery_method(&owner, &id, DeliveryMethod::SelfPickup)
			.await
			.unwrap();
		assert_price_invariant(&engine, &id).await;

		let done = engine
			.update_status(&admin, &id, OrderStatus::Selesai, None, None)
			.await
			.unwrap();
		assert_eq!(done.status, OrderStatus::Selesai);
		assert_price_invariant(&engine, &id).await;
	}

	mockall::mock! {
		pub EmailGateway {}

		#[async_trait]
		impl NotifyInterface for EmailGateway {
			fn config_schema(&self) -> Box<dyn ConfigSchema>;

			async fn send(
				&self,
				user_id: &str,
				template: &str,
				context: &serde_json::Value,
			) -> Result<(), NotifyError>;
		}
	}

	#[tokio::test]
	async fn failing_email_gateway_never_fails_a_transition() {
		let mut gateway = MockEmailGateway::new();
		gateway
			.expect_send()
			.returning(|_, _, _| Err(NotifyError::Network("gateway down".into())));

		let engine = engine_with_email(Box::new(gateway)).await;
		let bundle = engine
			.create_order(&owner(), self_order())
			.await
			.unwrap();

		let updated = engine
			.update_status(&admin(), &bundle.order.id, OrderStatus::Dicuci, None, None)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Dicuci);

		// The transactional in-app row exists even though email is down.
		let notifications = engine.list_notifications(&owner()).await.unwrap();
		assert!(notifications
			.iter()
			.any(|n| n.kind == NotificationKind::StatusUpdated));
	}

	#[tokio::test]
	async fn customers_cannot_see_each_others_orders() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();

		let stranger = Principal::customer("cust-2");
		let err = engine
			.get_order(&stranger, &bundle.order.id)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "NOT_FOUND");

		// The admin and the owner both can.
		assert!(engine.get_order(&admin(), &bundle.order.id).await.is_ok());
		assert!(engine.get_order(&owner(), &bundle.order.id).await.is_ok());
	}

	#[tokio::test]
	async fn mark_read_is_scoped_to_the_addressee() {
		let engine = engine().await;
		engine.create_order(&owner(), self_order()).await.unwrap();

		let notifications = engine.list_notifications(&owner()).await.unwrap();
		assert!(!notifications.is_empty());
		let target = &notifications[0];
		assert!(target.sent_at.is_none());

		let stranger = Principal::customer("cust-2");
		let err = engine
			.mark_notification_read(&stranger, &target.id)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "NOT_FOUND");

		let read = engine
			.mark_notification_read(&owner(), &target.id)
			.await
			.unwrap();
		assert!(read.sent_at.is_some());
	}
}
