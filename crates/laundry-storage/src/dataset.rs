//! In-process dataset shared by the store backends.
//!
//! Both the memory and the file backend guard one of these behind an async
//! `RwLock`; the file backend additionally snapshots it to disk after every
//! mutation. All methods run inside the backend's critical section, which
//! is what makes commit preconditions race-free.

use crate::StoreError;
use laundry_types::{
	current_timestamp, Notification, Order, OrderBundle, OrderItem, OrderPatch, Payment,
	PaymentMethod, PaymentStatus, ServiceItem, TransitionGuard,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The full persisted state of one deployment.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Dataset {
	/// Service catalog keyed by service id.
	pub services: HashMap<String, ServiceItem>,
	/// Orders keyed by order id.
	pub orders: HashMap<String, Order>,
	/// Order items keyed by order id.
	pub items: HashMap<String, Vec<OrderItem>>,
	/// Payments keyed by order id, oldest first.
	pub payments: HashMap<String, Vec<Payment>>,
	/// Notifications keyed by notification id.
	pub notifications: HashMap<String, Notification>,
}

impl Dataset {
	pub fn upsert_service(&mut self, service: ServiceItem) {
		self.services.insert(service.id.clone(), service);
	}

	pub fn get_service(&self, id: &str) -> Result<ServiceItem, StoreError> {
		self.services.get(id).cloned().ok_or(StoreError::NotFound)
	}

	pub fn create_order(
		&mut self,
		order: Order,
		items: Vec<OrderItem>,
		payment: Payment,
	) -> Result<(), StoreError> {
		if self.orders.contains_key(&order.id) {
			return Err(StoreError::Duplicate(order.id));
		}
		let order_id = order.id.clone();
		self.orders.insert(order_id.clone(), order);
		self.items.insert(order_id.clone(), items);
		self.payments.insert(order_id, vec![payment]);
		Ok(())
	}

	pub fn get_order(&self, id: &str) -> Result<Order, StoreError> {
		self.orders.get(id).cloned().ok_or(StoreError::NotFound)
	}

	pub fn get_order_bundle(&self, id: &str) -> Result<OrderBundle, StoreError> {
		let order = self.get_order(id)?;
		Ok(OrderBundle {
			items: self.items.get(id).cloned().unwrap_or_default(),
			payments: self.payments.get(id).cloned().unwrap_or_default(),
			order,
		})
	}

	pub fn commit_transition(
		&mut self,
		order_id: &str,
		guard: TransitionGuard,
		patch: OrderPatch,
		notification: Option<Notification>,
		payment: Option<Payment>,
	) -> Result<Order, StoreError> {
		let order = self.orders.get_mut(order_id).ok_or(StoreError::NotFound)?;

		// Precondition check and write happen against the same snapshot.
		if !guard.holds(order) {
			return Err(StoreError::StaleOrder {
				actual: order.status,
			});
		}

		patch.apply(order);
		order.updated_at = current_timestamp();
		let committed = order.clone();

		if let Some(notification) = notification {
			self.notifications
				.insert(notification.id.clone(), notification);
		}
		if let Some(payment) = payment {
			self.payments
				.entry(order_id.to_string())
				.or_default()
				.push(payment);
		}

		Ok(committed)
	}

	pub fn insert_notification(&mut self, notification: Notification) -> Result<(), StoreError> {
		if self.notifications.contains_key(&notification.id) {
			return Err(StoreError::Duplicate(notification.id));
		}
		self.notifications
			.insert(notification.id.clone(), notification);
		Ok(())
	}

	pub fn mark_notification_read(
		&mut self,
		id: &str,
		user_id: &str,
	) -> Result<Notification, StoreError> {
		let notification = self.notifications.get_mut(id).ok_or(StoreError::NotFound)?;
		if notification.user_id != user_id {
			return Err(StoreError::NotFound);
		}
		if notification.sent_at.is_none() {
			notification.sent_at = Some(current_timestamp());
		}
		Ok(notification.clone())
	}

	pub fn notifications_for_user(&self, user_id: &str) -> Vec<Notification> {
		let mut list: Vec<Notification> = self
			.notifications
			.values()
			.filter(|n| n.user_id == user_id)
			.cloned()
			.collect();
		list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		list
	}

	pub fn payments_for_order(&self, order_id: &str) -> Result<Vec<Payment>, StoreError> {
		if !self.orders.contains_key(order_id) {
			return Err(StoreError::NotFound);
		}
		Ok(self.payments.get(order_id).cloned().unwrap_or_default())
	}

	pub fn mark_payment_paid(
		&mut self,
		order_id: &str,
		payment_id: &str,
		method: PaymentMethod,
		paid_at: u64,
	) -> Result<Payment, StoreError> {
		let payments = self.payments.get_mut(order_id).ok_or(StoreError::NotFound)?;
		let payment = payments
			.iter_mut()
			.find(|p| p.id == payment_id)
			.ok_or(StoreError::NotFound)?;
		if payment.status != PaymentStatus::Pending {
			return Err(StoreError::PaymentNotPending);
		}
		payment.method = method;
		payment.status = PaymentStatus::Paid;
		payment.paid_at = Some(paid_at);
		Ok(payment.clone())
	}
}
