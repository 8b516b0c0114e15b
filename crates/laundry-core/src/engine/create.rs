//! Order creation.
//!
//! Validates the requested items against the catalog, prices the order,
//! and inserts order + items + initial payment as one atomic store write.
//! The confirmation notification and email follow after commit.

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use laundry_storage::StoreError;
use laundry_types::{
	current_timestamp, truncate_id, NewOrder, NotificationKind, Order, OrderBundle, OrderItem,
	OrderStatus, Payment, PaymentStatus, PickupMethod, Principal,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

impl LifecycleEngine {
	/// Creates a new order for the calling customer.
	///
	/// SELF orders need no approval step and start approved; PICKUP orders
	/// start unapproved and carry the pickup surcharge, computed here once
	/// and never recomputed.
	#[instrument(skip_all, fields(customer_id = %principal.id))]
	pub async fn create_order(
		&self,
		principal: &Principal,
		request: NewOrder,
	) -> Result<OrderBundle, LifecycleError> {
		if request.items.is_empty() {
			return Err(LifecycleError::ValidationFailed(
				"order must contain at least one item".into(),
			));
		}

		let order_id = Uuid::new_v4().to_string();
		let mut items = Vec::with_capacity(request.items.len());
		for item in &request.items {
			if item.qty == 0 {
				return Err(LifecycleError::ValidationFailed(format!(
					"qty for service {} must be at least 1",
					item.service_id
				)));
			}

			let service = self
				.store
				.get_service(&item.service_id)
				.await
				.map_err(|e| LifecycleError::from_store(e, "service", &item.service_id))?;
			let subtotal = self
				.pricing
				.line_subtotal(item.qty, service.base_price)
				.map_err(|e| LifecycleError::ValidationFailed(e.to_string()))?;

			items.push(OrderItem {
				id: Uuid::new_v4().to_string(),
				order_id: order_id.clone(),
				service_id: service.id,
				qty: item.qty,
				unit_price: service.base_price,
				subtotal,
			});
		}

		let pickup_fee = self.pricing.pickup_fee(request.pickup_method);
		let price_total = self
			.pricing
			.order_total(items.iter().map(|i| i.subtotal), pickup_fee)
			.map_err(|e| LifecycleError::ValidationFailed(e.to_string()))?;

		let now = current_timestamp();
		let order = Order {
			id: order_id.clone(),
			customer_id: principal.id.clone(),
			pickup_method: request.pickup_method,
			status: OrderStatus::Dipesan,
			price_total,
			pickup_fee,
			delivery_required: None,
			// Drop-off orders skip the courier approval gate entirely.
			admin_approved: request.pickup_method == PickupMethod::SelfDrop,
			notification_email: request.notification_email,
			estimated_arrival: None,
			created_at: now,
			updated_at: now,
		};
		let payment = Payment {
			id: Uuid::new_v4().to_string(),
			order_id: order_id.clone(),
			method: self.config.pricing.default_payment_method,
			amount: price_total,
			status: PaymentStatus::Pending,
			paid_at: None,
			created_at: now,
		};

		self.store
			.create_order(order.clone(), items.clone(), payment.clone())
			.await
			.map_err(|e| match e {
				StoreError::Duplicate(id) => {
					LifecycleError::Dependency(format!("duplicate order id {}", id))
				}
				other => LifecycleError::Dependency(other.to_string()),
			})?;

		tracing::info!(
			order_id = %truncate_id(&order.id),
			price_total,
			pickup_method = %order.pickup_method,
			"Order created"
		);

		// Confirmation notification and email are best-effort after commit.
		let notification = self.notification(
			&order,
			NotificationKind::OrderCreated,
			json!({ "priceTotal": price_total }),
		);
		if let Err(e) = self.store.insert_notification(notification).await {
			tracing::warn!(
				order_id = %truncate_id(&order.id),
				error = %e,
				"Failed to record creation notification"
			);
		}
		self.dispatch_email(
			&order,
			NotificationKind::OrderCreated,
			json!({ "priceTotal": price_total }),
		);

		Ok(OrderBundle {
			order,
			items,
			payments: vec![payment],
		})
	}
}
