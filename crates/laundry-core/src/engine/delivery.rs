//! Delivery choice resolution.
//!
//! Operates only on orders awaiting the customer's delivery choice. The
//! resolver is pure: it turns (order, choice) into a commit plan (field
//! patch, optional delivery-fee payment, notification) which the engine
//! then applies through the same atomic commit path as every other
//! transition.

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use laundry_pricing::PricingService;
use laundry_storage::StoreError;
use laundry_types::{
	current_timestamp, truncate_id, DeliveryMethod, NotificationKind, Order, OrderPatch,
	OrderStatus, Payment, PaymentMethod, PaymentStatus, Principal, TransitionGuard,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

/// Commit plan produced by resolving a delivery choice.
pub(crate) struct DeliveryResolution {
	pub target: OrderStatus,
	pub patch: OrderPatch,
	pub payment: Option<Payment>,
	pub kind: NotificationKind,
	pub payload: serde_json::Value,
}

/// Resolves a delivery choice into its commit plan.
///
/// Callers have already verified the order awaits the choice. SELF_PICKUP
/// leaves the price untouched; DELIVERY adds the fixed fee on top of the
/// current total (additive, never recomputed) and opens a new PENDING
/// payment over exactly that fee.
pub(crate) fn resolve(
	order: &Order,
	method: DeliveryMethod,
	pricing: &PricingService,
	payment_method: PaymentMethod,
) -> Result<DeliveryResolution, LifecycleError> {
	match method {
		DeliveryMethod::SelfPickup => Ok(DeliveryResolution {
			target: OrderStatus::MenungguAmbilSendiri,
			patch: OrderPatch {
				status: Some(OrderStatus::MenungguAmbilSendiri),
				delivery_required: Some(Some(false)),
				..Default::default()
			},
			payment: None,
			kind: NotificationKind::SelfPickupChosen,
			payload: json!({}),
		}),
		DeliveryMethod::Delivery => {
			let fee = pricing.delivery_fee();
			let price_total = order.price_total.checked_add(fee).ok_or_else(|| {
				LifecycleError::ValidationFailed("delivery fee overflows order total".into())
			})?;

			Ok(DeliveryResolution {
				target: OrderStatus::MenungguPembayaranDelivery,
				patch: OrderPatch {
					status: Some(OrderStatus::MenungguPembayaranDelivery),
					delivery_required: Some(Some(true)),
					price_total: Some(price_total),
					..Default::default()
				},
				payment: Some(Payment {
					id: Uuid::new_v4().to_string(),
					order_id: order.id.clone(),
					method: payment_method,
					amount: fee,
					status: PaymentStatus::Pending,
					paid_at: None,
					created_at: current_timestamp(),
				}),
				kind: NotificationKind::DeliveryFeeDue,
				payload: json!({ "deliveryFee": fee, "priceTotal": price_total }),
			})
		}
	}
}

impl LifecycleEngine {
	/// Applies the customer's delivery choice.
	///
	/// Owner-only; valid only while the order awaits the choice. DIKIRIM
	/// stays unreachable until the delivery-fee payment exists.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), method = %method))]
	pub async fn choose_delivery_method(
		&self,
		principal: &Principal,
		order_id: &str,
		method: DeliveryMethod,
	) -> Result<Order, LifecycleError> {
		let order = self.load_order(order_id).await?;
		Self::require_owner(&order, principal)?;

		let target = match method {
			DeliveryMethod::SelfPickup => OrderStatus::MenungguAmbilSendiri,
			DeliveryMethod::Delivery => OrderStatus::MenungguPembayaranDelivery,
		};
		if order.status != OrderStatus::MenungguKonfirmasiDelivery {
			return Err(LifecycleError::InvalidTransition {
				from: order.status,
				to: target,
			});
		}

		let resolution = resolve(
			&order,
			method,
			&self.pricing,
			self.config.pricing.default_payment_method,
		)?;

		let notification = self.notification(&order, resolution.kind, resolution.payload.clone());
		let updated = self
			.store
			.commit_transition(
				order_id,
				TransitionGuard::status(OrderStatus::MenungguKonfirmasiDelivery),
				resolution.patch,
				Some(notification),
				resolution.payment,
			)
			.await
			.map_err(|e| match e {
				StoreError::StaleOrder { actual } => LifecycleError::InvalidTransition {
					from: actual,
					to: resolution.target,
				},
				other => LifecycleError::from_store(other, "order", order_id),
			})?;

		tracing::info!(
			order_id = %truncate_id(order_id),
			status = %updated.status,
			"Delivery choice resolved"
		);
		self.dispatch_email(&updated, resolution.kind, resolution.payload);
		self.publish_status_event(&updated, None).await;

		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use crate::engine::testkit::*;
	use crate::engine::LifecycleEngine;
	use laundry_types::{DeliveryMethod, OrderStatus, PaymentStatus, Principal};

	async fn awaiting_choice(engine: &LifecycleEngine) -> String {
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();
		engine
			.update_status(&admin(), &id, OrderStatus::Dicuci, None, None)
			.await
			.unwrap();
		engine.confirm_delivery(&admin(), &id).await.unwrap();
		id
	}

	#[tokio::test]
	async fn self_pickup_changes_nothing_but_the_state() {
		let engine = engine().await;
		let id = awaiting_choice(&engine).await;

		let updated = engine
			.choose_delivery_method(&owner(), &id, DeliveryMethod::SelfPickup)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::MenungguAmbilSendiri);
		assert_eq!(updated.delivery_required, Some(false));
		assert_eq!(updated.price_total, 16000);

		let payments = engine.store().payments_for_order(&id).await.unwrap();
		assert_eq!(payments.len(), 1);
		assert_price_invariant(&engine, &id).await;
	}

	#[tokio::test]
	async fn delivery_adds_the_fee_and_one_pending_payment() {
		let engine = engine().await;
		let id = awaiting_choice(&engine).await;

		let updated = engine
			.choose_delivery_method(&owner(), &id, DeliveryMethod::Delivery)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::MenungguPembayaranDelivery);
		assert_eq!(updated.delivery_required, Some(true));
		assert_eq!(updated.price_total, 26000);

		let payments = engine.store().payments_for_order(&id).await.unwrap();
		assert_eq!(payments.len(), 2);
		let fee_payment = &payments[1];
		assert_eq!(fee_payment.amount, 10000);
		assert_eq!(fee_payment.status, PaymentStatus::Pending);
		assert_price_invariant(&engine, &id).await;

		// DIKIRIM is now reachable through the generic table.
		engine
			.update_status(&admin(), &id, OrderStatus::Dikirim, None, None)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn choice_outside_the_waiting_state_is_rejected() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();

		let err = engine
			.choose_delivery_method(&owner(), &bundle.order.id, DeliveryMethod::Delivery)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "INVALID_TRANSITION");

		let untouched = engine.store().get_order(&bundle.order.id).await.unwrap();
		assert_eq!(untouched.status, OrderStatus::Dipesan);
		assert_eq!(untouched.price_total, 16000);
	}

	#[tokio::test]
	async fn only_the_owner_chooses() {
		let engine = engine().await;
		let id = awaiting_choice(&engine).await;

		let stranger = Principal::customer("cust-2");
		let err = engine
			.choose_delivery_method(&stranger, &id, DeliveryMethod::SelfPickup)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "UNAUTHORIZED");

		// Admins are not owners either.
		let err = engine
			.choose_delivery_method(&admin(), &id, DeliveryMethod::SelfPickup)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "UNAUTHORIZED");
	}
}
