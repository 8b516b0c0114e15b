//! Payment confirmation.
//!
//! Payment confirmation and status progression are independent axes: a
//! confirmed payment never moves the order by itself. Whoever matches
//! money to orders (a human, an automated matcher) observes PAID plus the
//! current state and invokes the next transition separately.

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use laundry_storage::StoreError;
use laundry_types::{current_timestamp, truncate_id, Payment, PaymentMethod, Principal};
use tracing::instrument;

impl LifecycleEngine {
	/// Confirms a payment against the order's current total.
	///
	/// The amount must equal `price_total` exactly. On match, the most
	/// recently created PENDING payment flips to PAID with the method the
	/// customer actually used.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), method = %method))]
	pub async fn confirm_payment(
		&self,
		principal: &Principal,
		order_id: &str,
		method: PaymentMethod,
		amount: u64,
	) -> Result<Payment, LifecycleError> {
		let bundle = self
			.store
			.get_order_bundle(order_id)
			.await
			.map_err(|e| LifecycleError::from_store(e, "order", order_id))?;
		Self::require_owner(&bundle.order, principal)?;

		if amount != bundle.order.price_total {
			return Err(LifecycleError::PreconditionFailed(format!(
				"amount {} does not match order total {}",
				amount, bundle.order.price_total
			)));
		}

		let pending = bundle
			.payments
			.iter()
			.rev()
			.find(|p| p.is_pending())
			.ok_or_else(|| {
				LifecycleError::PreconditionFailed("order has no pending payment".into())
			})?;

		let paid = self
			.store
			.mark_payment_paid(order_id, &pending.id, method, current_timestamp())
			.await
			.map_err(|e| match e {
				StoreError::PaymentNotPending => LifecycleError::PreconditionFailed(
					"payment was confirmed concurrently".into(),
				),
				other => LifecycleError::from_store(other, "payment", &pending.id),
			})?;

		tracing::info!(
			order_id = %truncate_id(order_id),
			payment_id = %truncate_id(&paid.id),
			amount,
			"Payment confirmed"
		);

		Ok(paid)
	}
}

#[cfg(test)]
mod tests {
	use crate::engine::testkit::*;
	use laundry_types::{DeliveryMethod, OrderStatus, PaymentMethod, PaymentStatus, Principal};

	#[tokio::test]
	async fn exact_amount_flips_the_pending_payment() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();

		let paid = engine
			.confirm_payment(&owner(), &id, PaymentMethod::Qris, 16000)
			.await
			.unwrap();
		assert_eq!(paid.status, PaymentStatus::Paid);
		assert!(paid.paid_at.is_some());

		// No status change rides along.
		let order = engine.store().get_order(&id).await.unwrap();
		assert_eq!(order.status, OrderStatus::Dipesan);
	}

	#[tokio::test]
	async fn amount_mismatch_leaves_all_payments_untouched() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();

		let err = engine
			.confirm_payment(&owner(), &id, PaymentMethod::Qris, 15000)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "PRECONDITION_FAILED");
		assert!(err.to_string().contains("16000"));

		let payments = engine.store().payments_for_order(&id).await.unwrap();
		assert!(payments.iter().all(|p| p.status == PaymentStatus::Pending));
	}

	#[tokio::test]
	async fn latest_pending_payment_is_the_relevant_one() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();

		engine
			.update_status(&admin(), &id, OrderStatus::Dicuci, None, None)
			.await
			.unwrap();
		engine.confirm_delivery(&admin(), &id).await.unwrap();
		engine
			.choose_delivery_method(&owner(), &id, DeliveryMethod::Delivery)
			.await
			.unwrap();

		// Total rose to 26000; the delivery-fee payment is the newest.
		let paid = engine
			.confirm_payment(&owner(), &id, PaymentMethod::Transfer, 26000)
			.await
			.unwrap();
		assert_eq!(paid.amount, 10000);
		assert_eq!(paid.method, PaymentMethod::Transfer);

		let payments = engine.store().payments_for_order(&id).await.unwrap();
		assert_eq!(payments[0].status, PaymentStatus::Pending);
		assert_eq!(payments[1].status, PaymentStatus::Paid);
	}

	#[tokio::test]
	async fn only_the_owner_confirms() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();

		let stranger = Principal::customer("cust-2");
		let err = engine
			.confirm_payment(&stranger, &bundle.order.id, PaymentMethod::Qris, 16000)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "UNAUTHORIZED");
	}
}
