//! Admin-driven status operations: approval, generic transitions, and the
//! washing-done confirmation.
//!
//! Every transition here is a single atomic store commit of the status
//! change plus its in-app notification row; the email and the real-time
//! event follow after commit and are best-effort.

use crate::engine::LifecycleEngine;
use crate::error::LifecycleError;
use crate::state;
use laundry_storage::StoreError;
use laundry_types::{
	truncate_id, NotificationKind, Order, OrderPatch, OrderStatus, Principal, TransitionGuard,
};
use serde_json::json;
use tracing::instrument;

impl LifecycleEngine {
	/// Approves courier dispatch for a PICKUP order.
	///
	/// A distinct operation, not a status transition: valid only while the
	/// order is DIPESAN, unapproved, and uses courier pickup. The status
	/// is left untouched, so no order.status.updated event is published.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn approve_order(
		&self,
		principal: &Principal,
		order_id: &str,
	) -> Result<Order, LifecycleError> {
		self.require_admin(principal, "approve_order")?;
		let order = self.load_order(order_id).await?;

		if order.pickup_method != laundry_types::PickupMethod::Pickup {
			return Err(LifecycleError::PreconditionFailed(
				"approval only applies to PICKUP orders".into(),
			));
		}
		if order.admin_approved {
			return Err(LifecycleError::PreconditionFailed(
				"order is already approved".into(),
			));
		}
		if order.status != OrderStatus::Dipesan {
			return Err(LifecycleError::PreconditionFailed(format!(
				"approval is only valid while DIPESAN, order is {}",
				order.status
			)));
		}

		let guard = TransitionGuard {
			status: OrderStatus::Dipesan,
			admin_approved: Some(false),
		};
		let patch = OrderPatch {
			admin_approved: Some(true),
			..Default::default()
		};
		let notification = self.notification(&order, NotificationKind::OrderApproved, json!({}));

		let updated = self
			.store
			.commit_transition(order_id, guard, patch, Some(notification), None)
			.await
			.map_err(|e| match e {
				StoreError::StaleOrder { .. } => LifecycleError::PreconditionFailed(
					"order was approved or moved on concurrently".into(),
				),
				other => LifecycleError::from_store(other, "order", order_id),
			})?;

		tracing::info!(order_id = %truncate_id(order_id), "Order approved");
		self.dispatch_email(&updated, NotificationKind::OrderApproved, json!({}));

		Ok(updated)
	}

	/// Moves an order to a target status along the generic adjacency table.
	///
	/// `estimated_arrival` is persisted only when entering
	/// PESANAN_DIJEMPUT. The washing-done edge is not reachable here; see
	/// [`confirm_delivery`](Self::confirm_delivery).
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), target = %target))]
	pub async fn update_status(
		&self,
		principal: &Principal,
		order_id: &str,
		target: OrderStatus,
		notes: Option<String>,
		estimated_arrival: Option<u64>,
	) -> Result<Order, LifecycleError> {
		self.require_admin(principal, "update_status")?;
		let order = self.load_order(order_id).await?;

		if !state::is_valid_transition(&order.status, &target) {
			return Err(LifecycleError::InvalidTransition {
				from: order.status,
				to: target,
			});
		}
		state::check_guards(&order, target)?;

		let mut patch = OrderPatch {
			status: Some(target),
			..Default::default()
		};
		if target == OrderStatus::PesananDijemput {
			patch.estimated_arrival = estimated_arrival;
		}

		let notification = self.notification(
			&order,
			NotificationKind::StatusUpdated,
			json!({ "status": target, "notes": notes.clone() }),
		);

		let updated = self
			.store
			.commit_transition(
				order_id,
				TransitionGuard::status(order.status),
				patch,
				Some(notification),
				None,
			)
			.await
			.map_err(|e| match e {
				StoreError::StaleOrder { actual } => LifecycleError::InvalidTransition {
					from: actual,
					to: target,
				},
				other => LifecycleError::from_store(other, "order", order_id),
			})?;

		tracing::info!(
			order_id = %truncate_id(order_id),
			status = %updated.status,
			"Status updated"
		);
		self.dispatch_email(
			&updated,
			NotificationKind::StatusUpdated,
			json!({ "status": updated.status, "notes": notes.clone() }),
		);
		self.publish_status_event(&updated, notes).await;

		Ok(updated)
	}

	/// Marks washing as done, asking the customer for a delivery choice.
	///
	/// The only way into MENUNGGU_KONFIRMASI_DELIVERY; also resets the
	/// delivery choice to undecided.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn confirm_delivery(
		&self,
		principal: &Principal,
		order_id: &str,
	) -> Result<Order, LifecycleError> {
		self.require_admin(principal, "confirm_delivery")?;
		let order = self.load_order(order_id).await?;

		if order.status != OrderStatus::Dicuci {
			return Err(LifecycleError::InvalidTransition {
				from: order.status,
				to: OrderStatus::MenungguKonfirmasiDelivery,
			});
		}

		let patch = OrderPatch {
			status: Some(OrderStatus::MenungguKonfirmasiDelivery),
			delivery_required: Some(None),
			..Default::default()
		};
		let notification =
			self.notification(&order, NotificationKind::DeliveryChoiceRequested, json!({}));

		let updated = self
			.store
			.commit_transition(
				order_id,
				TransitionGuard::status(OrderStatus::Dicuci),
				patch,
				Some(notification),
				None,
			)
			.await
			.map_err(|e| match e {
				StoreError::StaleOrder { actual } => LifecycleError::InvalidTransition {
					from: actual,
					to: OrderStatus::MenungguKonfirmasiDelivery,
				},
				other => LifecycleError::from_store(other, "order", order_id),
			})?;

		tracing::info!(order_id = %truncate_id(order_id), "Awaiting delivery choice");
		self.dispatch_email(&updated, NotificationKind::DeliveryChoiceRequested, json!({}));
		self.publish_status_event(&updated, None).await;

		Ok(updated)
	}
}

#[cfg(test)]
mod tests {
	use crate::engine::testkit::*;
	use laundry_types::{NotificationKind, OrderEvent, OrderStatus};

	#[tokio::test]
	async fn courier_dispatch_is_gated_on_approval() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), pickup_order()).await.unwrap();
		let id = bundle.order.id.clone();

		let err = engine
			.update_status(&admin(), &id, OrderStatus::PesananDijemput, None, None)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "PRECONDITION_FAILED");

		engine.approve_order(&admin(), &id).await.unwrap();

		let updated = engine
			.update_status(
				&admin(),
				&id,
				OrderStatus::PesananDijemput,
				Some("on the way".into()),
				Some(1_900_000_000),
			)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::PesananDijemput);
		assert_eq!(updated.estimated_arrival, Some(1_900_000_000));
	}

	#[tokio::test]
	async fn approval_is_admin_only_and_not_repeatable() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), pickup_order()).await.unwrap();
		let id = bundle.order.id.clone();

		let err = engine.approve_order(&owner(), &id).await.unwrap_err();
		assert_eq!(err.code(), "UNAUTHORIZED");

		engine.approve_order(&admin(), &id).await.unwrap();
		let err = engine.approve_order(&admin(), &id).await.unwrap_err();
		assert_eq!(err.code(), "PRECONDITION_FAILED");
		assert!(err.to_string().contains("already approved"));
	}

	#[tokio::test]
	async fn self_drop_orders_cannot_be_approved() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();

		let err = engine
			.approve_order(&admin(), &bundle.order.id)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "PRECONDITION_FAILED");
		assert!(err.to_string().contains("PICKUP"));
	}

	#[tokio::test]
	async fn invalid_transition_names_both_states() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();

		let err = engine
			.update_status(&admin(), &bundle.order.id, OrderStatus::Selesai, None, None)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "INVALID_TRANSITION");
		assert!(err.to_string().contains("DIPESAN"));
		assert!(err.to_string().contains("SELESAI"));

		// And the order was not touched.
		let order = engine.store().get_order(&bundle.order.id).await.unwrap();
		assert_eq!(order.status, OrderStatus::Dipesan);
	}

	#[tokio::test]
	async fn washing_done_edge_is_not_reachable_generically() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();
		engine
			.update_status(&admin(), &id, OrderStatus::Dicuci, None, None)
			.await
			.unwrap();

		let err = engine
			.update_status(
				&admin(),
				&id,
				OrderStatus::MenungguKonfirmasiDelivery,
				None,
				None,
			)
			.await
			.unwrap_err();
		assert_eq!(err.code(), "INVALID_TRANSITION");
	}

	#[tokio::test]
	async fn confirm_delivery_only_from_dicuci() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();

		let err = engine.confirm_delivery(&admin(), &id).await.unwrap_err();
		assert_eq!(err.code(), "INVALID_TRANSITION");
		let untouched = engine.store().get_order(&id).await.unwrap();
		assert_eq!(untouched.status, OrderStatus::Dipesan);

		engine
			.update_status(&admin(), &id, OrderStatus::Dicuci, None, None)
			.await
			.unwrap();
		let updated = engine.confirm_delivery(&admin(), &id).await.unwrap();
		assert_eq!(updated.status, OrderStatus::MenungguKonfirmasiDelivery);
		assert_eq!(updated.delivery_required, None);
	}

	#[tokio::test]
	async fn transitions_record_notifications_and_publish_events() {
		let engine = engine().await;
		let bundle = engine.create_order(&owner(), self_order()).await.unwrap();
		let id = bundle.order.id.clone();

		let mut events = engine.event_bus().subscribe(&id).await;
		engine
			.update_status(&admin(), &id, OrderStatus::Dicuci, Some("washing".into()), None)
			.await
			.unwrap();

		let OrderEvent::StatusUpdated {
			order_id,
			status,
			notes,
			..
		} = events.recv().await.unwrap();
		assert_eq!(order_id, id);
		assert_eq!(status, OrderStatus::Dicuci);
		assert_eq!(notes.as_deref(), Some("washing"));

		let notifications = engine.list_notifications(&owner()).await.unwrap();
		assert!(notifications
			.iter()
			.any(|n| n.kind == NotificationKind::StatusUpdated
				&& n.payload["status"] == "DICUCI"));
	}
}
