//! Error taxonomy for lifecycle operations.
//!
//! Validation and precondition errors are detected before any mutation and
//! returned synchronously; dependency failures abort the operation;
//! side-effect failures (email, event bus) never appear here, they are
//! logged after commit.

use laundry_storage::StoreError;
use laundry_types::OrderStatus;
use thiserror::Error;

/// Errors returned by lifecycle engine operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
	/// An entity is absent, or not visible to the caller.
	#[error("{entity} not found: {id}")]
	NotFound { entity: &'static str, id: String },
	/// The requested status is not reachable from the current one.
	#[error("Invalid transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	/// The operation's precondition does not hold.
	#[error("Precondition failed: {0}")]
	PreconditionFailed(String),
	/// The input is malformed.
	#[error("Validation failed: {0}")]
	ValidationFailed(String),
	/// The caller may not perform this operation.
	#[error("Unauthorized: {0}")]
	Unauthorized(String),
	/// The order store is unavailable or timed out. Fatal to the operation.
	#[error("Dependency failure: {0}")]
	Dependency(String),
}

impl LifecycleError {
	/// Stable error code for outer layers (HTTP mappers, logs).
	pub fn code(&self) -> &'static str {
		match self {
			LifecycleError::NotFound { .. } => "NOT_FOUND",
			LifecycleError::InvalidTransition { .. } => "INVALID_TRANSITION",
			LifecycleError::PreconditionFailed(_) => "PRECONDITION_FAILED",
			LifecycleError::ValidationFailed(_) => "VALIDATION_FAILED",
			LifecycleError::Unauthorized(_) => "UNAUTHORIZED",
			LifecycleError::Dependency(_) => "DEPENDENCY_FAILURE",
		}
	}

	/// Maps a store error from a plain read/write of the named entity.
	///
	/// Stale-commit errors are not mapped here; commit sites translate
	/// them against the operation's target themselves.
	pub(crate) fn from_store(err: StoreError, entity: &'static str, id: &str) -> Self {
		match err {
			StoreError::NotFound => LifecycleError::NotFound {
				entity,
				id: id.to_string(),
			},
			other => LifecycleError::Dependency(other.to_string()),
		}
	}
}
