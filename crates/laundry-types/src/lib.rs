//! Common types module for the laundry order system.
//!
//! This module defines the core data types and structures used throughout
//! the order lifecycle. It provides a centralized location for shared types
//! to ensure consistency across all components.

/// Principal and role types for authorization decisions.
pub mod account;
/// Service catalog types referenced by order items.
pub mod catalog;
/// Real-time event types published per order topic.
pub mod events;
/// Notification records and delivery channels.
pub mod notification;
/// Order, order item and status types.
pub mod order;
/// Payment records and payment state.
pub mod payment;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Store-boundary types: batched bundles, patches and commit guards.
pub mod store;
/// Utility functions shared across crates.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use account::*;
pub use catalog::*;
pub use events::*;
pub use notification::*;
pub use order::*;
pub use payment::*;
pub use registry::*;
pub use store::*;
pub use utils::{current_timestamp, truncate_id};
pub use validation::*;
