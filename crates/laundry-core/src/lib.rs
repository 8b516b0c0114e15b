//! Core lifecycle engine for the laundry order system.
//!
//! This crate owns the order status state machine and the side-effect
//! orchestration that accompanies every transition: the transactional
//! in-app notification row, the best-effort email dispatch, and the
//! real-time event published to the order's topic. Persistence,
//! notification delivery and pricing are consumed through the sibling
//! crates' service interfaces and wired together by the [`EngineBuilder`].

pub mod builder;
pub mod engine;
pub mod error;
pub mod state;

pub use builder::{BuildError, EngineBuilder};
pub use engine::event_bus::EventBus;
pub use engine::LifecycleEngine;
pub use error::LifecycleError;
