//! Registry trait for self-registering implementations.
//!
//! Each pluggable module (store backends, notifier channels) provides a
//! Registry struct implementing this trait, declaring the name used in
//! configuration files together with its factory function.

/// Base trait for implementation registries.
///
/// Examples of configuration names:
/// - "memory" for storage.implementations.memory
/// - "webhook" for notify.implementations.webhook
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
