//! Provider trait: a module of related component registrations.
//!
//! Providers group related components together so an application can
//! register them as a unit, by hand or through link-time discovery.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use tarkib_container::descriptor::ComponentDescriptor;
//! use tarkib_container::provider::{Provider, ProviderRegistry};
//! use tarkib_container::registry::ComponentRegistry;
//!
//! struct Clock;
//! struct ClockProvider;
//!
//! impl Provider for ClockProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.register_component(
//!             ComponentDescriptor::constructed::<Clock>()
//!                 .singleton()
//!                 .default_constructor(|_| Ok(Arc::new(Clock)))
//!                 .build(),
//!         );
//!     }
//! }
//!
//! let mut registry = ComponentRegistry::new();
//! registry.add_provider(&ClockProvider);
//! assert_eq!(registry.len(), 1);
//! ```

use crate::descriptor::ComponentDescriptor;
use crate::key::DependencyKey;

/// A module that registers related components.
pub trait Provider: Send + Sync {
    /// Register components into the registry.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// The part of the registry that providers see.
pub trait ProviderRegistry {
    fn register_component(&mut self, descriptor: ComponentDescriptor);

    /// Records that `key` (a `many` key) is consumed as a collection.
    fn request_collection(&mut self, key: DependencyKey);
}

/// Link-time registration of a provider.
///
/// ```ignore
/// inventory::submit! {
///     ProviderEntry { name: "storage", register: register_storage }
/// }
/// ```
///
/// [`ComponentRegistry::discover`](crate::registry::ComponentRegistry::discover)
/// runs every submitted entry, sorted by name.
pub struct ProviderEntry {
    /// Unique provider name
    pub name: &'static str,
    pub register: fn(&mut dyn ProviderRegistry),
}

inventory::collect!(ProviderEntry);

/// Every submitted provider entry, sorted by name.
pub fn discovered_providers() -> Vec<&'static ProviderEntry> {
    let mut entries: Vec<&'static ProviderEntry> = inventory::iter::<ProviderEntry>.into_iter().collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}
