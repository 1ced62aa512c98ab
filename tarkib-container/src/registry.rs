//! Component registry: the declarative input of planning.
//!
//! The registry stores every [`ComponentDescriptor`] in registration
//! order plus every interface requested as a collection. It is the
//! only mutable step: once [`ComponentRegistry::plan`] succeeds, the
//! resulting [`WiringPlan`] is immutable.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::descriptor::ComponentDescriptor;
use crate::error::Result;
use crate::key::DependencyKey;
use crate::plan::WiringPlan;
use crate::provider::{Provider, ProviderRegistry, discovered_providers};

/// Planning options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSettings {
    /// Type names containing this marker are treated as overrides.
    pub override_marker: Option<String>,
}

/// Ordered set of descriptors and collection requests.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use tarkib_container::prelude::*;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct English;
/// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
///
/// let plan = ComponentRegistry::new()
///     .component(
///         ComponentDescriptor::constructed::<English>()
///             .implements::<dyn Greeter>(|g| g)
///             .default_constructor(|_| Ok(Arc::new(English))),
///     )
///     .plan()
///     .unwrap();
///
/// let container = Container::builder(plan).build().unwrap();
/// assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "hello");
/// ```
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    descriptors: Vec<ComponentDescriptor>,
    collections: Vec<DependencyKey>,
    settings: PlanSettings,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor. Later registrations win ties.
    pub fn register(&mut self, descriptor: impl Into<ComponentDescriptor>) -> &mut Self {
        let descriptor = descriptor.into();
        debug!(
            component = %descriptor.key(),
            lifetime = %descriptor.lifetime(),
            interfaces = descriptor.claims().len(),
            "Registered component"
        );
        self.descriptors.push(descriptor);
        self
    }

    /// Chaining form of [`register`](Self::register).
    pub fn component(mut self, descriptor: impl Into<ComponentDescriptor>) -> Self {
        self.register(descriptor);
        self
    }

    /// Records that every implementation of `T` is consumed as a collection.
    pub fn request_collection<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.record_collection(DependencyKey::many::<T>());
        self
    }

    fn record_collection(&mut self, key: DependencyKey) {
        let key = key.as_many();
        if !self.collections.contains(&key) {
            debug!(collection = %key, "Requested collection");
            self.collections.push(key);
        }
    }

    pub fn add_provider(&mut self, provider: &dyn Provider) -> &mut Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self);
        self
    }

    /// Runs every provider submitted through `inventory`, sorted by name.
    pub fn discover(&mut self) -> &mut Self {
        let entries = discovered_providers();
        info!(providers = entries.len(), "Discovering providers");
        for entry in entries {
            debug!(provider = entry.name, "Running discovered provider");
            (entry.register)(self);
        }
        self
    }

    /// Sets the legacy name marker for override components.
    pub fn override_marker(&mut self, marker: impl Into<String>) -> &mut Self {
        self.settings.override_marker = Some(marker.into());
        self
    }

    pub fn settings(&self) -> &PlanSettings {
        &self.settings
    }

    pub fn descriptors(&self) -> &[ComponentDescriptor] {
        &self.descriptors
    }

    pub fn requested_collections(&self) -> &[DependencyKey] {
        &self.collections
    }

    /// Every interface some descriptor claims.
    pub fn available_interfaces(&self) -> HashSet<DependencyKey> {
        self.descriptors.iter().flat_map(|descriptor| descriptor.interfaces()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Builds the wiring plan.
    ///
    /// # Errors
    /// - [`TarkibError::CyclicDependency`](crate::error::TarkibError::CyclicDependency)
    /// - [`TarkibError::UnsatisfiableConstruction`](crate::error::TarkibError::UnsatisfiableConstruction)
    pub fn plan(&self) -> Result<WiringPlan> {
        WiringPlan::build(self)
    }
}

impl ProviderRegistry for ComponentRegistry {
    fn register_component(&mut self, descriptor: ComponentDescriptor) {
        self.register(descriptor);
    }

    fn request_collection(&mut self, key: DependencyKey) {
        self.record_collection(key);
    }
}
