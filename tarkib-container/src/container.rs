//! # The Container: runtime of a wiring plan
//!
//! A [`Container`] executes a [`WiringPlan`]: it looks up the binding
//! for a requested interface, constructs or reuses the chosen component
//! according to its lifetime, and tracks disposable instances.
//!
//! # Architecture
//! ```text
//! WiringPlan ──builder()──> ContainerBuilder ──build()──> Container
//!                                                            │
//!                      ┌─────────────────────────────────────┤
//!                      │                                     │
//!          begin_lifetime_scope()                   compose_on(&container)
//!                      │                                     │
//!                      ▼                                     ▼
//!             scope (same plan,                  composed container (own plan,
//!             fresh scoped slots,                misses fall through to base,
//!             singletons from parent)            base.inheritor points back)
//! ```
//!
//! Resolution order for one key: local binding, then seed values, then
//! the base container.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use tarkib_container::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) -> String { format!("[console] {msg}") }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let plan = ComponentRegistry::new()
//!     .component(
//!         ComponentDescriptor::constructed::<ConsoleLogger>()
//!             .implements::<dyn Logger>(|l| l)
//!             .singleton()
//!             .default_constructor(|_| Ok(Arc::new(ConsoleLogger))),
//!     )
//!     .component(
//!         ComponentDescriptor::constructed::<UserService>()
//!             .constructor(
//!                 Constructor::new("new").param(Parameter::of::<dyn Logger>("logger")),
//!                 |args| Ok(Arc::new(UserService { logger: args.get("logger")? })),
//!             ),
//!     )
//!     .plan()
//!     .expect("Failed to plan");
//!
//! let container = Container::builder(plan).build().expect("Failed to build container");
//! let service = container.resolve::<UserService>().expect("Failed to resolve");
//! assert_eq!(service.logger.log("hi"), "[console] hi");
//! ```

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tarkib_support::rendering::suggest_similar;
use tracing::{debug, info, instrument, trace, warn};

use crate::arguments::{Argument, Arguments};
use crate::binding::ComponentId;
use crate::dispose::{DisposalRegistry, DisposeFn, dispose_all};
use crate::error::{NotRegisteredError, Result, TarkibError};
use crate::flags::Flags;
use crate::instance::Instance;
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::plan::{PlannedComponent, WiringPlan};
use crate::selector::ArgumentSource;

/// Nested constructions allowed on one thread before giving up.
pub const MAX_RESOLUTION_DEPTH: usize = 256;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static RESOLUTION_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter(key: DependencyKey) -> Result<Self> {
        RESOLUTION_DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > MAX_RESOLUTION_DEPTH {
                warn!(key = %key, depth = next, "Resolution depth exceeded");
                return Err(TarkibError::ResolutionDepthExceeded { key, depth: next });
            }
            depth.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        RESOLUTION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

// ═══════════════════════════════════════════
// ContainerBuilder
// ═══════════════════════════════════════════

/// Configures and builds a [`Container`] over a plan.
///
/// ```rust,ignore
/// let container = Container::builder(plan)
///     .flag("Beta", true)
///     .seed(Arc::new(Settings::load()))
///     .compose_on(&base)
///     .build()?;
/// ```
pub struct ContainerBuilder {
    plan: Arc<WiringPlan>,
    flags: Flags,
    seeds: HashMap<DependencyKey, Instance>,
    base: Option<Container>,
}

impl ContainerBuilder {
    fn new(plan: Arc<WiringPlan>) -> Self {
        Self {
            plan,
            flags: Flags::new(),
            seeds: HashMap::new(),
            base: None,
        }
    }

    /// Sets one flag. Local flags override the base snapshot by name.
    pub fn flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.set(name, value);
        self
    }

    pub fn flags<S: Into<String>>(mut self, flags: impl IntoIterator<Item = (S, bool)>) -> Self {
        for (name, value) in flags {
            self.flags.set(name, value);
        }
        self
    }

    /// Supplies a value for a type no component constructs.
    pub fn seed<T: ?Sized + Send + Sync + 'static>(self, value: Arc<T>) -> Self {
        self.seed_instance(DependencyKey::of::<T>(), Instance::new(value))
    }

    pub fn seed_instance(mut self, key: DependencyKey, instance: Instance) -> Self {
        trace!(key = %key, "Seeded value");
        self.seeds.insert(key, instance);
        self
    }

    /// Builds on top of an existing container.
    ///
    /// Misses fall through to `base`, flags start from its snapshot, and
    /// promoted parameters not seeded here are resolved from it.
    pub fn compose_on(mut self, base: &Container) -> Self {
        self.base = Some(base.clone());
        self
    }

    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        let ContainerBuilder {
            plan,
            flags: local_flags,
            mut seeds,
            base,
        } = self;

        if let Some(base) = &base {
            base.ensure_live()?;
        }

        let mut flags = base.as_ref().map(|b| b.inner.flags.clone()).unwrap_or_default();
        flags.declare(plan.declared_flags().iter().map(String::as_str));
        flags.override_with(&local_flags);

        for parameter in plan.promoted_parameters() {
            if seeds.contains_key(&parameter.key) {
                continue;
            }
            match &base {
                Some(base) => {
                    trace!(key = %parameter.key, "Resolving promoted parameter from base");
                    let instance = base.resolve_key(&parameter.key)?;
                    seeds.insert(parameter.key, instance);
                }
                None => {
                    let required_by = plan
                        .components()
                        .iter()
                        .find(|c| c.construction().missing.contains(parameter))
                        .map(PlannedComponent::key);
                    warn!(key = %parameter.key, parameter = parameter.name, "Promoted parameter was not seeded");
                    return Err(TarkibError::NotRegistered(NotRegisteredError {
                        requested: parameter.key,
                        required_by,
                        suggestions: Vec::new(),
                    }));
                }
            }
        }

        let base = base.map(|container| BaseLink {
            container,
            relation: BaseRelation::Composed,
        });
        let container = Container {
            inner: Arc::new(ContainerInner::new(plan, base, flags, seeds)),
        };

        if let Some(link) = &container.inner.base {
            *link.container.inner.inheritor.write() = Some(Arc::downgrade(&container.inner));
        }

        info!(
            container = container.inner.id,
            components = container.inner.plan.components().len(),
            flags = container.inner.flags.len(),
            composed = container.inner.base.is_some(),
            "Container built ✓"
        );
        Ok(container)
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("components", &self.plan.components().len())
            .field("flags", &self.flags)
            .field("seeds", &self.seeds.len())
            .field("composed", &self.base.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// How a container relates to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseRelation {
    /// Lifetime scope spawned from the base.
    Scope,
    /// Built on top of the base with its own plan.
    Composed,
}

struct BaseLink {
    container: Container,
    relation: BaseRelation,
}

/// Lazily built value guarded by its own initialization lock.
///
/// Only the slot being filled is locked while its factory runs, so
/// threads building different slots never wait on each other. The lock
/// is reentrant: a factory that loops back into its own slot is stopped
/// by the depth guard rather than by a deadlock.
struct Slot<T> {
    value: OnceCell<T>,
    init: ReentrantMutex<()>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            value: OnceCell::new(),
            init: ReentrantMutex::new(()),
        }
    }

    /// The stored value, and whether this call stored it.
    fn get_or_try_init(&self, init: impl FnOnce() -> Result<T>) -> Result<(T, bool)> {
        if let Some(value) = self.value.get() {
            return Ok((value.clone(), false));
        }

        let _init = self.init.lock();
        if let Some(value) = self.value.get() {
            return Ok((value.clone(), false));
        }

        let value = init()?;
        match self.value.set(value.clone()) {
            Ok(()) => Ok((value, true)),
            // a reentrant call filled the slot first
            Err(value) => Ok((self.value.get().cloned().unwrap_or(value), false)),
        }
    }
}

pub(crate) struct ContainerInner {
    id: u64,
    plan: Arc<WiringPlan>,
    base: Option<BaseLink>,
    /// Non-owning back-reference to the container composed on this one.
    inheritor: RwLock<Option<Weak<ContainerInner>>>,
    flags: Flags,
    seeds: HashMap<DependencyKey, Instance>,
    /// One slot per component id, for singleton and scoped instances.
    slots: Vec<Slot<Instance>>,
    /// Local aggregate members per `many` key.
    aggregates: HashMap<DependencyKey, Slot<Vec<Instance>>>,
    /// Orders tracking against disposal.
    lifecycle: Mutex<()>,
    tracked: DisposalRegistry,
    disposed: AtomicBool,
}

impl ContainerInner {
    fn new(
        plan: Arc<WiringPlan>,
        base: Option<BaseLink>,
        flags: Flags,
        seeds: HashMap<DependencyKey, Instance>,
    ) -> Self {
        let slots = plan.components().iter().map(|_| Slot::new()).collect();
        let aggregates = plan
            .bindings()
            .iter()
            .filter(|(_, binding)| binding.is_aggregate())
            .map(|(key, _)| (*key, Slot::new()))
            .collect();

        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            plan,
            base,
            inheritor: RwLock::new(None),
            flags,
            seeds,
            slots,
            aggregates,
            lifecycle: Mutex::new(()),
            tracked: DisposalRegistry::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Disposes what this container tracked, without touching its base.
    ///
    /// Returns `false` if it was already disposed.
    pub(crate) fn dispose_local(&self) -> bool {
        let entries = {
            let _lifecycle = self.lifecycle.lock();
            if self.disposed.swap(true, Ordering::SeqCst) {
                return false;
            }
            self.tracked.drain()
        };
        debug!(container = self.id, tracked = entries.len(), "Disposing container");
        dispose_all(entries);
        true
    }

    /// Records a disposable instance for later release.
    ///
    /// If the container was disposed while the instance was being built,
    /// the instance is released immediately instead.
    fn track_instance(&self, key: DependencyKey, instance: &Instance, dispose: &DisposeFn) -> Result<()> {
        {
            let _lifecycle = self.lifecycle.lock();
            if !self.disposed.load(Ordering::SeqCst) {
                self.tracked.track_instance(key, instance.clone(), dispose.clone());
                return Ok(());
            }
        }
        debug!(key = %key, container = self.id, "Container disposed during construction, releasing instance");
        dispose(instance);
        Err(TarkibError::Disposed)
    }

    fn track_scope(&self, scope: &Arc<ContainerInner>) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        if self.disposed.load(Ordering::SeqCst) {
            return Err(TarkibError::Disposed);
        }
        self.tracked.track_scope(Arc::downgrade(scope));
        Ok(())
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.dispose_local();
    }
}

/// Thread-safe runtime over a [`WiringPlan`].
///
/// Cloning is cheap and yields another handle to the same container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Starts configuring a container over `plan`.
    pub fn builder(plan: impl Into<Arc<WiringPlan>>) -> ContainerBuilder {
        ContainerBuilder::new(plan.into())
    }

    /// Resolves one instance of `T`.
    ///
    /// # Errors
    /// - [`TarkibError::NotRegistered`]: nothing in the chain binds `T`
    /// - [`TarkibError::AbsentInstance`]: a conditional binding chose no one
    /// - [`TarkibError::Disposed`]: the container was disposed
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = DependencyKey::of::<T>();
        let instance = self.resolve_key(&key)?;
        Self::downcast(&key, &instance)
    }

    /// Type-erased form of [`resolve`](Self::resolve).
    ///
    /// A `many` key resolves to the whole collection, stored as a
    /// `Vec<Instance>` in the same order as [`resolve_all`](Self::resolve_all).
    pub fn resolve_key(&self, key: &DependencyKey) -> Result<Instance> {
        trace!(key = %key, "Resolving");
        self.lookup(key)?.ok_or_else(|| self.not_registered(key, None))
    }

    /// Like [`resolve`](Self::resolve), but `Ok(None)` when `T` is not
    /// registered anywhere in the chain.
    ///
    /// Failures while constructing a registered `T` are still errors.
    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        let key = DependencyKey::of::<T>();
        match self.try_resolve_key(&key)? {
            Some(instance) => Self::downcast(&key, &instance).map(Some),
            None => Ok(None),
        }
    }

    pub fn try_resolve_key(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        self.lookup(key)
    }

    /// Every implementation of `T` across the container chain.
    ///
    /// Order: composed base chain, local members, inheritor chain.
    pub fn resolve_all<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>> {
        let key = DependencyKey::many::<T>();
        self.resolve_all_key(&key)?
            .iter()
            .map(|instance| Self::downcast(&key.element(), instance))
            .collect()
    }

    pub fn resolve_all_key(&self, key: &DependencyKey) -> Result<Vec<Instance>> {
        self.ensure_live()?;
        let key = key.as_many();
        trace!(key = %key, "Resolving collection");

        let mut visited = HashSet::new();
        let mut members = Vec::new();
        let found = self.gather(&key, &mut visited, &mut members)?;
        if !found {
            return Err(self.not_registered(&key, None));
        }
        Ok(members)
    }

    /// `true` if resolving `T` would find a binding or seed.
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered_key(&DependencyKey::of::<T>())
    }

    pub fn is_registered_key(&self, key: &DependencyKey) -> bool {
        self.inner.plan.binding(key).is_some()
            || self.inner.seeds.contains_key(key)
            || self.inner.base.as_ref().is_some_and(|link| link.container.is_registered_key(key))
    }

    /// Spawns a child scope: fresh scoped instances, shared singletons.
    ///
    /// The parent tracks the scope weakly; disposing the parent disposes
    /// scopes that are still alive.
    pub fn begin_lifetime_scope(&self) -> Result<Container> {
        self.ensure_live()?;

        let inner = ContainerInner::new(
            self.inner.plan.clone(),
            Some(BaseLink {
                container: self.clone(),
                relation: BaseRelation::Scope,
            }),
            self.inner.flags.clone(),
            self.inner.seeds.clone(),
        );
        let scope = Container { inner: Arc::new(inner) };
        self.inner.track_scope(&scope.inner)?;

        debug!(parent = self.inner.id, scope = scope.inner.id, "Began lifetime scope");
        Ok(scope)
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        self.inner.flags.get(name)
    }

    /// Snapshot of every flag, in name order.
    pub fn get_booleans(&self) -> Vec<(String, bool)> {
        self.inner.flags.to_pairs()
    }

    pub fn flags(&self) -> &Flags {
        &self.inner.flags
    }

    /// Disposes tracked instances and live scopes, oldest first, then a
    /// composed base. A lifetime scope never disposes its parent.
    pub fn dispose(&self) {
        if !self.inner.dispose_local() {
            trace!(container = self.inner.id, "Already disposed");
        }
        if let Some(BaseLink {
            container,
            relation: BaseRelation::Composed,
        }) = &self.inner.base
        {
            container.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn base(&self) -> Option<Container> {
        self.inner.base.as_ref().map(|link| link.container.clone())
    }

    pub fn base_relation(&self) -> Option<BaseRelation> {
        self.inner.base.as_ref().map(|link| link.relation)
    }

    /// The container most recently composed on this one, if still alive.
    pub fn inheritor(&self) -> Option<Container> {
        self.inner
            .inheritor
            .read()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    pub fn plan(&self) -> &Arc<WiringPlan> {
        &self.inner.plan
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    // ── Internal ──

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(TarkibError::Disposed);
        }
        Ok(())
    }

    fn downcast<T: ?Sized + Send + Sync + 'static>(key: &DependencyKey, instance: &Instance) -> Result<Arc<T>> {
        instance.downcast::<T>().ok_or_else(|| TarkibError::TypeMismatch {
            key: *key,
            expected: std::any::type_name::<T>(),
        })
    }

    /// `Ok(None)` when nothing in the chain knows `key`.
    fn lookup(&self, key: &DependencyKey) -> Result<Option<Instance>> {
        self.ensure_live()?;

        if key.is_many() {
            let mut visited = HashSet::new();
            let mut members = Vec::new();
            if !self.gather(key, &mut visited, &mut members)? {
                return Ok(None);
            }
            return Ok(Some(Instance::new(Arc::new(members))));
        }

        if let Some(binding) = self.inner.plan.binding(key) {
            return match binding.select(&self.inner.flags) {
                Some(id) => self.component_as(id, key).map(Some),
                None => {
                    warn!(interface = %key, "Conditional binding selected no implementation");
                    Err(TarkibError::AbsentInstance { interface: *key })
                }
            };
        }

        if let Some(seed) = self.inner.seeds.get(key) {
            trace!(key = %key, "Resolved from seed");
            return Ok(Some(seed.clone()));
        }

        match &self.inner.base {
            Some(link) => {
                trace!(key = %key, base = link.container.inner.id, "Falling through to base");
                link.container.lookup(key)
            }
            None => Ok(None),
        }
    }

    fn planned(&self, id: ComponentId) -> Result<&PlannedComponent> {
        self.inner
            .plan
            .component(id)
            .ok_or_else(|| TarkibError::MissingArgument {
                parameter: format!("component #{id}"),
                expected: "a planned component",
            })
    }

    /// Instance of component `id`, cast to `interface`.
    fn component_as(&self, id: ComponentId, interface: &DependencyKey) -> Result<Instance> {
        let instance = self.component_instance(id)?;
        self.planned(id)?
            .descriptor()
            .cast(interface, &instance)
            .ok_or_else(|| TarkibError::TypeMismatch {
                key: *interface,
                expected: interface.type_name(),
            })
    }

    fn component_instance(&self, id: ComponentId) -> Result<Instance> {
        match self.planned(id)?.lifetime() {
            Lifetime::Transient => self.construct(id),
            Lifetime::Singleton => match &self.inner.base {
                Some(BaseLink {
                    container,
                    relation: BaseRelation::Scope,
                }) => container.component_instance(id),
                _ => self.cached(id),
            },
            Lifetime::Scoped => self.cached(id),
        }
    }

    /// Lazily built singleton or scoped instance of component `id`.
    fn cached(&self, id: ComponentId) -> Result<Instance> {
        let slot = self.inner.slots.get(id).ok_or_else(|| TarkibError::MissingArgument {
            parameter: format!("slot #{id}"),
            expected: "a component slot",
        })?;

        let (instance, created) = slot.get_or_try_init(|| self.construct(id))?;
        if created {
            let component = self.planned(id)?;
            if let Some(dispose) = component.descriptor().disposer() {
                self.inner.track_instance(component.key(), &instance, dispose)?;
            }
        }
        Ok(instance)
    }

    fn construct(&self, id: ComponentId) -> Result<Instance> {
        let component = self.planned(id)?;
        let key = component.key();
        let _depth = DepthGuard::enter(key)?;
        trace!(component = %key, lifetime = %component.lifetime(), container = self.inner.id, "Constructing");

        let construction = component.construction();
        let mut arguments = Arguments::new(key);

        if let Some(owner) = construction.path.owner() {
            let owner = self.resolve_required(&owner, key)?;
            arguments = arguments.with_owner(owner);
        }

        for planned in &construction.arguments {
            let value = match &planned.source {
                ArgumentSource::Component(dependency) | ArgumentSource::Seed(dependency) => {
                    Argument::Instance(self.resolve_required(dependency, key)?)
                }
                ArgumentSource::Collection(collection) => Argument::Many(self.resolve_all_key(collection)?),
                ArgumentSource::Flag(name) => Argument::Flag(self.inner.flags.is_enabled(name)),
                ArgumentSource::Container => Argument::Container(self.clone()),
                ArgumentSource::Default => Argument::Absent,
            };
            arguments.push(planned.name, value);
        }

        (construction.factory())(&arguments)
    }

    fn resolve_required(&self, dependency: &DependencyKey, required_by: DependencyKey) -> Result<Instance> {
        self.lookup(dependency)?
            .ok_or_else(|| self.not_registered(dependency, Some(required_by)))
    }

    /// Collects aggregate members reachable from this container.
    ///
    /// `visited` holds container ids and stops the walk from entering a
    /// container twice when base and inheritor links lead back.
    fn gather(&self, key: &DependencyKey, visited: &mut HashSet<u64>, out: &mut Vec<Instance>) -> Result<bool> {
        if !visited.insert(self.inner.id) {
            return Ok(false);
        }

        // scopes share their root's plan, so the root itself is skipped
        let anchor = self.anchor();
        visited.insert(anchor.inner.id);

        let mut found = false;
        if let Some(BaseLink {
            container,
            relation: BaseRelation::Composed,
        }) = &anchor.inner.base
        {
            found |= container.gather(key, visited, out)?;
        }

        if self.inner.plan.binding(key).is_some() {
            found = true;
            out.extend(self.local_members(key)?);
        }

        if let Some(inheritor) = anchor.inheritor() {
            if !inheritor.is_disposed() {
                found |= inheritor.gather(key, visited, out)?;
            }
        }

        Ok(found)
    }

    /// First ancestor reached through scope links only.
    fn anchor(&self) -> Container {
        let mut current = self.clone();
        loop {
            let parent = match &current.inner.base {
                Some(BaseLink {
                    container,
                    relation: BaseRelation::Scope,
                }) => container.clone(),
                _ => return current,
            };
            current = parent;
        }
    }

    fn local_members(&self, key: &DependencyKey) -> Result<Vec<Instance>> {
        let Some(binding) = self.inner.plan.binding(key) else {
            return Ok(Vec::new());
        };
        let element = key.element();
        let realize = || -> Result<Vec<Instance>> {
            let members = binding
                .members(&self.inner.flags)
                .into_iter()
                .map(|id| self.component_as(id, &element))
                .collect::<Result<Vec<_>>>()?;
            trace!(key = %key, members = members.len(), container = self.inner.id, "Aggregate realized");
            Ok(members)
        };

        match self.inner.aggregates.get(key) {
            Some(slot) => slot.get_or_try_init(realize).map(|(members, _)| members),
            None => realize(),
        }
    }

    fn not_registered(&self, key: &DependencyKey, required_by: Option<DependencyKey>) -> TarkibError {
        let mut known: Vec<DependencyKey> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(container) = current {
            known.extend(container.inner.plan.bindings().keys().copied());
            known.extend(container.inner.seeds.keys().copied());
            current = container.base();
        }

        let names: Vec<&str> = known.iter().map(DependencyKey::type_name).collect();
        let suggestions = suggest_similar(key.type_name(), &names, 3)
            .into_iter()
            .filter_map(|name| known.iter().find(|k| k.type_name() == name).copied())
            .collect();

        TarkibError::NotRegistered(NotRegisteredError {
            requested: *key,
            required_by,
            suggestions,
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("components", &self.inner.plan.components().len())
            .field("flags", &self.inner.flags)
            .field("base", &self.base_relation())
            .field("tracked", &self.inner.tracked.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{BaseRelation, Container, ContainerBuilder};
    pub use crate::arguments::{Argument, Arguments};
    pub use crate::descriptor::{ComponentBuilder, ComponentDescriptor, Constructor, Parameter, Priority};
    pub use crate::dispose::Dispose;
    pub use crate::error::{Result, TarkibError};
    pub use crate::flags::Flags;
    pub use crate::key::DependencyKey;
    pub use crate::lifetime::Lifetime;
    pub use crate::plan::WiringPlan;
    pub use crate::provider::{Provider, ProviderEntry, ProviderRegistry};
    pub use crate::registry::ComponentRegistry;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
