//! Component descriptors: immutable facts about each injectable unit.
//!
//! A [`ComponentDescriptor`] says what type a component produces, which
//! interfaces it may satisfy, how long its instances live, when it is
//! eligible (a flag condition), and how to build it: one of several
//! constructors, or a factory member on some owning type.
//!
//! Descriptors are created through the typed [`ComponentBuilder`], which
//! ties every factory closure and interface cast to the produced type.
//!
//! # Examples
//! ```
//! use std::sync::Arc;
//! use tarkib_container::descriptor::{ComponentDescriptor, Constructor, Parameter};
//!
//! trait Clock: Send + Sync {}
//! struct SystemClock;
//! impl Clock for SystemClock {}
//!
//! struct Scheduler { clock: Arc<dyn Clock> }
//!
//! let clock = ComponentDescriptor::constructed::<SystemClock>()
//!     .implements::<dyn Clock>(|c| c)
//!     .singleton()
//!     .default_constructor(|_| Ok(Arc::new(SystemClock)))
//!     .build();
//!
//! let scheduler = ComponentDescriptor::constructed::<Scheduler>()
//!     .as_self()
//!     .constructor(
//!         Constructor::new("new").param(Parameter::of::<dyn Clock>("clock")),
//!         |args| Ok(Arc::new(Scheduler { clock: args.get("clock")? })),
//!     )
//!     .build();
//!
//! assert_eq!(clock.interfaces().count(), 1);
//! assert!(scheduler.type_name().contains("Scheduler"));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::arguments::Arguments;
use crate::dispose::{Dispose, DisposeFn};
use crate::error::Result;
use crate::instance::Instance;
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;

/// Builds an instance from resolved arguments.
pub type FactoryFn = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;

/// Re-types a component instance as one of its interfaces.
pub type CastFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Flag condition: the component is eligible only when `flag == value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Condition {
    pub flag: String,
    pub value: bool,
}

impl Condition {
    pub fn new(flag: impl Into<String>, value: bool) -> Self {
        Self { flag: flag.into(), value }
    }
}

/// Override rank used when several components claim one interface.
///
/// Higher ranks are moved behind lower ones in priority order, so they
/// win "last one wins" ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum Priority {
    #[default]
    Normal,
    /// Test doubles and deliberate overrides.
    Override,
}

/// How a parameter is satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// One instance of a type or interface.
    Dependency(DependencyKey),
    /// Every implementation of an interface (the element key).
    Collection(DependencyKey),
    /// A boolean configuration flag by name.
    Flag(String),
    /// The container performing the resolution.
    Container,
}

/// One declared parameter of a constructor or factory method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: &'static str,
    kind: ParameterKind,
    has_default: bool,
    variadic: bool,
}

impl Parameter {
    /// A parameter needing one `T`.
    pub fn of<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::with_kind(name, ParameterKind::Dependency(DependencyKey::of::<T>()))
    }

    /// A parameter needing every implementation of `T`.
    pub fn many<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::with_kind(name, ParameterKind::Collection(DependencyKey::of::<T>()))
    }

    /// A parameter receiving the value of the flag with the same name.
    pub fn flag(name: &'static str) -> Self {
        Self::with_kind(name, ParameterKind::Flag(name.to_string()))
    }

    /// A parameter receiving the resolving container.
    pub fn container(name: &'static str) -> Self {
        Self::with_kind(name, ParameterKind::Container)
    }

    fn with_kind(name: &'static str, kind: ParameterKind) -> Self {
        Self {
            name,
            kind,
            has_default: false,
            variadic: false,
        }
    }

    /// Marks the parameter as having a default value.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Marks the parameter as a trailing catch-all.
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// Name and parameter list of a construction path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    name: &'static str,
    parameters: Vec<Parameter>,
}

impl Constructor {
    pub fn new(name: &'static str) -> Self {
        Self { name, parameters: Vec::new() }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

/// A construction path together with its erased factory.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    signature: Constructor,
    factory: FactoryFn,
}

impl ConstructorDescriptor {
    pub fn name(&self) -> &'static str {
        self.signature.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.signature.parameters
    }

    pub fn factory(&self) -> &FactoryFn {
        &self.factory
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.signature.name)
            .field("parameters", &self.signature.parameters)
            .finish()
    }
}

/// How a component is built.
#[derive(Debug, Clone)]
pub enum Construction {
    /// Candidate constructors in declaration order.
    Constructor(Vec<ConstructorDescriptor>),
    /// A method on `owner`, called with its own parameters.
    FactoryMethod {
        owner: DependencyKey,
        method: ConstructorDescriptor,
    },
    /// A property read on `owner`.
    FactoryProperty {
        owner: DependencyKey,
        property: ConstructorDescriptor,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionKind {
    Constructor,
    FactoryMethod,
    FactoryProperty,
}

impl Construction {
    pub fn kind(&self) -> ConstructionKind {
        match self {
            Construction::Constructor(_) => ConstructionKind::Constructor,
            Construction::FactoryMethod { .. } => ConstructionKind::FactoryMethod,
            Construction::FactoryProperty { .. } => ConstructionKind::FactoryProperty,
        }
    }

    /// Owning type of a factory member.
    pub fn owner(&self) -> Option<DependencyKey> {
        match self {
            Construction::Constructor(_) => None,
            Construction::FactoryMethod { owner, .. } | Construction::FactoryProperty { owner, .. } => {
                Some(*owner)
            }
        }
    }
}

/// An interface a component may satisfy, with the cast that produces it.
#[derive(Clone)]
pub struct InterfaceClaim {
    key: DependencyKey,
    cast: CastFn,
}

impl InterfaceClaim {
    pub fn key(&self) -> DependencyKey {
        self.key
    }

    pub fn cast(&self, instance: &Instance) -> Option<Instance> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for InterfaceClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceClaim({})", self.key)
    }
}

/// Immutable description of one injectable unit.
#[derive(Clone)]
pub struct ComponentDescriptor {
    key: DependencyKey,
    interfaces: Vec<InterfaceClaim>,
    lifetime: Lifetime,
    condition: Option<Condition>,
    construction: Construction,
    disposer: Option<DisposeFn>,
    priority: Priority,
}

impl ComponentDescriptor {
    /// Starts a descriptor for a type built by its own constructors.
    pub fn constructed<T: ?Sized + Send + Sync + 'static>() -> ComponentBuilder<T> {
        ComponentBuilder::new(Construction::Constructor(Vec::new()))
    }

    /// Starts a descriptor for `T` produced by a method on `Owner`.
    ///
    /// The owner is resolved first and handed to `factory` together with
    /// the method's own arguments.
    pub fn factory_method<T, Owner>(
        signature: Constructor,
        factory: impl Fn(Arc<Owner>, &Arguments) -> Result<Arc<T>> + Send + Sync + 'static,
    ) -> ComponentBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
        Owner: ?Sized + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |args: &Arguments| {
            let owner = args.owner::<Owner>()?;
            Ok(Instance::new(factory(owner, args)?))
        });
        ComponentBuilder::new(Construction::FactoryMethod {
            owner: DependencyKey::of::<Owner>(),
            method: ConstructorDescriptor { signature, factory },
        })
    }

    /// Starts a descriptor for `T` read from a property of `Owner`.
    pub fn factory_property<T, Owner>(
        name: &'static str,
        getter: impl Fn(Arc<Owner>) -> Arc<T> + Send + Sync + 'static,
    ) -> ComponentBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
        Owner: ?Sized + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |args: &Arguments| {
            let owner = args.owner::<Owner>()?;
            Ok(Instance::new(getter(owner)))
        });
        ComponentBuilder::new(Construction::FactoryProperty {
            owner: DependencyKey::of::<Owner>(),
            property: ConstructorDescriptor {
                signature: Constructor::new(name),
                factory,
            },
        })
    }

    /// Identity of the produced type.
    pub fn key(&self) -> DependencyKey {
        self.key
    }

    pub fn type_name(&self) -> &'static str {
        self.key.type_name()
    }

    /// Interfaces this component may satisfy, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = DependencyKey> + '_ {
        self.interfaces.iter().map(InterfaceClaim::key)
    }

    pub fn claims(&self) -> &[InterfaceClaim] {
        &self.interfaces
    }

    pub fn claims_interface(&self, key: &DependencyKey) -> bool {
        self.interfaces.iter().any(|claim| claim.key == *key)
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn construction_kind(&self) -> ConstructionKind {
        self.construction.kind()
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    pub(crate) fn disposer(&self) -> Option<&DisposeFn> {
        self.disposer.as_ref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Casts an instance of this component to one of its interfaces.
    pub fn cast(&self, interface: &DependencyKey, instance: &Instance) -> Option<Instance> {
        self.interfaces
            .iter()
            .find(|claim| claim.key == *interface)
            .and_then(|claim| claim.cast(instance))
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("type", &self.key.type_name())
            .field("interfaces", &self.interfaces)
            .field("lifetime", &self.lifetime)
            .field("condition", &self.condition)
            .field("construction", &self.construction)
            .field("disposable", &self.is_disposable())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Typed builder for [`ComponentDescriptor`].
///
/// If no interface is declared, the component is registered as itself.
pub struct ComponentBuilder<T: ?Sized> {
    interfaces: Vec<InterfaceClaim>,
    excluded: Vec<DependencyKey>,
    lifetime: Lifetime,
    condition: Option<Condition>,
    construction: Construction,
    disposer: Option<DisposeFn>,
    priority: Priority,
    _produces: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ComponentBuilder<T> {
    fn new(construction: Construction) -> Self {
        Self {
            interfaces: Vec::new(),
            excluded: Vec::new(),
            lifetime: Lifetime::Transient,
            condition: None,
            construction,
            disposer: None,
            priority: Priority::Normal,
            _produces: PhantomData,
        }
    }

    /// Declares that the component satisfies interface `I`.
    ///
    /// `cast` is usually `|c| c`, relying on unsized coercion.
    pub fn implements<I: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let erased: CastFn = Arc::new(move |instance: &Instance| {
            instance.downcast::<T>().map(|value| Instance::new(cast(value)))
        });
        self.interfaces.push(InterfaceClaim {
            key: DependencyKey::of::<I>(),
            cast: erased,
        });
        self
    }

    /// Declares that the component is resolvable as its own type.
    pub fn as_self(mut self) -> Self {
        self.interfaces.push(InterfaceClaim {
            key: DependencyKey::of::<T>(),
            cast: Arc::new(|instance: &Instance| Some(instance.clone())),
        });
        self
    }

    /// Removes interface `I` from whatever else was declared.
    pub fn except<I: ?Sized + 'static>(mut self) -> Self {
        self.excluded.push(DependencyKey::of::<I>());
        self
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn scoped(self) -> Self {
        self.lifetime(Lifetime::Scoped)
    }

    pub fn transient(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    /// Makes the component eligible only when `flag` equals `value`.
    pub fn when(mut self, flag: impl Into<String>, value: bool) -> Self {
        self.condition = Some(Condition::new(flag, value));
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Shorthand for [`Priority::Override`].
    pub fn overriding(self) -> Self {
        self.priority(Priority::Override)
    }

    /// Adds a candidate constructor.
    ///
    /// Replaces a factory-member construction if one was set.
    pub fn constructor(
        mut self,
        signature: Constructor,
        factory: impl Fn(&Arguments) -> Result<Arc<T>> + Send + Sync + 'static,
    ) -> Self {
        let descriptor = ConstructorDescriptor {
            signature,
            factory: Arc::new(move |args: &Arguments| Ok(Instance::new(factory(args)?))),
        };
        match &mut self.construction {
            Construction::Constructor(candidates) => candidates.push(descriptor),
            other => *other = Construction::Constructor(vec![descriptor]),
        }
        self
    }

    /// Adds a parameterless constructor named `default`.
    pub fn default_constructor(
        self,
        factory: impl Fn(&Arguments) -> Result<Arc<T>> + Send + Sync + 'static,
    ) -> Self {
        self.constructor(Constructor::new("default"), factory)
    }

    pub fn build(self) -> ComponentDescriptor {
        let mut interfaces = self.interfaces;
        if interfaces.is_empty() {
            interfaces.push(InterfaceClaim {
                key: DependencyKey::of::<T>(),
                cast: Arc::new(|instance: &Instance| Some(instance.clone())),
            });
        }

        let mut seen = Vec::with_capacity(interfaces.len());
        interfaces.retain(|claim| {
            if self.excluded.contains(&claim.key) || seen.contains(&claim.key) {
                return false;
            }
            seen.push(claim.key);
            true
        });

        ComponentDescriptor {
            key: DependencyKey::of::<T>(),
            interfaces,
            lifetime: self.lifetime,
            condition: self.condition,
            construction: self.construction,
            disposer: self.disposer,
            priority: self.priority,
        }
    }
}

impl<T: ?Sized + Dispose + 'static> ComponentBuilder<T> {
    /// Marks instances as needing explicit release through [`Dispose`].
    ///
    /// Only singleton and scoped instances are tracked by a container.
    pub fn disposable(mut self) -> Self {
        self.disposer = Some(Arc::new(|instance: &Instance| {
            if let Some(value) = instance.downcast::<T>() {
                value.dispose();
            }
        }));
        self
    }
}

impl<T: ?Sized + Send + Sync + 'static> From<ComponentBuilder<T>> for ComponentDescriptor {
    fn from(builder: ComponentBuilder<T>) -> Self {
        builder.build()
    }
}
