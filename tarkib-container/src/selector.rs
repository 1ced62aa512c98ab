//! Construction path selection.
//!
//! For every descriptor the selector decides how its parameters will be
//! satisfied, given the set of interfaces some component provides:
//!
//! - **Constructors**: the first feasible candidate in declaration order
//!   wins (first fit, not best fit by arity). If none is feasible, the
//!   candidate with the strictly smallest number of missing parameters
//!   is used and its missing parameters are promoted to the container.
//! - **Factory members**: a single fixed path. The owning type must be
//!   available, otherwise planning fails.
//!
//! A parameter counts as missing only if nothing provides its type, it
//! has no default and it is not variadic.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{trace, warn};

use crate::descriptor::{
    ComponentDescriptor, Construction, ConstructorDescriptor, FactoryFn, Parameter, ParameterKind,
};
use crate::error::{Result, TarkibError, UnsatisfiableConstructionError};
use crate::key::DependencyKey;

/// Where one argument comes from at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "key", rename_all = "snake_case")]
pub enum ArgumentSource {
    /// Resolved through the binding of another component.
    Component(DependencyKey),
    /// Resolved through an aggregate binding (a `many` key).
    Collection(DependencyKey),
    /// The value of a configuration flag.
    Flag(String),
    /// Promoted to the container and supplied from outside.
    Seed(DependencyKey),
    /// The resolving container itself.
    Container,
    /// Left out; the factory uses its own default.
    Default,
}

impl ArgumentSource {
    fn for_parameter(parameter: &Parameter, available: &HashSet<DependencyKey>) -> Self {
        if parameter.is_variadic() {
            return ArgumentSource::Default;
        }
        match parameter.kind() {
            ParameterKind::Dependency(key) if available.contains(key) => ArgumentSource::Component(*key),
            ParameterKind::Dependency(_) if parameter.has_default() => ArgumentSource::Default,
            ParameterKind::Dependency(key) => ArgumentSource::Seed(*key),
            ParameterKind::Collection(key) => ArgumentSource::Collection(key.as_many()),
            ParameterKind::Flag(name) => ArgumentSource::Flag(name.clone()),
            ParameterKind::Container => ArgumentSource::Container,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedArgument {
    pub name: &'static str,
    pub source: ArgumentSource,
}

/// A parameter no component can satisfy, hoisted to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PromotedParameter {
    pub name: &'static str,
    pub key: DependencyKey,
}

/// The path chosen for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstructionPath {
    Constructor { index: usize, name: &'static str },
    FactoryMethod { owner: DependencyKey, name: &'static str },
    FactoryProperty { owner: DependencyKey, name: &'static str },
}

impl ConstructionPath {
    pub fn owner(&self) -> Option<DependencyKey> {
        match self {
            ConstructionPath::Constructor { .. } => None,
            ConstructionPath::FactoryMethod { owner, .. } | ConstructionPath::FactoryProperty { owner, .. } => {
                Some(*owner)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConstructionPath::Constructor { name, .. }
            | ConstructionPath::FactoryMethod { name, .. }
            | ConstructionPath::FactoryProperty { name, .. } => name,
        }
    }
}

/// Chosen construction path with every argument mapped to a source.
#[derive(Clone)]
pub struct ConstructorPlan {
    pub path: ConstructionPath,
    pub arguments: Vec<PlannedArgument>,
    pub missing: Vec<PromotedParameter>,
    factory: FactoryFn,
}

impl ConstructorPlan {
    fn from_candidate(path: ConstructionPath, candidate: &ConstructorDescriptor, available: &HashSet<DependencyKey>) -> Self {
        let arguments: Vec<PlannedArgument> = candidate
            .parameters()
            .iter()
            .map(|parameter| PlannedArgument {
                name: parameter.name(),
                source: ArgumentSource::for_parameter(parameter, available),
            })
            .collect();

        let missing = arguments
            .iter()
            .filter_map(|argument| match argument.source {
                ArgumentSource::Seed(key) => Some(PromotedParameter { name: argument.name, key }),
                _ => None,
            })
            .collect();

        Self {
            path,
            arguments,
            missing,
            factory: candidate.factory().clone(),
        }
    }

    /// `true` when nothing had to be promoted.
    pub fn is_feasible(&self) -> bool {
        self.missing.is_empty()
    }

    /// Keys this path resolves through component bindings, collections
    /// unwrapped to their element.
    pub fn dependencies(&self) -> impl Iterator<Item = DependencyKey> + '_ {
        self.arguments.iter().filter_map(|argument| match argument.source {
            ArgumentSource::Component(key) => Some(key),
            ArgumentSource::Collection(key) => Some(key.element()),
            _ => None,
        })
    }

    /// Collection keys this path consumes.
    pub fn collections(&self) -> impl Iterator<Item = DependencyKey> + '_ {
        self.arguments.iter().filter_map(|argument| match argument.source {
            ArgumentSource::Collection(key) => Some(key),
            _ => None,
        })
    }

    pub(crate) fn factory(&self) -> &FactoryFn {
        &self.factory
    }
}

impl fmt::Debug for ConstructorPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorPlan")
            .field("path", &self.path)
            .field("arguments", &self.arguments)
            .field("missing", &self.missing)
            .finish()
    }
}

/// Picks the construction path for `descriptor`.
///
/// # Errors
/// [`TarkibError::UnsatisfiableConstruction`] when the descriptor has no
/// constructor at all, or when a factory member's owner is not provided
/// by any component.
pub fn select_construction(
    descriptor: &ComponentDescriptor,
    available: &HashSet<DependencyKey>,
) -> Result<ConstructorPlan> {
    match descriptor.construction() {
        Construction::Constructor(candidates) => select_constructor(descriptor, candidates, available),
        Construction::FactoryMethod { owner, method } => {
            require_owner(descriptor, *owner, available)?;
            let path = ConstructionPath::FactoryMethod {
                owner: *owner,
                name: method.name(),
            };
            Ok(ConstructorPlan::from_candidate(path, method, available))
        }
        Construction::FactoryProperty { owner, property } => {
            require_owner(descriptor, *owner, available)?;
            let path = ConstructionPath::FactoryProperty {
                owner: *owner,
                name: property.name(),
            };
            Ok(ConstructorPlan::from_candidate(path, property, available))
        }
    }
}

fn select_constructor(
    descriptor: &ComponentDescriptor,
    candidates: &[ConstructorDescriptor],
    available: &HashSet<DependencyKey>,
) -> Result<ConstructorPlan> {
    let mut best: Option<ConstructorPlan> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let path = ConstructionPath::Constructor {
            index,
            name: candidate.name(),
        };
        let plan = ConstructorPlan::from_candidate(path, candidate, available);

        if plan.is_feasible() {
            trace!(component = %descriptor.key(), constructor = candidate.name(), "Feasible constructor");
            return Ok(plan);
        }

        // strictly smaller wins; ties keep the earlier candidate
        let better = best
            .as_ref()
            .is_none_or(|current| plan.missing.len() < current.missing.len());
        if better {
            best = Some(plan);
        }
    }

    match best {
        Some(plan) => {
            trace!(
                component = %descriptor.key(),
                constructor = plan.path.name(),
                missing = plan.missing.len(),
                "No feasible constructor, promoting missing parameters"
            );
            Ok(plan)
        }
        None => {
            warn!(component = %descriptor.key(), "Component declares no constructor");
            Err(TarkibError::UnsatisfiableConstruction(UnsatisfiableConstructionError {
                component: descriptor.key(),
                owner: None,
                reason: "no constructor is declared".to_string(),
            }))
        }
    }
}

fn require_owner(
    descriptor: &ComponentDescriptor,
    owner: DependencyKey,
    available: &HashSet<DependencyKey>,
) -> Result<()> {
    if available.contains(&owner) {
        return Ok(());
    }
    warn!(component = %descriptor.key(), owner = %owner, "Factory member owner is not provided");
    Err(TarkibError::UnsatisfiableConstruction(UnsatisfiableConstructionError {
        component: descriptor.key(),
        owner: Some(owner),
        reason: format!("owning type {} is not provided by any component", owner.short_name()),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::descriptor::Constructor;

    struct Db;
    struct Cache;
    struct Clock;
    struct Service;

    fn available(keys: &[DependencyKey]) -> HashSet<DependencyKey> {
        keys.iter().copied().collect()
    }

    fn service(constructors: Vec<Constructor>) -> ComponentDescriptor {
        let mut builder = ComponentDescriptor::constructed::<Service>();
        for constructor in constructors {
            builder = builder.constructor(constructor, |_| Ok(Arc::new(Service)));
        }
        builder.build()
    }

    #[test]
    fn first_feasible_wins_over_larger_feasible() {
        let descriptor = service(vec![
            Constructor::new("needs_clock").param(Parameter::of::<Clock>("clock")),
            Constructor::new("db_only").param(Parameter::of::<Db>("db")),
            Constructor::new("db_and_cache")
                .param(Parameter::of::<Db>("db"))
                .param(Parameter::of::<Cache>("cache")),
        ]);

        let plan = select_construction(
            &descriptor,
            &available(&[DependencyKey::of::<Db>(), DependencyKey::of::<Cache>()]),
        )
        .unwrap();

        assert_eq!(plan.path.name(), "db_only");
        assert!(plan.is_feasible());
    }

    #[test]
    fn fewest_missing_when_none_feasible() {
        let descriptor = service(vec![
            Constructor::new("two_missing")
                .param(Parameter::of::<Clock>("clock"))
                .param(Parameter::of::<Cache>("cache")),
            Constructor::new("one_missing").param(Parameter::of::<Clock>("clock")),
            Constructor::new("also_one").param(Parameter::of::<Cache>("cache")),
        ]);

        let plan = select_construction(&descriptor, &available(&[])).unwrap();

        assert_eq!(plan.path.name(), "one_missing");
        assert_eq!(
            plan.missing,
            vec![PromotedParameter {
                name: "clock",
                key: DependencyKey::of::<Clock>()
            }]
        );
    }

    #[test]
    fn defaults_and_variadics_are_never_missing() {
        let descriptor = service(vec![
            Constructor::new("new")
                .param(Parameter::of::<Clock>("clock").with_default())
                .param(Parameter::of::<Db>("db").with_default())
                .param(Parameter::of::<Cache>("rest").variadic()),
        ]);

        let plan = select_construction(&descriptor, &available(&[DependencyKey::of::<Db>()])).unwrap();

        assert!(plan.is_feasible());
        let sources: Vec<_> = plan.arguments.iter().map(|a| a.source.clone()).collect();
        assert_eq!(
            sources,
            vec![
                ArgumentSource::Default,
                ArgumentSource::Component(DependencyKey::of::<Db>()),
                ArgumentSource::Default,
            ]
        );
    }

    #[test]
    fn literals_and_collections_are_always_satisfiable() {
        let descriptor = service(vec![
            Constructor::new("new")
                .param(Parameter::flag("Verbose"))
                .param(Parameter::container("container"))
                .param(Parameter::many::<Cache>("caches")),
        ]);

        let plan = select_construction(&descriptor, &available(&[])).unwrap();

        assert!(plan.is_feasible());
        assert_eq!(plan.collections().collect::<Vec<_>>(), vec![DependencyKey::many::<Cache>()]);
        assert_eq!(plan.dependencies().collect::<Vec<_>>(), vec![DependencyKey::of::<Cache>()]);
    }

    #[test]
    fn no_constructor_is_unsatisfiable() {
        let descriptor = ComponentDescriptor::constructed::<Service>().build();
        match select_construction(&descriptor, &available(&[])) {
            Err(TarkibError::UnsatisfiableConstruction(err)) => assert!(err.owner.is_none()),
            other => panic!("Expected UnsatisfiableConstruction, got: {other:?}"),
        }
    }

    #[test]
    fn factory_member_requires_owner() {
        let descriptor = ComponentDescriptor::factory_property::<Cache, Db>("cache", |_| Arc::new(Cache)).build();

        match select_construction(&descriptor, &available(&[])) {
            Err(TarkibError::UnsatisfiableConstruction(err)) => {
                assert_eq!(err.owner, Some(DependencyKey::of::<Db>()));
            }
            other => panic!("Expected UnsatisfiableConstruction, got: {other:?}"),
        }

        let plan = select_construction(&descriptor, &available(&[DependencyKey::of::<Db>()])).unwrap();
        assert_eq!(plan.path.owner(), Some(DependencyKey::of::<Db>()));
    }

    #[test]
    fn factory_method_parameters_are_mapped() {
        let descriptor = ComponentDescriptor::factory_method::<Cache, Db>(
            Constructor::new("open_cache").param(Parameter::of::<Clock>("clock")),
            |_, _| Ok(Arc::new(Cache)),
        )
        .build();

        let plan = select_construction(&descriptor, &available(&[DependencyKey::of::<Db>()])).unwrap();
        assert_eq!(plan.missing.len(), 1);
        assert_eq!(plan.missing[0].key, DependencyKey::of::<Clock>());
    }
}
