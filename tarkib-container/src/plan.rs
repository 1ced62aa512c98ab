//! The wiring plan: a validated, immutable description of the graph.
//!
//! Building a plan runs the whole pipeline once:
//!
//! ```text
//! descriptors → priority order → construction selection
//!             → binding resolution → cycle detection → WiringPlan
//! ```
//!
//! Any failure aborts the build; no partial plan is ever produced.
//! Containers are created from a plan and never mutate it.

use std::collections::HashSet;

use serde::Serialize;
use tarkib_support::rendering::shorten_type_name;
use tracing::{debug, info, instrument};

use crate::binding::{BindingTable, ComponentId, InterfaceBinding, priority_order, resolve_bindings};
use crate::container::{Container, ContainerBuilder};
use crate::descriptor::{ComponentDescriptor, Condition, Construction, ConstructionKind, ParameterKind, Priority};
use crate::error::Result;
use crate::graph::{GraphNode, detect_cycles};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::registry::ComponentRegistry;
use crate::selector::{ConstructionPath, ConstructorPlan, PlannedArgument, PromotedParameter, select_construction};

/// A descriptor together with its chosen construction path.
#[derive(Debug, Clone)]
pub struct PlannedComponent {
    descriptor: ComponentDescriptor,
    construction: ConstructorPlan,
}

impl PlannedComponent {
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    pub fn construction(&self) -> &ConstructorPlan {
        &self.construction
    }

    pub fn key(&self) -> DependencyKey {
        self.descriptor.key()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.descriptor.lifetime()
    }
}

/// Validated wiring of every registered component.
#[derive(Debug, Clone)]
pub struct WiringPlan {
    components: Vec<PlannedComponent>,
    order: Vec<ComponentId>,
    bindings: BindingTable,
    promoted: Vec<PromotedParameter>,
    declared_flags: Vec<String>,
}

impl WiringPlan {
    /// Runs selection, binding resolution and cycle detection.
    #[instrument(skip_all, name = "wiring_plan", fields(components = registry.len()))]
    pub fn build(registry: &ComponentRegistry) -> Result<Self> {
        info!("Building wiring plan");

        let descriptors = registry.descriptors();
        let order = priority_order(descriptors, registry.settings().override_marker.as_deref());
        let available = registry.available_interfaces();

        let mut constructions: Vec<Option<ConstructorPlan>> = vec![None; descriptors.len()];
        for &id in &order {
            constructions[id] = Some(select_construction(&descriptors[id], &available)?);
        }

        let components: Vec<PlannedComponent> = descriptors
            .iter()
            .cloned()
            .zip(constructions)
            .filter_map(|(descriptor, construction)| {
                construction.map(|construction| PlannedComponent {
                    descriptor,
                    construction,
                })
            })
            .collect();

        let mut collections: Vec<DependencyKey> = registry.requested_collections().to_vec();
        for &id in &order {
            for collection in components[id].construction.collections() {
                if !collections.contains(&collection) {
                    collections.push(collection);
                }
            }
        }

        let bindings = resolve_bindings(descriptors, &order, &collections);

        let nodes: Vec<GraphNode> = order
            .iter()
            .map(|&id| {
                let component = &components[id];
                GraphNode {
                    component: component.key(),
                    interfaces: component.descriptor.interfaces().collect(),
                    dependencies: component.construction.dependencies().collect(),
                    exempt: component.descriptor.construction_kind() != ConstructionKind::Constructor,
                }
            })
            .collect();
        detect_cycles(&nodes)?;

        let promoted = collect_promoted(&components, &order);
        let declared_flags = collect_flags(&components);

        info!(
            components = components.len(),
            bindings = bindings.len(),
            promoted = promoted.len(),
            flags = declared_flags.len(),
            "Wiring plan built ✓"
        );

        Ok(Self {
            components,
            order,
            bindings,
            promoted,
            declared_flags,
        })
    }

    /// Components in registration order; the index is the [`ComponentId`].
    pub fn components(&self) -> &[PlannedComponent] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&PlannedComponent> {
        self.components.get(id)
    }

    /// Component ids in priority order.
    pub fn priority_order(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn binding(&self, key: &DependencyKey) -> Option<&InterfaceBinding> {
        self.bindings.get(key)
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Parameters no component satisfies, sorted by type name.
    pub fn promoted_parameters(&self) -> &[PromotedParameter] {
        &self.promoted
    }

    pub fn is_promoted(&self, key: &DependencyKey) -> bool {
        self.promoted.iter().any(|parameter| parameter.key == *key)
    }

    /// Every flag name a condition or flag parameter mentions, sorted.
    pub fn declared_flags(&self) -> &[String] {
        &self.declared_flags
    }

    /// Starts a container over this plan.
    pub fn container(self) -> ContainerBuilder {
        Container::builder(self)
    }

    pub fn summary(&self) -> PlanSummary {
        let descriptors: Vec<ComponentDescriptor> =
            self.components.iter().map(|c| c.descriptor.clone()).collect();

        let components = self
            .components
            .iter()
            .map(|component| {
                let descriptor = &component.descriptor;
                ComponentSummary {
                    component: shorten_type_name(descriptor.type_name()),
                    interfaces: descriptor.interfaces().map(|key| key.short_name()).collect(),
                    lifetime: descriptor.lifetime(),
                    condition: descriptor.condition().cloned(),
                    priority: descriptor.priority(),
                    disposable: descriptor.is_disposable(),
                    construction: component.construction.path.clone(),
                    arguments: component.construction.arguments.clone(),
                }
            })
            .collect();

        let mut bindings: Vec<BindingSummary> = self
            .bindings
            .iter()
            .map(|(key, binding)| BindingSummary {
                interface: key.short_name(),
                strategy: match binding {
                    InterfaceBinding::Single { .. } => BindingStrategy::Single,
                    InterfaceBinding::Conditional { .. } => BindingStrategy::Conditional,
                    InterfaceBinding::Aggregate { .. } => BindingStrategy::Aggregate,
                },
                resolves_to: binding.render(&descriptors),
            })
            .collect();
        bindings.sort_by(|a, b| a.interface.cmp(&b.interface));

        PlanSummary {
            components,
            bindings,
            promoted_parameters: self.promoted.clone(),
            flags: self.declared_flags.clone(),
        }
    }
}

fn collect_promoted(components: &[PlannedComponent], order: &[ComponentId]) -> Vec<PromotedParameter> {
    let mut seen = HashSet::new();
    let mut promoted: Vec<PromotedParameter> = order
        .iter()
        .flat_map(|&id| components[id].construction.missing.iter().copied())
        .filter(|parameter| seen.insert((parameter.key, parameter.name)))
        .collect();
    promoted.sort_by(|a, b| a.key.type_name().cmp(b.key.type_name()));

    for parameter in &promoted {
        debug!(parameter = parameter.name, key = %parameter.key, "Promoted to container parameter");
    }
    promoted
}

fn collect_flags(components: &[PlannedComponent]) -> Vec<String> {
    let mut flags: Vec<String> = Vec::new();
    for component in components {
        if let Some(condition) = component.descriptor.condition() {
            flags.push(condition.flag.clone());
        }
        let parameters = match component.descriptor.construction() {
            Construction::Constructor(candidates) => {
                let ConstructionPath::Constructor { index, .. } = component.construction.path else {
                    continue;
                };
                candidates.get(index).map(|c| c.parameters()).unwrap_or_default()
            }
            Construction::FactoryMethod { method, .. } => method.parameters(),
            Construction::FactoryProperty { property, .. } => property.parameters(),
        };
        for parameter in parameters {
            if let ParameterKind::Flag(name) = parameter.kind() {
                flags.push(name.clone());
            }
        }
    }
    flags.sort();
    flags.dedup();
    flags
}

/// Serializable overview of a plan, for diagnostics or code emission.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub components: Vec<ComponentSummary>,
    pub bindings: Vec<BindingSummary>,
    pub promoted_parameters: Vec<PromotedParameter>,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentSummary {
    pub component: String,
    pub interfaces: Vec<String>,
    pub lifetime: Lifetime,
    pub condition: Option<Condition>,
    pub priority: Priority,
    pub disposable: bool,
    pub construction: ConstructionPath,
    pub arguments: Vec<PlannedArgument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStrategy {
    Single,
    Conditional,
    Aggregate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BindingSummary {
    pub interface: String,
    pub strategy: BindingStrategy,
    /// e.g. `Beta ? FastCodec : PlainCodec`
    pub resolves_to: String,
}
