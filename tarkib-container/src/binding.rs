//! Interface binding resolution.
//!
//! Maps every interface to the implementation that satisfies it. The
//! rule is "last one wins" over the priority order:
//!
//! 1. Components in registration order, so later registrations win.
//! 2. Components with [`Priority::Override`] (or whose type name matches
//!    the configured override marker) are moved to the end, keeping
//!    their relative order.
//!
//! An interface claimed only by unconditional components gets a
//! [`InterfaceBinding::Single`]. As soon as one claimant carries a flag
//! condition, it gets a right-associative [`InterfaceBinding::Conditional`]
//! chain ending in the unconditional fallback, if any. Every interface
//! consumed as a collection additionally gets an
//! [`InterfaceBinding::Aggregate`] under its `many` key.

use std::collections::{HashMap, HashSet};

use tarkib_support::rendering::{render_conditional, render_members, shorten_type_name};
use tracing::{debug, trace};

use crate::descriptor::{ComponentDescriptor, Condition, Priority};
use crate::flags::Flags;
use crate::key::DependencyKey;

/// Index of a component in registration order.
pub type ComponentId = usize;

/// One flag test in a conditional chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalBranch {
    pub flag: String,
    /// Chosen when the flag is `true`; `None` moves on to the next branch.
    pub when_true: Option<ComponentId>,
    /// Chosen when the flag is `false`; `None` moves on to the next branch.
    pub when_false: Option<ComponentId>,
}

/// A guarded entry of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateMember {
    pub component: ComponentId,
    pub guard: Option<Condition>,
}

impl AggregateMember {
    pub fn is_included(&self, flags: &Flags) -> bool {
        match &self.guard {
            None => true,
            Some(condition) => flags.is_enabled(&condition.flag) == condition.value,
        }
    }
}

/// Resolved strategy for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceBinding {
    Single {
        component: ComponentId,
    },
    Conditional {
        branches: Vec<ConditionalBranch>,
        fallback: Option<ComponentId>,
    },
    Aggregate {
        members: Vec<AggregateMember>,
    },
}

impl InterfaceBinding {
    /// Component chosen for the given flags.
    ///
    /// `None` means "present type, absent instance" for conditional
    /// bindings. Aggregates never select a single component.
    pub fn select(&self, flags: &Flags) -> Option<ComponentId> {
        match self {
            InterfaceBinding::Single { component } => Some(*component),
            InterfaceBinding::Conditional { branches, fallback } => {
                for branch in branches {
                    let chosen = if flags.is_enabled(&branch.flag) {
                        branch.when_true
                    } else {
                        branch.when_false
                    };
                    if chosen.is_some() {
                        return chosen;
                    }
                }
                *fallback
            }
            InterfaceBinding::Aggregate { .. } => None,
        }
    }

    /// Aggregate members that are included under the given flags.
    pub fn members(&self, flags: &Flags) -> Vec<ComponentId> {
        match self {
            InterfaceBinding::Aggregate { members } => members
                .iter()
                .filter(|member| member.is_included(flags))
                .map(|member| member.component)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, InterfaceBinding::Aggregate { .. })
    }

    /// Human-readable form, e.g. `Beta ? FastCodec : PlainCodec`.
    pub fn render(&self, descriptors: &[ComponentDescriptor]) -> String {
        let name = |id: &ComponentId| {
            descriptors
                .get(*id)
                .map(|d| shorten_type_name(d.type_name()))
                .unwrap_or_else(|| format!("#{id}"))
        };

        match self {
            InterfaceBinding::Single { component } => name(component),
            InterfaceBinding::Conditional { branches, fallback } => {
                let mut rendered: Vec<(String, Option<String>)> = Vec::new();
                for branch in branches {
                    if let Some(id) = &branch.when_true {
                        rendered.push((branch.flag.clone(), Some(name(id))));
                    }
                    if let Some(id) = &branch.when_false {
                        rendered.push((format!("!{}", branch.flag), Some(name(id))));
                    }
                }
                let pairs: Vec<(&str, Option<&str>)> = rendered
                    .iter()
                    .map(|(flag, chosen)| (flag.as_str(), chosen.as_deref()))
                    .collect();
                let fallback = fallback.as_ref().map(name);
                render_conditional(&pairs, fallback.as_deref())
            }
            InterfaceBinding::Aggregate { members } => {
                let rendered: Vec<(String, Option<String>)> = members
                    .iter()
                    .map(|member| {
                        let guard = member.guard.as_ref().map(|condition| {
                            if condition.value {
                                condition.flag.clone()
                            } else {
                                format!("!{}", condition.flag)
                            }
                        });
                        (name(&member.component), guard)
                    })
                    .collect();
                let pairs: Vec<(&str, Option<&str>)> = rendered
                    .iter()
                    .map(|(member, guard)| (member.as_str(), guard.as_deref()))
                    .collect();
                render_members(&pairs)
            }
        }
    }
}

/// Interface → binding lookup produced by [`resolve_bindings`].
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: HashMap<DependencyKey, InterfaceBinding>,
}

impl BindingTable {
    pub fn get(&self, key: &DependencyKey) -> Option<&InterfaceBinding> {
        self.bindings.get(key)
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &DependencyKey> {
        self.bindings.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DependencyKey, &InterfaceBinding)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Effective rank of a descriptor, honoring the legacy name marker.
pub fn effective_priority(descriptor: &ComponentDescriptor, override_marker: Option<&str>) -> Priority {
    let marked = override_marker.is_some_and(|marker| !marker.is_empty() && descriptor.type_name().contains(marker));
    if marked {
        Priority::Override
    } else {
        descriptor.priority()
    }
}

/// Component ids in priority order: the last entry wins ties.
pub fn priority_order(descriptors: &[ComponentDescriptor], override_marker: Option<&str>) -> Vec<ComponentId> {
    let mut order: Vec<ComponentId> = (0..descriptors.len()).collect();
    // stable: overrides keep their relative order at the end
    order.sort_by_key(|&id| effective_priority(&descriptors[id], override_marker));
    order
}

/// Builds every interface binding from descriptors already in priority
/// order, plus the collection keys consumed anywhere.
pub fn resolve_bindings(
    descriptors: &[ComponentDescriptor],
    order: &[ComponentId],
    collections: &[DependencyKey],
) -> BindingTable {
    let mut claimants: HashMap<DependencyKey, Vec<ComponentId>> = HashMap::new();
    let mut interfaces: Vec<DependencyKey> = Vec::new();

    for &id in order {
        for interface in descriptors[id].interfaces() {
            let entry = claimants.entry(interface).or_default();
            if entry.is_empty() {
                interfaces.push(interface);
            }
            entry.push(id);
        }
    }

    let mut bindings = HashMap::with_capacity(interfaces.len() + collections.len());

    for interface in interfaces {
        let possibilities = &claimants[&interface];
        let binding = single_or_conditional(descriptors, possibilities);
        trace!(interface = %interface, binding = %binding.render(descriptors), "Resolved binding");
        bindings.insert(interface, binding);
    }

    let mut seen = HashSet::new();
    for &collection in collections {
        let collection = collection.as_many();
        if !seen.insert(collection) {
            continue;
        }
        let possibilities = claimants
            .get(&collection.element())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let binding = aggregate(descriptors, possibilities);
        trace!(interface = %collection, binding = %binding.render(descriptors), "Resolved aggregate");
        bindings.insert(collection, binding);
    }

    debug!(bindings = bindings.len(), "Interface bindings resolved");
    BindingTable { bindings }
}

fn single_or_conditional(descriptors: &[ComponentDescriptor], possibilities: &[ComponentId]) -> InterfaceBinding {
    let condition_of = |id: &ComponentId| descriptors[*id].condition();

    let fallback = possibilities.iter().rev().find(|id| condition_of(id).is_none()).copied();

    if possibilities.iter().all(|id| condition_of(id).is_none()) {
        if let Some(&component) = possibilities.last() {
            return InterfaceBinding::Single { component };
        }
    }

    // distinct flags in first-seen order, then reversed
    let mut flags: Vec<&str> = Vec::new();
    for id in possibilities {
        if let Some(condition) = condition_of(id) {
            if !flags.contains(&condition.flag.as_str()) {
                flags.push(condition.flag.as_str());
            }
        }
    }
    flags.reverse();

    let last_matching = |flag: &str, value: bool| {
        possibilities
            .iter()
            .rev()
            .find(|id| condition_of(id).is_some_and(|c| c.flag == flag && c.value == value))
            .copied()
    };

    let branches = flags
        .into_iter()
        .map(|flag| ConditionalBranch {
            flag: flag.to_string(),
            when_true: last_matching(flag, true),
            when_false: last_matching(flag, false),
        })
        .collect();

    InterfaceBinding::Conditional { branches, fallback }
}

fn aggregate(descriptors: &[ComponentDescriptor], possibilities: &[ComponentId]) -> InterfaceBinding {
    let unconditional = possibilities
        .iter()
        .filter(|id| descriptors[**id].condition().is_none())
        .map(|&component| AggregateMember { component, guard: None });
    let guarded = possibilities.iter().filter_map(|&component| {
        descriptors[component].condition().map(|condition| AggregateMember {
            component,
            guard: Some(condition.clone()),
        })
    });

    InterfaceBinding::Aggregate {
        members: unconditional.chain(guarded).collect(),
    }
}
