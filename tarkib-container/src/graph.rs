//! Dependency cycle detection.
//!
//! Runs while the wiring plan is built, BEFORE any container exists.
//! Nodes are interfaces; every constructor parameter adds an edge from
//! each interface of the component being constructed to the parameter's
//! type (collections unwrapped to their element).
//!
//! Components are processed one at a time. Before a component's edges
//! are added, each parameter type is checked against the reachability
//! recorded so far: if it already reaches one of the component's own
//! interfaces, the new edge would close a cycle and planning fails.
//! Reachability is kept transitively closed as edges are added, so the
//! check is exact for every edge, not only for direct back-references.
//!
//! Factory members are exempt: their construction is a call on an
//! already-built owner, which may legitimately defer circularity.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, trace, warn};

use crate::error::{CyclicDependencyError, Result, TarkibError};
use crate::key::DependencyKey;

/// What the detector needs to know about one component.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// The component's own type (only used for logging)
    pub component: DependencyKey,
    /// Interfaces the component provides
    pub interfaces: Vec<DependencyKey>,
    /// Parameter types its construction needs, collections unwrapped
    pub dependencies: Vec<DependencyKey>,
    /// `true` for factory members
    pub exempt: bool,
}

/// Incremental reachability over interfaces.
#[derive(Debug, Default)]
pub struct CycleDetector {
    /// `reach[n]` is every interface `n` transitively depends on.
    reach: HashMap<DependencyKey, HashSet<DependencyKey>>,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks and records one component.
    ///
    /// # Errors
    /// [`TarkibError::CyclicDependency`] naming the component's interface
    /// and the parameter type that already depends on it.
    pub fn add(&mut self, node: &GraphNode) -> Result<()> {
        if node.exempt {
            trace!(component = %node.component, "Factory member exempt from cycle check");
            return Ok(());
        }

        for dependency in &node.dependencies {
            for interface in &node.interfaces {
                if self.reaches(dependency, interface) {
                    warn!(
                        component = %node.component,
                        dependent = %interface,
                        dependency = %dependency,
                        "Cyclic dependency detected!"
                    );
                    return Err(TarkibError::CyclicDependency(CyclicDependencyError {
                        dependent: *interface,
                        dependency: *dependency,
                    }));
                }
            }
        }

        for dependency in &node.dependencies {
            for interface in &node.interfaces {
                self.add_edge(*interface, *dependency);
            }
        }

        Ok(())
    }

    /// `true` if `from` is `to` or already depends on it.
    pub fn reaches(&self, from: &DependencyKey, to: &DependencyKey) -> bool {
        from == to || self.reach.get(from).is_some_and(|set| set.contains(to))
    }

    fn add_edge(&mut self, from: DependencyKey, to: DependencyKey) {
        let mut gained: HashSet<DependencyKey> = self.reach.get(&to).cloned().unwrap_or_default();
        gained.insert(to);

        // everything that reaches `from` now also reaches what `to` reaches
        let upstream: Vec<DependencyKey> = self
            .reach
            .iter()
            .filter(|(_, set)| set.contains(&from))
            .map(|(node, _)| *node)
            .collect();

        for node in upstream.into_iter().chain(std::iter::once(from)) {
            self.reach.entry(node).or_default().extend(gained.iter().copied());
        }
    }
}

/// Runs the detector over `nodes` in the given order.
#[instrument(skip_all, name = "cycle_detection", fields(components = nodes.len()))]
pub fn detect_cycles(nodes: &[GraphNode]) -> Result<()> {
    let mut detector = CycleDetector::new();
    for node in nodes {
        detector.add(node)?;
    }
    debug!("Dependency graph is acyclic ✓");
    Ok(())
}
