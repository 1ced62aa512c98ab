//! Property-based tests for cycle detection and binding priority.

use std::sync::Arc;

use proptest::prelude::*;
use tarkib::graph::{GraphNode, detect_cycles};
use tarkib::prelude::*;

const NODES: usize = 8;

struct N<const I: usize>;

fn key<const I: usize>() -> DependencyKey {
    DependencyKey::of::<N<I>>()
}

fn keys() -> [DependencyKey; NODES] {
    [
        key::<0>(),
        key::<1>(),
        key::<2>(),
        key::<3>(),
        key::<4>(),
        key::<5>(),
        key::<6>(),
        key::<7>(),
    ]
}

/// `edges[i * NODES + j]` set and `i > j` means node `i` depends on `j`.
fn dag_nodes(edges: &[bool], extra: &[(usize, usize)], order: &[usize]) -> Vec<GraphNode> {
    let keys = keys();
    order
        .iter()
        .map(|&i| {
            let mut dependencies: Vec<DependencyKey> = (0..i).filter(|&j| edges[i * NODES + j]).map(|j| keys[j]).collect();
            dependencies.extend(extra.iter().filter(|(from, _)| *from == i).map(|(_, to)| keys[*to]));
            GraphNode {
                component: keys[i],
                interfaces: vec![keys[i]],
                dependencies,
                exempt: false,
            }
        })
        .collect()
}

fn node_order() -> impl Strategy<Value = Vec<usize>> {
    Just((0..NODES).collect::<Vec<_>>()).prop_shuffle()
}

proptest! {
    /// Edges only point to lower indices, so no processing order can
    /// produce a cycle report.
    #[test]
    fn prop_random_dag_is_accepted(
        edges in prop::collection::vec(any::<bool>(), NODES * NODES),
        order in node_order(),
    ) {
        let nodes = dag_nodes(&edges, &[], &order);
        prop_assert!(detect_cycles(&nodes).is_ok());
    }

    /// A path `high → … → low` closed by `low → high` is always reported,
    /// whatever order the nodes arrive in.
    #[test]
    fn prop_back_edge_is_detected(
        edges in prop::collection::vec(any::<bool>(), NODES * NODES),
        order in node_order(),
        (high, low) in (1..NODES).prop_flat_map(|high| (Just(high), 0..high)),
    ) {
        let nodes = dag_nodes(&edges, &[(high, low), (low, high)], &order);
        prop_assert!(
            matches!(detect_cycles(&nodes), Err(TarkibError::CyclicDependency(_))),
            "cycle {} <-> {} not reported", high, low
        );
    }

    /// Factory members never trigger the check, even inside a cycle.
    #[test]
    fn prop_exempt_nodes_never_fail(order in node_order()) {
        let keys = keys();
        let nodes: Vec<GraphNode> = order
            .iter()
            .map(|&i| GraphNode {
                component: keys[i],
                interfaces: vec![keys[i]],
                dependencies: vec![keys[(i + 1) % NODES]],
                exempt: true,
            })
            .collect();
        prop_assert!(detect_cycles(&nodes).is_ok());
    }
}

// ═══════════════════════════════════════════
// Last one wins
// ═══════════════════════════════════════════

trait Ranked: Send + Sync {
    fn rank(&self) -> usize;
}

struct Impl<const I: usize>;

impl<const I: usize> Ranked for Impl<I> {
    fn rank(&self) -> usize {
        I
    }
}

fn ranked<const I: usize>(overriding: bool) -> ComponentDescriptor {
    let builder = ComponentDescriptor::constructed::<Impl<I>>()
        .implements::<dyn Ranked>(|r| r)
        .default_constructor(|_| Ok(Arc::new(Impl::<I>)));
    if overriding { builder.overriding().build() } else { builder.build() }
}

const RANKED: [fn(bool) -> ComponentDescriptor; 6] = [
    ranked::<0>,
    ranked::<1>,
    ranked::<2>,
    ranked::<3>,
    ranked::<4>,
    ranked::<5>,
];

proptest! {
    #[test]
    fn prop_last_registered_implementation_wins(
        order in Just((0..RANKED.len()).collect::<Vec<_>>()).prop_shuffle(),
        count in 1..=RANKED.len(),
    ) {
        let chosen = &order[..count];
        let mut registry = ComponentRegistry::new();
        for &i in chosen {
            registry.register(RANKED[i](false));
        }
        let container = registry.plan().unwrap().container().build().unwrap();

        prop_assert_eq!(container.resolve::<dyn Ranked>().unwrap().rank(), chosen[count - 1]);
    }

    #[test]
    fn prop_override_wins_regardless_of_position(
        order in Just((0..RANKED.len()).collect::<Vec<_>>()).prop_shuffle(),
        position in 0..RANKED.len(),
    ) {
        let mut registry = ComponentRegistry::new();
        for (at, &i) in order.iter().enumerate() {
            registry.register(RANKED[i](at == position));
        }
        let container = registry.plan().unwrap().container().build().unwrap();

        prop_assert_eq!(container.resolve::<dyn Ranked>().unwrap().rank(), order[position]);
    }
}
