use import_grapher::graph::filter::Filters;
use import_grapher::graph::resolver::{Manifest, StrategyResolver};
use import_grapher::graph::{GraphOptions, ModuleGraph};
use proptest::prelude::*;
use std::collections::BTreeSet;

const N: usize = 10;

// Module `m{i}` imports `m{j}` for every (i, j) edge; self-imports included.
fn build(edges: &[(usize, usize)]) -> ModuleGraph {
    let mut m = Manifest::default();
    for i in 0..N {
        let deps: Vec<String> =
            edges.iter().filter(|(a, _)| *a == i).map(|(_, b)| format!("m{b}")).collect();
        let refs: Vec<&str> = deps.iter().map(String::as_str).collect();
        m.insert(&format!("m{i}"), &refs, &[]);
    }
    let resolver = StrategyResolver::new(m, None);
    let mut g = ModuleGraph::new(Box::new(resolver), Filters::default(), GraphOptions::default());
    g.add_recursive("m0").unwrap();
    g
}

fn kept(g: &ModuleGraph) -> BTreeSet<String> {
    g.kept_identifiers().into_iter().map(str::to_string).collect()
}

fn edges() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..N, 0..N), 0..40)
}

proptest! {
    #[test]
    fn dependencies_are_sorted_unique_and_never_self(edges in edges()) {
        let g = build(&edges);
        for node in g.nodes() {
            prop_assert!(node.dependencies.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(!node.dependencies.contains(&node.identifier));
        }
    }

    #[test]
    fn second_add_changes_nothing(edges in edges()) {
        let mut g = build(&edges);
        let before = g.to_json().unwrap();
        prop_assert!(!g.add_recursive("m0").unwrap());
        prop_assert_eq!(g.to_json().unwrap(), before);
    }

    #[test]
    fn grow_is_monotonic_and_reaches_a_fixed_point(
        edges in edges(),
        picks in prop::collection::vec(0usize..N, 1..3),
    ) {
        let mut g = build(&edges);
        let ids: Vec<String> = g.identifiers().into_iter().map(str::to_string).collect();
        for p in &picks {
            g.keep(&ids[p % ids.len()]).unwrap();
        }
        let mut prev = kept(&g);
        for _ in 0..N {
            g.grow(1);
            let next = kept(&g);
            prop_assert!(prev.is_subset(&next));
            prev = next;
        }
        // N steps cover any path in an N-module graph.
        g.grow(1);
        prop_assert_eq!(kept(&g), prev);
    }

    #[test]
    fn prune_leaves_a_closed_graph(
        edges in edges(),
        pick in 0usize..N,
        count in 0i64..4,
    ) {
        let mut g = build(&edges);
        let ids: Vec<String> = g.identifiers().into_iter().map(str::to_string).collect();
        g.keep(&ids[pick % ids.len()]).unwrap();
        g.grow(count);
        g.prune();
        prop_assert!(!g.is_empty());
        for node in g.nodes() {
            prop_assert!(node.is_kept);
            for dep in &node.dependencies {
                prop_assert!(g.contains(dep));
            }
        }
    }
}
