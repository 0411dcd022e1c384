use import_grapher::errors::ImportGrapherError;
use import_grapher::graph::filter::Filters;
use import_grapher::graph::resolver::{Manifest, StrategyResolver};
use import_grapher::graph::{GraphOptions, ModuleGraph};

fn graph_with(manifest: Manifest, filters: Filters, options: GraphOptions) -> ModuleGraph {
    let resolver = StrategyResolver::new(manifest, filters.boundary());
    ModuleGraph::new(Box::new(resolver), filters, options)
}

fn graph(manifest: Manifest) -> ModuleGraph {
    graph_with(manifest, Filters::default(), GraphOptions::default())
}

fn proj_manifest() -> Manifest {
    Manifest::default()
        .with("github.com/x/proj/cmd", &["github.com/x/proj/lib", "fmt"])
        .with("github.com/x/proj/lib", &[])
        .with("fmt", &[])
}

#[test]
fn cycle_terminates_with_one_edge_each() {
    let m = Manifest::default().with("app", &["lib/a"]).with("lib/a", &["app"]);
    let mut g = graph(m);
    assert!(g.add_recursive("app").unwrap());
    assert_eq!(g.len(), 2);
    assert_eq!(g.get("app").unwrap().dependencies, vec!["lib/a"]);
    assert_eq!(g.get("lib/a").unwrap().dependencies, vec!["app"]);
}

#[test]
fn boundary_excludes_external_imports() {
    let filters = Filters::new(None, Some("github.com/x/proj"), false).unwrap();
    let mut g = graph_with(proj_manifest(), filters, GraphOptions::default());
    g.add_recursive("github.com/x/proj/cmd").unwrap();

    assert_eq!(g.identifiers(), vec!["github.com/x/proj/cmd", "github.com/x/proj/lib"]);
    assert!(!g.contains("fmt"));
    let cmd = g.get("github.com/x/proj/cmd").unwrap();
    assert_eq!(cmd.dependencies, vec!["github.com/x/proj/lib"]);
    assert_eq!(cmd.display_name, "cmd");
}

#[test]
fn externals_flag_admits_outside_boundary() {
    let filters = Filters::new(None, Some("github.com/x/proj"), true).unwrap();
    let mut g = graph_with(proj_manifest(), filters, GraphOptions::default());
    g.add_recursive("github.com/x/proj/cmd").unwrap();
    assert!(g.contains("fmt"));
    assert_eq!(g.get("fmt").unwrap().display_name, "fmt");
}

#[test]
fn filter_pattern_applies_to_edges_not_roots() {
    let m = proj_manifest().with(
        "github.com/x/proj/cmd",
        &["github.com/x/proj/lib", "github.com/x/proj/util", "fmt"],
    );
    let filters = Filters::new(Some("^github.com/x/proj/lib"), Some("github.com/x/proj"), false)
        .unwrap();
    let mut g = graph_with(m, filters, GraphOptions::default());
    assert!(g.add_recursive("github.com/x/proj/cmd").unwrap());

    let cmd = g.get("github.com/x/proj/cmd").unwrap();
    assert!(cmd.is_root);
    assert_eq!(cmd.dependencies, vec!["github.com/x/proj/lib"]);
    assert!(!g.contains("github.com/x/proj/util"));
    assert_eq!(g.stats().broken, 0);
}

#[test]
fn keep_grow_prune_leaves_one_hop_neighborhood() {
    let m = Manifest::default()
        .with("app", &["lib/api"])
        .with("other", &["lib/core"])
        .with("lib/api", &["lib/core"])
        .with("lib/core", &["lib/util"])
        .with("lib/util", &["lib/deep"])
        .with("lib/deep", &[]);
    let mut g = graph(m);
    g.add_recursive("app").unwrap();
    g.add_recursive("other").unwrap();
    assert_eq!(g.len(), 6);

    g.keep("lib/core").unwrap();
    g.grow(1);
    g.prune();

    assert_eq!(g.identifiers(), vec!["lib/api", "lib/core", "lib/util", "other"]);
    assert!(!g.contains("app"));
    assert!(!g.contains("lib/deep"));
    // Edges to pruned modules are gone.
    assert!(g.get("lib/util").unwrap().dependencies.is_empty());
    assert_eq!(g.get("lib/api").unwrap().dependencies, vec!["lib/core"]);
    assert!(g.get("lib/core").unwrap().is_user_kept);
    assert!(!g.get("lib/api").unwrap().is_user_kept);
}

#[test]
fn broken_dependency_is_counted() {
    let m = Manifest::default().with("app", &["broken/pkg"]);
    let mut g = graph(m);
    g.add_recursive("app").unwrap();

    let broken = g.get("broken/pkg").unwrap();
    assert!(broken.is_broken);
    assert!(broken.dependencies.is_empty());

    let stats = g.stats();
    assert_eq!(stats.modules, 2);
    assert_eq!(stats.broken, 1);
    assert_eq!(stats.roots, 1);
    assert_eq!(stats.single_parent, 1);
    assert_eq!(stats.edges, 1);
}

#[test]
fn adding_twice_is_a_no_op() {
    let m = Manifest::default().with("a", &["b"]).with("b", &[]);
    let mut g = graph(m);
    assert!(g.add_recursive("a").unwrap());
    let before = g.identifiers().len();
    assert!(!g.add_recursive("a").unwrap());
    assert!(!g.add("b").unwrap());
    assert_eq!(g.len(), before);
    // Named later by the caller: flagged as a root, not resolved again.
    assert!(g.get("b").unwrap().is_root);
    assert_eq!(g.get("b").unwrap().dependencies, Vec::<String>::new());
    let snapshot = g.to_json().unwrap();
    assert!(!g.add_recursive("b").unwrap());
    assert_eq!(g.to_json().unwrap(), snapshot);
}

#[test]
fn root_flags_do_not_depend_on_argument_order() {
    let m = Manifest::default().with("a", &["b"]).with("b", &["c"]).with("c", &[]);

    let mut forward = graph(m.clone());
    forward.add_recursive("a").unwrap();
    forward.add_recursive("b").unwrap();

    let mut backward = graph(m);
    backward.add_recursive("b").unwrap();
    backward.add_recursive("a").unwrap();

    assert_eq!(forward.to_json().unwrap(), backward.to_json().unwrap());
    assert_eq!(forward.stats(), backward.stats());
    assert_eq!(forward.stats().roots, 2);
    assert!(!forward.get("c").unwrap().is_root);
}

#[test]
fn root_named_under_boundary_shares_its_node() {
    let m = Manifest::default()
        .with("github.com/x/proj/cmd", &["github.com/x/proj/lib"])
        .with("github.com/x/proj/lib", &["github.com/x/proj/cmd"]);
    let filters = Filters::new(None, Some("github.com/x/proj"), false).unwrap();
    let mut g = graph_with(m, filters, GraphOptions::default());

    assert!(g.add_recursive("cmd").unwrap());
    assert_eq!(g.identifiers(), vec!["github.com/x/proj/cmd", "github.com/x/proj/lib"]);
    let cmd = g.get("github.com/x/proj/cmd").unwrap();
    assert!(cmd.is_root);
    assert_eq!(cmd.display_name, "cmd");
    assert!(!g.contains("cmd"));

    let stats = g.stats();
    assert_eq!(stats.modules, 2);
    assert_eq!(stats.edges, 2);

    // Both spellings name the same module afterwards.
    assert!(!g.add_recursive("cmd").unwrap());
    assert!(!g.add("github.com/x/proj/cmd").unwrap());
    assert_eq!(g.len(), 2);
    g.keep("cmd").unwrap();
    assert_eq!(g.kept_identifiers(), vec!["github.com/x/proj/cmd"]);
}

#[test]
fn keep_unknown_module_fails_without_changes() {
    let m = Manifest::default().with("a", &["b"]).with("b", &[]);
    let mut g = graph(m);
    g.add_recursive("a").unwrap();
    let err = g.keep("nope").unwrap_err();
    assert!(matches!(err, ImportGrapherError::ModuleNotFound(ref id) if id == "nope"));
    assert!(g.kept_identifiers().is_empty());
}

#[test]
fn unresolved_root_is_broken_by_default() {
    let mut g = graph(Manifest::default());
    assert!(g.add_recursive("missing").unwrap());
    let root = g.get("missing").unwrap();
    assert!(root.is_root);
    assert!(root.is_broken);
}

#[test]
fn unresolved_root_fails_when_required() {
    let options = GraphOptions { require_roots: true, ..GraphOptions::default() };
    let mut g = graph_with(Manifest::default().with("a", &["gone"]), Filters::default(), options);

    let err = g.add_recursive("missing").unwrap_err();
    match err {
        ImportGrapherError::RootUnresolved { identifier, failure } => {
            assert_eq!(identifier, "missing");
            assert_eq!(failure.attempts.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(g.is_empty());

    // Broken dependencies stay non-fatal.
    g.add_recursive("a").unwrap();
    assert!(g.get("gone").unwrap().is_broken);
}

#[test]
fn grow_with_non_positive_count_does_nothing() {
    let m = Manifest::default().with("a", &["b"]).with("b", &[]);
    let mut g = graph(m);
    g.add_recursive("a").unwrap();
    g.keep("a").unwrap();
    g.grow(0);
    g.grow(-3);
    assert_eq!(g.kept_identifiers(), vec!["a"]);
}

#[test]
fn stats_summary_text() {
    let m = Manifest::default().with("app", &["lib/a"]).with("lib/a", &["app"]);
    let mut g = graph(m);
    g.add_recursive("app").unwrap();
    assert_eq!(
        g.stats().to_string(),
        "2 modules\n  2 with a single parent\n  1 are roots\n  0 are broken\n2 import edges"
    );
    assert_eq!(g.get("app").unwrap().incoming_count, 1);
}

#[test]
fn test_imports_follow_the_option() {
    let mut m = Manifest::default();
    m.insert("app", &["lib"], &["testutil"]);
    m.insert("lib", &[], &[]);
    m.insert("testutil", &[], &[]);

    let mut g = graph(m.clone());
    g.add_recursive("app").unwrap();
    assert!(!g.contains("testutil"));

    let options = GraphOptions { include_tests: true, ..GraphOptions::default() };
    let mut g = graph_with(m, Filters::default(), options);
    g.add_recursive("app").unwrap();
    assert_eq!(g.get("app").unwrap().dependencies, vec!["lib", "testutil"]);
    assert!(g.contains("testutil"));
}

#[test]
fn vendored_dependency_keeps_its_import_name() {
    let m = Manifest::default()
        .with("github.com/x/proj/cmd", &["github.com/dep/y"])
        .with("github.com/x/proj/vendor/github.com/dep/y", &[]);
    let filters = Filters::new(None, Some("github.com/x/proj"), true).unwrap();
    let mut g = graph_with(m, filters, GraphOptions::default());
    g.add_recursive("github.com/x/proj/cmd").unwrap();

    let dep = g.get("github.com/dep/y").unwrap();
    assert!(!dep.is_broken);
    assert!(!g.contains("github.com/x/proj/vendor/github.com/dep/y"));
}

#[test]
fn json_snapshot_is_sorted() {
    let m = Manifest::default().with("b", &["a"]).with("a", &[]);
    let mut g = graph(m);
    g.add_recursive("b").unwrap();
    let json = g.to_json().unwrap();
    let a = json.find("\"identifier\": \"a\"").unwrap();
    let b = json.find("\"identifier\": \"b\"").unwrap();
    assert!(a < b);
    assert!(json.contains("\"incoming_count\": 1"));
}
