//! import-grapher — Go package import graphs
//!
//! Resolve the imports of root packages, follow them transitively, optionally
//! narrow the result to the neighborhood of chosen packages and render it as a
//! Graphviz digraph.
//!
//! # Features
//! - Name resolution with boundary and vendor fallbacks
//! - Regex and boundary filters applied before a package is admitted
//! - Keep / grow / prune neighborhood selection
//! - Deterministic DOT output, optional SVG via Graphviz
//!
//! # Quickstart (Library)
//! ```no_run
//! use import_grapher::graph::filter::Filters;
//! use import_grapher::graph::resolver::{Manifest, StrategyResolver};
//! use import_grapher::graph::{GraphOptions, ModuleGraph};
//! use import_grapher::visualization::DotGenerator;
//!
//! let manifest = Manifest::load(std::path::Path::new("imports.json")).expect("manifest");
//! let filters = Filters::new(None, Some("github.com/x/proj"), false).expect("filters");
//! let resolver = StrategyResolver::new(manifest, filters.boundary());
//! let mut graph = ModuleGraph::new(Box::new(resolver), filters, GraphOptions::default());
//! graph.add_recursive("github.com/x/proj/cmd/tool").expect("root");
//! println!("{}", DotGenerator::new().generate_dot(&graph).expect("dot"));
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! import-grapher imports github.com/x/proj github.com/x/proj/cmd/tool > deps.dot
//! import-grapher imports "" app --manifest imports.json --keep lib/a --grow 2
//! import-grapher stats github.com/x/proj github.com/x/proj/cmd/tool --format json
//! ```
pub mod app;
pub mod cli;
pub mod errors;
pub mod graph;
pub mod parser;
pub mod utils;
pub mod visualization;
