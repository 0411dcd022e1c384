//! Graphviz rendering.
//!
//! [`DotGenerator::describe`] turns a `ModuleGraph` into a plain node/edge
//! description with string attributes; [`GraphDescription::to_dot`] is the only
//! place that knows DOT syntax. Output order follows the sorted identifier list,
//! never the hash map, so identical graphs render byte-identically.
use crate::errors::ImportGrapherError;
use crate::graph::{ModuleGraph, ModuleNode};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use tracing::debug;

pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RankDir {
    LR,
    TB,
}

impl RankDir {
    fn as_str(self) -> &'static str {
        match self {
            RankDir::LR => "LR",
            RankDir::TB => "TB",
        }
    }
}

/// Fill colors for the four node conditions. Any Graphviz color string works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub user_kept: String,
    pub root: String,
    pub single_parent: String,
    pub broken: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            user_kept: "#76E1FE".to_string(),
            root: "green".to_string(),
            single_parent: "#fcd92d".to_string(),
            broken: "red".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DotOptions {
    pub legend: bool,
    pub rankdir: RankDir,
    pub palette: Palette,
}

impl Default for DotOptions {
    fn default() -> Self {
        Self { legend: false, rankdir: RankDir::TB, palette: Palette::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotNode {
    pub id: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotEdge {
    pub from: String,
    pub to: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    pub name: String,
    pub attributes: Attributes,
    pub nodes: Vec<DotNode>,
    pub edges: Vec<DotEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDescription {
    pub name: String,
    pub graph_attributes: Attributes,
    pub nodes: Vec<DotNode>,
    pub edges: Vec<DotEdge>,
    pub subgraphs: Vec<Subgraph>,
}

impl GraphDescription {
    /// Serialize as a DOT `digraph`.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::Visualization` when a node id or attribute
    /// name is not a plain DOT identifier.
    pub fn to_dot(&self) -> Result<String, ImportGrapherError> {
        let mut s = String::new();
        let _ = writeln!(s, "digraph {} {{", quote(&self.name));
        for (k, v) in &self.graph_attributes {
            check_id(k)?;
            let _ = writeln!(s, "  {k}={};", quote(v));
        }
        write_body(&mut s, "  ", &self.nodes, &self.edges)?;
        for sub in &self.subgraphs {
            check_id(&sub.name)?;
            let _ = writeln!(s, "  subgraph {} {{", sub.name);
            for (k, v) in &sub.attributes {
                check_id(k)?;
                let _ = writeln!(s, "    {k}={};", quote(v));
            }
            write_body(&mut s, "    ", &sub.nodes, &sub.edges)?;
            s.push_str("  }\n");
        }
        s.push_str("}\n");
        Ok(s)
    }
}

fn write_body(
    s: &mut String,
    indent: &str,
    nodes: &[DotNode],
    edges: &[DotEdge],
) -> Result<(), ImportGrapherError> {
    for node in nodes {
        check_id(&node.id)?;
        let _ = writeln!(s, "{indent}{}{};", node.id, attribute_list(&node.attributes)?);
    }
    for edge in edges {
        check_id(&edge.from)?;
        check_id(&edge.to)?;
        let _ = writeln!(
            s,
            "{indent}{} -> {}{};",
            edge.from,
            edge.to,
            attribute_list(&edge.attributes)?
        );
    }
    Ok(())
}

fn attribute_list(attrs: &Attributes) -> Result<String, ImportGrapherError> {
    if attrs.is_empty() {
        return Ok(String::new());
    }
    let mut parts = Vec::with_capacity(attrs.len());
    for (k, v) in attrs {
        check_id(k)?;
        parts.push(format!("{k}={}", quote(v)));
    }
    Ok(format!(" [{}]", parts.join(", ")))
}

fn is_dot_id(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_id(s: &str) -> Result<(), ImportGrapherError> {
    if is_dot_id(s) {
        Ok(())
    } else {
        Err(ImportGrapherError::Visualization(format!("invalid DOT identifier {s:?}")))
    }
}

fn escape_label(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn quote(s: &str) -> String {
    format!("\"{}\"", escape_label(s))
}

fn attrs<const N: usize>(pairs: [(&str, String); N]) -> Attributes {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Colors that apply to a node, in a fixed order. Conditions are independent.
fn fill_colors<'p>(node: &ModuleNode, incoming: usize, palette: &'p Palette) -> Vec<&'p str> {
    let mut colors = Vec::new();
    if node.is_user_kept {
        colors.push(palette.user_kept.as_str());
    }
    if node.is_root {
        colors.push(palette.root.as_str());
    }
    if incoming == 1 {
        colors.push(palette.single_parent.as_str());
    }
    if node.is_broken {
        colors.push(palette.broken.as_str());
    }
    colors
}

fn node_attributes(node: &ModuleNode, incoming: usize, palette: &Palette) -> Attributes {
    let mut a = attrs([
        (
            "label",
            format!("{}\n{} up {} down", node.display_name, incoming, node.dependencies.len()),
        ),
        ("shape", "box".to_string()),
    ]);
    let colors = fill_colors(node, incoming, palette);
    if !colors.is_empty() {
        a.insert("style".to_string(), "striped".to_string());
        a.insert("fillcolor".to_string(), colors.join(":"));
    }
    a
}

fn legend(palette: &Palette) -> Subgraph {
    let items = [
        ("broken", &palette.broken, "could not resolve this module's imports"),
        ("root", &palette.root, "root module (named on the command line)"),
        ("singleParent", &palette.single_parent, "imported by exactly one other module"),
        ("userKeep", &palette.user_kept, "kept module (named with --keep)"),
    ];
    let mut sub = Subgraph {
        name: "cluster_legend".to_string(),
        attributes: attrs([("label", "Legend".to_string()), ("style", "solid".to_string())]),
        ..Subgraph::default()
    };
    for (key, color, doc) in items {
        let swatch = format!("legend_{key}Color");
        let text = format!("legend_{key}Doc");
        sub.nodes.push(DotNode {
            id: swatch.clone(),
            attributes: attrs([
                ("label", "module".to_string()),
                ("shape", "box".to_string()),
                ("style", "filled".to_string()),
                ("fillcolor", color.clone()),
            ]),
        });
        sub.nodes.push(DotNode {
            id: text.clone(),
            attributes: attrs([("label", doc.to_string()), ("shape", "plaintext".to_string())]),
        });
        sub.edges.push(DotEdge {
            from: swatch,
            to: text,
            attributes: attrs([("style", "invis".to_string())]),
        });
    }
    sub
}

#[derive(Debug, Default)]
pub struct DotGenerator;

impl DotGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    /// Build the node/edge description of `graph`.
    ///
    /// Every identifier referenced by the graph gets a stable id `N<i>` from its
    /// position in the sorted identifier list. Identifiers without a module
    /// (dangling dependencies) and foreign placeholders are not emitted, and
    /// neither are edges touching them.
    #[must_use]
    pub fn describe(&self, graph: &ModuleGraph, opts: &DotOptions) -> GraphDescription {
        let ids = graph.referenced_identifiers();
        let index: HashMap<&str, String> =
            ids.iter().enumerate().map(|(i, id)| (*id, format!("N{i}"))).collect();
        let incoming = graph.incoming_counts();

        let mut out = GraphDescription {
            name: graph.filters().boundary().unwrap_or("modules").to_string(),
            graph_attributes: attrs([("rankdir", opts.rankdir.as_str().to_string())]),
            ..GraphDescription::default()
        };

        let mut emitted: HashSet<&str> = HashSet::with_capacity(ids.len());
        for id in &ids {
            let Some(node) = graph.get(id) else {
                debug!(module = *id, "no module for dependency, skipping node");
                continue;
            };
            if node.is_foreign {
                continue;
            }
            let Some(node_id) = index.get(id) else { continue };
            let in_count = incoming.get(id).copied().unwrap_or(0);
            out.nodes.push(DotNode {
                id: node_id.clone(),
                attributes: node_attributes(node, in_count, &opts.palette),
            });
            emitted.insert(*id);
        }

        for id in &ids {
            if !emitted.contains(id) {
                continue;
            }
            let Some(node) = graph.get(id) else { continue };
            for dep in &node.dependencies {
                if !emitted.contains(dep.as_str()) {
                    continue;
                }
                if let (Some(from), Some(to)) = (index.get(id), index.get(dep.as_str())) {
                    out.edges.push(DotEdge {
                        from: from.clone(),
                        to: to.clone(),
                        attributes: attrs([("weight", "1".to_string())]),
                    });
                }
            }
        }

        if opts.legend {
            out.subgraphs.push(legend(&opts.palette));
        }
        out
    }

    /// Generate DOT with default options.
    ///
    /// # Errors
    /// Returns a `ImportGrapherError::Visualization` if the description cannot be serialized.
    pub fn generate_dot(&self, graph: &ModuleGraph) -> Result<String, ImportGrapherError> {
        self.generate_dot_with_options(graph, &DotOptions::default())
    }

    /// Generate DOT with the given `opts`.
    ///
    /// # Errors
    /// Returns a `ImportGrapherError::Visualization` if the description cannot be serialized.
    pub fn generate_dot_with_options(
        &self,
        graph: &ModuleGraph,
        opts: &DotOptions,
    ) -> Result<String, ImportGrapherError> {
        self.describe(graph, opts).to_dot()
    }
}

#[derive(Debug, Default)]
pub struct SvgGenerator;

impl SvgGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    /// Generate an SVG rendering using Graphviz.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::Visualization` if invoking Graphviz fails,
    /// if the process exits with a non-success status, or if its output is not valid UTF-8.
    pub fn generate_svg_with_options(
        &self,
        graph: &ModuleGraph,
        opts: &DotOptions,
    ) -> Result<String, ImportGrapherError> {
        let dot = DotGenerator::new().generate_dot_with_options(graph, opts)?;
        let output = std::process::Command::new("dot")
            .arg("-Tsvg")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()
            .and_then(|mut child| {
                use std::io::Write;
                if let Some(stdin) = child.stdin.as_mut() {
                    stdin.write_all(dot.as_bytes())?;
                }
                child.wait_with_output()
            })
            .map_err(|e| {
                ImportGrapherError::Visualization(format!("Failed to run graphviz 'dot': {e}"))
            })?;
        if !output.status.success() {
            return Err(ImportGrapherError::Visualization(format!(
                "Graphviz 'dot' failed with code {:?}",
                output.status.code()
            )));
        }
        String::from_utf8(output.stdout).map_err(|e| {
            ImportGrapherError::Visualization(format!("Invalid UTF-8 from dot: {e}"))
        })
    }
}
