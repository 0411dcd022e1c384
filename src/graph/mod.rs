//! Graph model and builder for the crate.
//!
//! `ModuleGraph` owns one `ModuleNode` per module identifier. Roots are added
//! with [`ModuleGraph::add`] or [`ModuleGraph::add_recursive`]; the closure is
//! then optionally narrowed with [`ModuleGraph::keep`], [`ModuleGraph::grow`]
//! and [`ModuleGraph::prune`] before being handed to `crate::visualization`.
//!
//! The node map doubles as the "seen" set: every identifier is resolved at most
//! once per graph, including identifiers whose resolution failed.
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

pub mod filter;
pub mod resolver;

use crate::errors::ImportGrapherError;
use filter::Filters;
use resolver::{ModuleImports, Resolution, Resolver, Strategy, FOREIGN_MODULE};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ModuleNode {
    pub identifier: String,
    pub display_name: String,
    /// Sorted, duplicate free, never contains `identifier`.
    pub dependencies: Vec<String>,
    pub is_root: bool,
    pub is_kept: bool,
    /// Kept by explicit request rather than by growth. Rendering only.
    pub is_user_kept: bool,
    pub is_broken: bool,
    /// Placeholder for the cgo pseudo-package; occupies a slot but is never rendered.
    pub is_foreign: bool,
    /// Cached statistic, see [`ModuleGraph::refresh_incoming`].
    pub incoming_count: usize,
}

impl ModuleNode {
    fn new(identifier: &str, display_name: String, is_root: bool) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name,
            is_root,
            ..Self::default()
        }
    }
}

impl fmt::Display for ModuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Module{{{}, {} down, {} up",
            self.display_name,
            self.dependencies.len(),
            self.incoming_count
        )?;
        if self.is_user_kept {
            write!(f, ", user-keep")?;
        } else if self.is_kept {
            write!(f, ", keep")?;
        }
        if self.is_root {
            write!(f, ", root")?;
        }
        if self.is_broken {
            write!(f, ", broken")?;
        }
        if self.is_foreign {
            write!(f, ", foreign")?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// Merge imports of test files into each module's dependencies.
    pub include_tests: bool,
    /// Fail `add`/`add_recursive` when the named root cannot be resolved,
    /// instead of recording it as broken.
    pub require_roots: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct GraphStats {
    pub modules: usize,
    pub single_parent: usize,
    pub roots: usize,
    pub broken: usize,
    pub edges: usize,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules\n  {} with a single parent\n  {} are roots\n  {} are broken\n{} import edges",
            self.modules, self.single_parent, self.roots, self.broken, self.edges
        )
    }
}

pub struct ModuleGraph {
    nodes: HashMap<String, ModuleNode>,
    /// Root names that resolved under the boundary, mapped to their node key.
    aliases: HashMap<String, String>,
    filters: Filters,
    options: GraphOptions,
    resolver: Box<dyn Resolver>,
}

impl fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("nodes", &self.nodes)
            .field("filters", &self.filters)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ModuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph{{")?;
        for id in self.identifiers() {
            if let Some(node) = self.nodes.get(id) {
                writeln!(f, "\t{id}: {node}")?;
            }
        }
        write!(f, "}}")
    }
}

impl ModuleGraph {
    pub fn new(resolver: Box<dyn Resolver>, filters: Filters, options: GraphOptions) -> Self {
        Self { nodes: HashMap::new(), aliases: HashMap::new(), filters, options, resolver }
    }

    /// Admit `identifier` as a root and record its direct dependencies only.
    ///
    /// Returns `Ok(true)` when the root was newly inserted, `Ok(false)` when it
    /// was already present. An existing module is flagged as a root but not
    /// resolved again. A root that only resolves under the boundary is keyed by
    /// its full path.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::RootUnresolved` when `require_roots` is set
    /// and the root cannot be resolved. The graph is left unchanged.
    pub fn add(&mut self, identifier: &str) -> Result<bool, ImportGrapherError> {
        self.admit(identifier, false)
    }

    /// Admit `identifier` as a root and expand every admitted dependency,
    /// depth first, until the closure is exhausted.
    ///
    /// # Errors
    /// Same as [`ModuleGraph::add`]. Failures of non-root modules are never errors;
    /// they are recorded as broken nodes.
    pub fn add_recursive(&mut self, identifier: &str) -> Result<bool, ImportGrapherError> {
        self.admit(identifier, true)
    }

    fn admit(&mut self, identifier: &str, recurse: bool) -> Result<bool, ImportGrapherError> {
        debug!(module = identifier, recurse, "add root");
        let mut added_root = false;
        // Explicit work stack: deep import chains must not exhaust the call stack.
        let mut stack: Vec<(String, bool)> = vec![(identifier.to_string(), true)];
        while let Some((name, is_root)) = stack.pop() {
            if !is_root && !self.filters.admits_dependency(&name) {
                continue;
            }
            let name = if is_root { self.canonical(&name).to_string() } else { name };
            if self.mark_existing(&name, is_root) {
                continue;
            }

            if name == FOREIGN_MODULE {
                let display_name = self.filters.display_name(&name);
                let mut node = ModuleNode::new(&name, display_name, is_root);
                node.is_foreign = true;
                self.nodes.insert(name, node);
                added_root |= is_root;
                continue;
            }

            match self.resolver.resolve(&name, self.options.include_tests) {
                Resolution::Resolved(found) => {
                    // A root named relative to the boundary is stored under its full path.
                    let key = if is_root && found.strategy == Strategy::Boundary && found.resolved_as != name {
                        self.aliases.insert(name, found.resolved_as.clone());
                        found.resolved_as.clone()
                    } else {
                        name
                    };
                    if self.mark_existing(&key, is_root) {
                        continue;
                    }
                    let dependencies = self.dependency_list(&key, found);
                    debug!(module = %key, dependencies = dependencies.len(), "adding");
                    if recurse {
                        stack.extend(dependencies.iter().rev().map(|d| (d.clone(), false)));
                    }
                    let display_name = self.filters.display_name(&key);
                    let mut node = ModuleNode::new(&key, display_name, is_root);
                    node.dependencies = dependencies;
                    self.nodes.insert(key, node);
                }
                Resolution::Failed(failure) => {
                    if is_root && self.options.require_roots {
                        return Err(ImportGrapherError::RootUnresolved { identifier: name, failure });
                    }
                    if is_root {
                        warn!(module = %name, "root could not be resolved: {failure}");
                    } else {
                        debug!(module = %name, "broken: {failure}");
                    }
                    let display_name = self.filters.display_name(&name);
                    let mut node = ModuleNode::new(&name, display_name, is_root);
                    node.is_broken = true;
                    self.nodes.insert(name, node);
                }
            }
            added_root |= is_root;
        }
        Ok(added_root)
    }

    /// Node key for an identifier named by the caller.
    fn canonical<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.aliases.get(identifier).map_or(identifier, String::as_str)
    }

    // Seen check. A module named as a root is flagged as one even when an
    // earlier expansion already added it; nothing else about it changes.
    fn mark_existing(&mut self, key: &str, is_root: bool) -> bool {
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        if is_root && !node.is_root {
            debug!(module = key, "marking existing module as root");
            node.is_root = true;
        }
        true
    }

    fn dependency_list(&self, name: &str, found: ModuleImports) -> Vec<String> {
        let ModuleImports { resolved_as, imports, test_imports, .. } = found;
        let tests = if self.options.include_tests { test_imports } else { Vec::new() };
        let mut deps: Vec<String> = imports
            .into_iter()
            .chain(tests)
            .filter(|d| d != name && *d != resolved_as)
            .filter(|d| self.filters.admits_dependency(d))
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    /// Mark an existing module as kept by the caller.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::ModuleNotFound` if no module has that identifier.
    pub fn keep(&mut self, identifier: &str) -> Result<(), ImportGrapherError> {
        let identifier = identifier.trim();
        let key = self.canonical(identifier).to_string();
        let Some(node) = self.nodes.get_mut(&key) else {
            return Err(ImportGrapherError::ModuleNotFound(identifier.to_string()));
        };
        info!(module = identifier, "keeping");
        node.is_kept = true;
        node.is_user_kept = true;
        Ok(())
    }

    /// Expand the kept set `count` times along dependency edges in both
    /// directions. Non-positive counts do nothing.
    pub fn grow(&mut self, count: i64) {
        for remaining in (1..=count).rev() {
            let before = self.kept_set();
            let after = self.grow_once(&before);
            debug!(
                remaining,
                before = before.len(),
                after = after.len(),
                total = self.nodes.len(),
                "grow"
            );
            // `after` is a superset of `before`; equal sizes mean saturation.
            if after.len() == before.len() {
                break;
            }
            for (id, node) in &mut self.nodes {
                node.is_kept = after.contains(id);
            }
        }
    }

    fn kept_set(&self) -> HashSet<String> {
        self.nodes.values().filter(|n| n.is_kept).map(|n| n.identifier.clone()).collect()
    }

    // Reads only `kept`, so growing down and growing up see the same snapshot.
    fn grow_once(&self, kept: &HashSet<String>) -> HashSet<String> {
        let mut next = kept.clone();
        for (id, node) in &self.nodes {
            let node_kept = kept.contains(id);
            for dep in &node.dependencies {
                if node_kept && self.nodes.contains_key(dep) {
                    next.insert(dep.clone());
                }
                if kept.contains(dep) {
                    next.insert(id.clone());
                }
            }
        }
        next
    }

    /// Drop every module that is not kept, then drop edges to dropped modules.
    pub fn prune(&mut self) {
        let before = self.nodes.len();
        self.nodes.retain(|_, n| n.is_kept);
        let survivors: HashSet<String> = self.nodes.keys().cloned().collect();
        for node in self.nodes.values_mut() {
            node.dependencies.retain(|d| survivors.contains(d));
        }
        info!(removed = before - self.nodes.len(), remaining = self.nodes.len(), "pruned");
    }

    /// Number of modules whose dependencies include each module, without touching the cache.
    #[must_use]
    pub fn incoming_counts(&self) -> HashMap<&str, usize> {
        let mut counts: HashMap<&str, usize> =
            self.nodes.keys().map(|k| (k.as_str(), 0usize)).collect();
        for node in self.nodes.values() {
            for dep in &node.dependencies {
                if let Some(c) = counts.get_mut(dep.as_str()) {
                    *c += 1;
                }
            }
        }
        counts
    }

    /// Recompute every node's cached `incoming_count`.
    pub fn refresh_incoming(&mut self) {
        let counts: HashMap<String, usize> =
            self.incoming_counts().into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        for (id, node) in &mut self.nodes {
            node.incoming_count = counts.get(id).copied().unwrap_or(0);
        }
    }

    pub fn stats(&mut self) -> GraphStats {
        self.refresh_incoming();
        let mut stats = GraphStats { modules: self.nodes.len(), ..GraphStats::default() };
        for node in self.nodes.values() {
            if node.incoming_count == 1 {
                stats.single_parent += 1;
            }
            if node.is_root {
                stats.roots += 1;
            }
            if node.is_broken {
                stats.broken += 1;
            }
            stats.edges += node.dependencies.len();
        }
        stats
    }

    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&ModuleNode> {
        self.nodes.get(identifier)
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.nodes.contains_key(identifier)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.values()
    }

    /// Module identifiers in lexicographic order.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Every identifier that is a module or appears as a dependency, sorted and unique.
    #[must_use]
    pub fn referenced_identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .nodes
            .values()
            .flat_map(|n| std::iter::once(n.identifier.as_str()).chain(n.dependencies.iter().map(String::as_str)))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    #[must_use]
    pub fn kept_identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> =
            self.nodes.values().filter(|n| n.is_kept).map(|n| n.identifier.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    #[must_use]
    pub fn options(&self) -> GraphOptions {
        self.options
    }

    /// Pretty JSON array of all modules, sorted by identifier, with fresh incoming counts.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::Io` if serialization fails.
    pub fn to_json(&mut self) -> Result<String, ImportGrapherError> {
        self.refresh_incoming();
        let mut nodes: Vec<&ModuleNode> = self.nodes.values().collect();
        nodes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        serde_json::to_string_pretty(&nodes)
            .map_err(|e| ImportGrapherError::Io(std::io::Error::other(e.to_string())))
    }

    /// Save the graph as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::Io` if serialization or writing the file fails.
    pub fn save_json(&mut self, path: &std::path::Path) -> Result<(), ImportGrapherError> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
