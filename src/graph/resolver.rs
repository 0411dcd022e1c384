//! Module resolution: turn an identifier into its recorded import lists.
//!
//! A [`ModuleSource`] answers for exact paths only. [`StrategyResolver`] layers
//! the naming fallbacks on top of it (as given, under the boundary, under the
//! boundary's vendor directory) and collects every failed attempt so that a
//! broken module can be diagnosed later.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::errors::ImportGrapherError;

/// Identifier of the cgo pseudo-package. It has no source and is never resolved.
pub const FOREIGN_MODULE: &str = "C";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleImports {
    /// Candidate path that actually resolved.
    pub resolved_as: String,
    /// How `resolved_as` was derived from the requested identifier.
    pub strategy: Strategy,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    AsGiven,
    Boundary,
    Vendor,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::AsGiven => "as-given",
            Strategy::Boundary => "boundary",
            Strategy::Vendor => "vendor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    pub candidate: String,
    pub reason: String,
}

/// Every attempt made for an identifier that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub identifier: String,
    pub attempts: Vec<StrategyAttempt>,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, a) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {}: {}", a.strategy, a.candidate, a.reason)?;
        }
        write!(f, "}}")
    }
}

impl std::error::Error for ResolutionFailure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ModuleImports),
    Failed(ResolutionFailure),
}

/// Resolution as seen by the graph engine.
pub trait Resolver {
    fn resolve(&self, identifier: &str, include_tests: bool) -> Resolution;
}

/// Exact-path lookup of a module's imports.
pub trait ModuleSource {
    /// # Errors
    /// Returns a human readable reason when `path` does not name a module.
    fn lookup(&self, path: &str) -> Result<ModuleImports, String>;
}

pub struct StrategyResolver<S> {
    source: S,
    boundary: Option<String>,
}

impl<S: ModuleSource> StrategyResolver<S> {
    pub fn new(source: S, boundary: Option<&str>) -> Self {
        let boundary = boundary
            .map(|b| b.trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        Self { source, boundary }
    }

    /// Candidate paths in the order they are tried, duplicates removed.
    #[must_use]
    pub fn candidates(&self, identifier: &str) -> Vec<(Strategy, String)> {
        let rel = match &self.boundary {
            Some(b) => match identifier.strip_prefix(b.as_str()) {
                Some(r) if r.is_empty() || r.starts_with('/') => r.trim_start_matches('/'),
                _ => identifier,
            },
            None => identifier,
        };
        let mut out = vec![(Strategy::AsGiven, identifier.to_string())];
        if let Some(b) = &self.boundary {
            out.push((Strategy::Boundary, join(b, rel)));
            out.push((Strategy::Vendor, join(&join(b, "vendor"), rel)));
        } else {
            out.push((Strategy::Vendor, join("vendor", rel)));
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|(_, c)| seen.insert(c.clone()));
        out
    }
}

impl<S: ModuleSource> Resolver for StrategyResolver<S> {
    fn resolve(&self, identifier: &str, include_tests: bool) -> Resolution {
        let mut attempts = Vec::new();
        for (strategy, candidate) in self.candidates(identifier) {
            match self.source.lookup(&candidate) {
                Ok(mut found) => {
                    found.resolved_as = candidate;
                    found.strategy = strategy;
                    if !include_tests {
                        found.test_imports.clear();
                    }
                    return Resolution::Resolved(found);
                }
                Err(reason) => attempts.push(StrategyAttempt { strategy, candidate, reason }),
            }
        }
        Resolution::Failed(ResolutionFailure { identifier: identifier.to_string(), attempts })
    }
}

fn join(base: &str, rel: &str) -> String {
    match (base.is_empty(), rel.is_empty()) {
        (true, _) => rel.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{rel}"),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub test_imports: Vec<String>,
}

/// Declared imports read from a JSON or TOML file instead of a source tree.
///
/// ```json
/// { "modules": { "app": { "imports": ["lib/a"], "test_imports": [] } } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub modules: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// Load a manifest; `.toml` files are parsed as TOML, everything else as JSON.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::Io` if the file cannot be read and
    /// `ImportGrapherError::Manifest` if it does not parse.
    pub fn load(path: &Path) -> Result<Self, ImportGrapherError> {
        let data = std::fs::read_to_string(path)?;
        let parsed = if path.extension().is_some_and(|e| e == "toml") {
            toml::from_str::<Manifest>(&data).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<Manifest>(&data).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ImportGrapherError::Manifest { file: path.to_path_buf(), message })
    }

    /// Builder used mostly by tests and benches.
    #[must_use]
    pub fn with(mut self, name: &str, imports: &[&str]) -> Self {
        self.insert(name, imports, &[]);
        self
    }

    pub fn insert(&mut self, name: &str, imports: &[&str], test_imports: &[&str]) {
        self.modules.insert(
            name.to_string(),
            ManifestEntry {
                imports: imports.iter().map(|s| (*s).to_string()).collect(),
                test_imports: test_imports.iter().map(|s| (*s).to_string()).collect(),
            },
        );
    }
}

impl ModuleSource for Manifest {
    fn lookup(&self, path: &str) -> Result<ModuleImports, String> {
        self.modules
            .get(path)
            .map(|e| ModuleImports {
                resolved_as: path.to_string(),
                imports: e.imports.clone(),
                test_imports: e.test_imports.clone(),
                ..ModuleImports::default()
            })
            .ok_or_else(|| format!("no module {path:?} in manifest"))
    }
}
