//! Admission policy for discovered module identifiers.
//!
//! Two independent checks run on every dependency name before it becomes an
//! edge or is queued for expansion: an optional regular-expression pattern and
//! an optional boundary prefix. Roots named by the caller skip both checks.
use regex::Regex;
use tracing::debug;

use crate::errors::ImportGrapherError;

#[derive(Debug, Clone, Default)]
pub struct Filters {
    pattern: Option<Regex>,
    boundary: Option<String>,
    include_externals: bool,
}

impl Filters {
    /// Build the filter set.
    ///
    /// An empty boundary is treated as no boundary; trailing `/` is ignored.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::InvalidFilter` when `pattern` is not a valid regex.
    pub fn new(
        pattern: Option<&str>,
        boundary: Option<&str>,
        include_externals: bool,
    ) -> Result<Self, ImportGrapherError> {
        let pattern = match pattern.filter(|p| !p.is_empty()) {
            Some(p) => Some(Regex::new(p).map_err(|source| ImportGrapherError::InvalidFilter {
                pattern: p.to_string(),
                source,
            })?),
            None => None,
        };
        let boundary = boundary
            .map(|b| b.trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        Ok(Self { pattern, boundary, include_externals })
    }

    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    #[must_use]
    pub fn include_externals(&self) -> bool {
        self.include_externals
    }

    /// True when `name` equals the boundary or lives underneath it.
    /// Always true without a boundary.
    #[must_use]
    pub fn within_boundary(&self, name: &str) -> bool {
        match &self.boundary {
            None => true,
            Some(b) => name == b || name.strip_prefix(b.as_str()).is_some_and(|r| r.starts_with('/')),
        }
    }

    #[must_use]
    pub fn matches_pattern(&self, name: &str) -> bool {
        self.pattern.as_ref().map_or(true, |re| re.is_match(name))
    }

    /// Whether a discovered dependency may become an edge.
    #[must_use]
    pub fn admits_dependency(&self, name: &str) -> bool {
        if !self.matches_pattern(name) {
            debug!(module = name, "rejected by filter pattern");
            return false;
        }
        if !self.include_externals && !self.within_boundary(name) {
            debug!(module = name, "outside boundary");
            return false;
        }
        true
    }

    /// Identifier with the boundary prefix (and the following separator) removed.
    #[must_use]
    pub fn display_name(&self, name: &str) -> String {
        let Some(b) = &self.boundary else {
            return name.to_string();
        };
        match name.strip_prefix(b.as_str()).and_then(|r| r.strip_prefix('/')) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => name.to_string(),
        }
    }
}
