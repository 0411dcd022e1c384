//! Go source scanning.
//!
//! [`GoImportParser`] pulls import paths out of a `.go` file with a handful of
//! conservative regexes; [`GoSourceTree`] applies it to every file of a package
//! directory and serves as a [`ModuleSource`] for the resolver.
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::graph::resolver::{ModuleImports, ModuleSource};

#[derive(Debug)]
pub struct ImportPatterns {
    pub block_comment: Regex,
    pub line_comment: Regex,
    pub single: Regex,
    pub group: Regex,
    pub spec: Regex,
    pub declaration: Regex,
}

impl ImportPatterns {
    #[must_use]
    pub fn compile() -> Self {
        // Simple, conservative regexes to avoid catastrophic backtracking
        let block_comment = Regex::new(r"(?s)/\*.*?\*/").expect("static regex");
        let line_comment = Regex::new(r"(?m)//.*$").expect("static regex");
        let single = Regex::new(r#"(?m)^\s*import\s+(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?["`](?P<path>[^"`]+)["`]"#)
            .expect("static regex");
        let group = Regex::new(r"(?m)^\s*import\s*\((?P<body>[^)]*)\)").expect("static regex");
        let spec = Regex::new(r#"(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?["`](?P<path>[^"`]+)["`]"#)
            .expect("static regex");
        let declaration = Regex::new(r"(?m)^(?:func|type|var|const)\b").expect("static regex");
        Self { block_comment, line_comment, single, group, spec, declaration }
    }
}

impl Default for ImportPatterns {
    fn default() -> Self {
        Self::compile()
    }
}

#[derive(Debug, Default)]
pub struct GoImportParser {
    patterns: ImportPatterns,
}

impl GoImportParser {
    #[must_use]
    pub fn new() -> Self {
        Self { patterns: ImportPatterns::compile() }
    }

    /// Import paths declared by one Go file, in source order (duplicates kept).
    ///
    /// Imports must precede every other declaration, so scanning stops at the
    /// first top-level `func`, `type`, `var` or `const`.
    #[must_use]
    pub fn parse_imports(&self, content: &str) -> Vec<String> {
        let without_blocks = self.patterns.block_comment.replace_all(content, "");
        let stripped = self.patterns.line_comment.replace_all(&without_blocks, "");
        let code = match self.patterns.declaration.find(&stripped) {
            Some(m) => &stripped[..m.start()],
            None => &stripped[..],
        };

        let mut found: Vec<(usize, String)> = Vec::new();
        for cap in self.patterns.single.captures_iter(code) {
            if let Some(m) = cap.name("path") {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
        for cap in self.patterns.group.captures_iter(code) {
            let Some(body) = cap.name("body") else { continue };
            for spec in self.patterns.spec.captures_iter(body.as_str()) {
                if let Some(m) = spec.name("path") {
                    found.push((body.start() + m.start(), m.as_str().to_string()));
                }
            }
        }
        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, p)| p).collect()
    }
}

/// A directory laid out like `$GOPATH/src`: import path `a/b` lives in `<root>/a/b`.
#[derive(Debug)]
pub struct GoSourceTree {
    src_root: PathBuf,
    parser: GoImportParser,
}

impl GoSourceTree {
    pub fn new<P: AsRef<Path>>(src_root: P) -> Self {
        Self { src_root: src_root.as_ref().to_path_buf(), parser: GoImportParser::new() }
    }

    #[must_use]
    pub fn src_root(&self) -> &Path {
        &self.src_root
    }

    /// `$GOPATH/src` when `GOPATH` is set, the current directory otherwise.
    #[must_use]
    pub fn default_root() -> PathBuf {
        match std::env::var_os("GOPATH") {
            Some(gopath) if !gopath.is_empty() => {
                // GOPATH may list several entries; the first one wins.
                let first = std::env::split_paths(&gopath).next().unwrap_or_default();
                first.join("src")
            }
            _ => PathBuf::from("."),
        }
    }
}

impl ModuleSource for GoSourceTree {
    fn lookup(&self, path: &str) -> Result<ModuleImports, String> {
        let dir = self.src_root.join(path);
        if !dir.is_dir() {
            return Err(format!("cannot find module directory {}", dir.display()));
        }
        let mut imports = Vec::new();
        let mut test_imports = Vec::new();
        let mut go_files = 0usize;
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| e.to_string())?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(".go") {
                continue;
            }
            go_files += 1;
            let content = std::fs::read_to_string(entry.path())
                .map_err(|e| format!("{}: {e}", entry.path().display()))?;
            let parsed = self.parser.parse_imports(&content);
            if name.ends_with("_test.go") {
                test_imports.extend(parsed);
            } else {
                imports.extend(parsed);
            }
        }
        if go_files == 0 {
            return Err(format!("no Go source files in {}", dir.display()));
        }
        Ok(ModuleImports { resolved_as: path.to_string(), imports, test_imports, ..ModuleImports::default() })
    }
}
