use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "import-grapher",
    version,
    about = "Graph the import dependencies of Go packages",
    long_about = "Resolve the imports of one or more root packages, follow them transitively, optionally narrow the result to the neighborhood of chosen packages, and emit a Graphviz digraph. Packages are read from a GOPATH-style source tree or from a JSON/TOML manifest."
)]
pub struct Cli {
    /// Debug logging (per-package admission, grow counts, failure detail)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true, default_value_t = false)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs and graph options shared by `imports` and `stats`.
#[derive(Debug, Clone, Args)]
pub struct GraphArgs {
    /// Boundary prefix; packages outside it are dropped. Pass "" for none
    pub boundary: String,
    /// Root packages to start from
    #[arg(required = true)]
    pub roots: Vec<String>,
    /// Source root laid out like $GOPATH/src (default: $GOPATH/src, else the current directory)
    #[arg(long, env = "IMPORT_GRAPHER_SRC", value_name = "DIR")]
    pub src: Option<PathBuf>,
    /// Read imports from a JSON or TOML manifest instead of a source tree
    #[arg(long, value_name = "FILE", conflicts_with = "src")]
    pub manifest: Option<PathBuf>,
    /// Only admit packages whose name matches this regular expression
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,
    /// Keep only the neighborhood of this package (repeatable)
    #[arg(long, value_name = "PACKAGE")]
    pub keep: Vec<String>,
    /// Neighborhood radius around kept packages (default: 1)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub grow: Option<i64>,
    /// Include imports of *_test.go files (`--tests=false` overrides the config file)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub tests: Option<bool>,
    /// Admit packages outside the boundary (`--externals=false` overrides the config file)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub externals: Option<bool>,
    /// Fail when a root package cannot be resolved instead of marking it broken
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", value_name = "BOOL")]
    pub require_roots: Option<bool>,
    /// Path to a TOML configuration file (default: ./import-grapher.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the import graph and render it as DOT (stdout unless an output file is given)
    Imports {
        #[command(flatten)]
        graph: GraphArgs,
        /// Output DOT file path
        #[arg(long, value_name = "FILE")]
        dot: Option<PathBuf>,
        /// Output SVG file path (requires Graphviz `dot` on PATH)
        #[arg(long, value_name = "FILE")]
        svg: Option<PathBuf>,
        /// Output JSON snapshot of the packages
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
        /// DOT: include a legend cluster (default: off)
        #[arg(long, value_enum)]
        legend: Option<OnOffArg>,
        /// DOT: rank direction (default: TB)
        #[arg(long, value_enum)]
        rankdir: Option<RankDirArg>,
    },
    /// Build the import graph and print summary counts
    Stats {
        #[command(flatten)]
        graph: GraphArgs,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnOffArg {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankDirArg {
    #[value(name = "LR")]
    Lr,
    #[value(name = "TB")]
    Tb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_imports_with_repeated_keeps() {
        let cli = Cli::try_parse_from([
            "import-grapher",
            "-v",
            "imports",
            "github.com/x/proj",
            "github.com/x/proj/cmd",
            "--keep",
            "a",
            "--keep",
            "b",
            "--grow",
            "-1",
            "--rankdir",
            "LR",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Imports { graph, rankdir, legend, .. } = cli.command else {
            panic!("expected imports");
        };
        assert_eq!(graph.roots, vec!["github.com/x/proj/cmd"]);
        assert_eq!(graph.keep, vec!["a", "b"]);
        assert_eq!(graph.grow, Some(-1));
        assert_eq!(rankdir, Some(RankDirArg::Lr));
        assert_eq!(legend, None);
    }

    #[test]
    fn boolean_flags_take_optional_values() {
        let cli = Cli::try_parse_from([
            "import-grapher", "stats", "", "--tests", "--externals=false", "a",
        ])
        .unwrap();
        let Commands::Stats { graph, .. } = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(graph.tests, Some(true));
        assert_eq!(graph.externals, Some(false));
        assert_eq!(graph.require_roots, None);
        assert_eq!(graph.roots, vec!["a"]);
    }

    #[test]
    fn roots_are_required() {
        assert!(Cli::try_parse_from(["import-grapher", "stats", "b"]).is_err());
    }

    #[test]
    fn src_and_manifest_conflict() {
        let r = Cli::try_parse_from([
            "import-grapher", "stats", "", "a", "--src", "x", "--manifest", "m.json",
        ]);
        assert!(r.is_err());
    }
}
