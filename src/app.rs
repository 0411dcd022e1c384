use crate::cli::{Cli, Commands, GraphArgs, OnOffArg, OutputFormat, RankDirArg};
use crate::errors::ImportGrapherError;
use crate::graph::filter::Filters;
use crate::graph::resolver::{Manifest, Resolver, StrategyResolver};
use crate::graph::{GraphOptions, ModuleGraph};
use crate::parser::GoSourceTree;
use crate::utils::config::{load_config_at, load_config_near, Config};
use crate::visualization::{DotGenerator, DotOptions, Palette, RankDir, SvgGenerator};
use clap::CommandFactory;
use clap_complete::generate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_GROW: i64 = 1;

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success). Errors are printed to stderr.
#[must_use]
pub fn run_cli(cli: Cli) -> i32 {
    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }
        Commands::Imports { graph, dot, svg, json, legend, rankdir } => {
            let outputs = Outputs { dot, svg, json };
            run_imports(&graph, &outputs, legend, rankdir)
        }
        Commands::Stats { graph, format } => run_stats(&graph, format),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

struct Outputs {
    dot: Option<PathBuf>,
    svg: Option<PathBuf>,
    json: Option<PathBuf>,
}

impl Outputs {
    fn is_empty(&self) -> bool {
        self.dot.is_none() && self.svg.is_none() && self.json.is_none()
    }
}

/// Graph settings after merging flags over the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GraphSettings {
    options: GraphOptions,
    include_externals: bool,
    grow: i64,
}

fn load_config(args: &GraphArgs) -> Result<Config, ImportGrapherError> {
    match &args.config {
        Some(path) => load_config_at(path),
        None => Ok(load_config_near(Path::new("."))?.unwrap_or_default()),
    }
}

// A flag that was passed wins in either direction; otherwise the config value; otherwise off.
fn flag_or(flag: Option<bool>, configured: Option<bool>) -> bool {
    flag.or(configured).unwrap_or(false)
}

fn graph_settings(args: &GraphArgs, cfg: &Config) -> GraphSettings {
    let g = cfg.graph.clone().unwrap_or_default();
    GraphSettings {
        options: GraphOptions {
            include_tests: flag_or(args.tests, g.include_tests),
            require_roots: flag_or(args.require_roots, g.require_roots),
        },
        include_externals: flag_or(args.externals, g.include_externals),
        grow: args.grow.or(g.grow).unwrap_or(DEFAULT_GROW),
    }
}

fn dot_options(cfg: &Config, legend: Option<OnOffArg>, rankdir: Option<RankDirArg>) -> DotOptions {
    let d = cfg.dot.clone().unwrap_or_default();
    let mut palette = Palette::default();
    if let Some(p) = cfg.palette.clone() {
        if let Some(v) = p.user_kept {
            palette.user_kept = v;
        }
        if let Some(v) = p.root {
            palette.root = v;
        }
        if let Some(v) = p.single_parent {
            palette.single_parent = v;
        }
        if let Some(v) = p.broken {
            palette.broken = v;
        }
    }
    DotOptions {
        legend: legend.map(|l| l == OnOffArg::On).or(d.legend).unwrap_or(false),
        rankdir: rankdir
            .map(|r| match r {
                RankDirArg::Lr => RankDir::LR,
                RankDirArg::Tb => RankDir::TB,
            })
            .or(d.rankdir)
            .unwrap_or(RankDir::TB),
        palette,
    }
}

fn make_resolver(args: &GraphArgs, boundary: Option<&str>) -> Result<Box<dyn Resolver>, ImportGrapherError> {
    if let Some(path) = &args.manifest {
        let manifest = Manifest::load(path)?;
        debug!(manifest = %path.display(), modules = manifest.modules.len(), "using manifest");
        return Ok(Box::new(StrategyResolver::new(manifest, boundary)));
    }
    let root = args.src.clone().unwrap_or_else(GoSourceTree::default_root);
    debug!(src = %root.display(), "using source tree");
    Ok(Box::new(StrategyResolver::new(GoSourceTree::new(root), boundary)))
}

/// Build the graph for `args`: add every root, then keep, grow and prune when
/// packages to keep were named.
///
/// # Errors
/// Propagates filter, manifest, root resolution and keep errors.
pub fn build_graph(args: &GraphArgs, cfg: &Config) -> Result<ModuleGraph, ImportGrapherError> {
    let settings = graph_settings(args, cfg);
    let filters = Filters::new(args.filter.as_deref(), Some(args.boundary.as_str()), settings.include_externals)?;
    let resolver = make_resolver(args, filters.boundary())?;
    let mut graph = ModuleGraph::new(resolver, filters, settings.options);

    for root in &args.roots {
        graph.add_recursive(root)?;
    }
    if !args.keep.is_empty() {
        for id in &args.keep {
            graph.keep(id)?;
        }
        graph.grow(settings.grow);
        graph.prune();
    }
    debug!("{graph}");
    Ok(graph)
}

fn run_imports(
    args: &GraphArgs,
    outputs: &Outputs,
    legend: Option<OnOffArg>,
    rankdir: Option<RankDirArg>,
) -> Result<(), ImportGrapherError> {
    let cfg = load_config(args)?;
    let mut graph = build_graph(args, &cfg)?;
    let opts = dot_options(&cfg, legend, rankdir);

    if outputs.is_empty() {
        print!("{}", DotGenerator::new().generate_dot_with_options(&graph, &opts)?);
    }
    if let Some(path) = &outputs.dot {
        fs::write(path, DotGenerator::new().generate_dot_with_options(&graph, &opts)?)?;
    }
    if let Some(path) = &outputs.svg {
        fs::write(path, SvgGenerator::new().generate_svg_with_options(&graph, &opts)?)?;
    }
    if let Some(path) = &outputs.json {
        graph.save_json(path)?;
    }
    info!("{}", graph.stats());
    Ok(())
}

fn run_stats(args: &GraphArgs, format: OutputFormat) -> Result<(), ImportGrapherError> {
    let cfg = load_config(args)?;
    let mut graph = build_graph(args, &cfg)?;
    let stats = graph.stats();
    match format {
        OutputFormat::Json => {
            let out = serde_json::to_string_pretty(&stats)
                .map_err(|e| ImportGrapherError::Io(io::Error::other(e.to_string())))?;
            println!("{out}");
        }
        OutputFormat::Text => {
            let rows = vec![
                vec!["modules".to_string(), stats.modules.to_string()],
                vec!["single parent".to_string(), stats.single_parent.to_string()],
                vec!["roots".to_string(), stats.roots.to_string()],
                vec!["broken".to_string(), stats.broken.to_string()],
                vec!["import edges".to_string(), stats.edges.to_string()],
            ];
            println!("{}", crate::utils::table::render(&["Metric", "Count"], &rows));
        }
    }
    Ok(())
}
