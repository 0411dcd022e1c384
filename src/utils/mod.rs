// Small helpers shared by the CLI: table output, config files, logging setup.
pub mod table {
    fn width(s: &str) -> usize {
        s.chars().count()
    }

    fn sep(widths: &[usize]) -> String {
        let mut s = String::from("+");
        for w in widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    }

    // Text cells are left aligned, numeric cells right aligned.
    fn line(cells: &[String], widths: &[usize]) -> String {
        let mut s = String::from("|");
        for (cell, w) in cells.iter().zip(widths) {
            let pad = " ".repeat(w.saturating_sub(width(cell)));
            let numeric = !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit());
            s.push(' ');
            if numeric {
                s.push_str(&pad);
                s.push_str(cell);
            } else {
                s.push_str(cell);
                s.push_str(&pad);
            }
            s.push_str(" |");
        }
        s
    }

    /// Render an ASCII table. Missing cells are blank, extra cells are ignored.
    #[must_use]
    pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
        let cols = headers.len();
        let mut widths: Vec<usize> = headers.iter().map(|h| width(h)).collect();
        for row in rows {
            for (c, w) in widths.iter_mut().enumerate() {
                *w = (*w).max(row.get(c).map_or(0, |s| width(s)));
            }
        }

        let rule = sep(&widths);
        let header_cells: Vec<String> = headers.iter().map(|s| (*s).to_string()).collect();
        let mut out = vec![rule.clone(), line(&header_cells, &widths), rule.clone()];
        for row in rows {
            let cells: Vec<String> =
                (0..cols).map(|i| row.get(i).cloned().unwrap_or_default()).collect();
            out.push(line(&cells, &widths));
        }
        out.push(rule);
        out.join("\n")
    }

}

pub mod config {
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::errors::ImportGrapherError;
    use crate::visualization::RankDir;

    pub const CONFIG_FILE_NAME: &str = "import-grapher.toml";

    #[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
    #[serde(deny_unknown_fields)]
    pub struct GraphConfig {
        pub include_tests: Option<bool>,
        pub include_externals: Option<bool>,
        pub require_roots: Option<bool>,
        pub grow: Option<i64>,
    }

    #[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
    #[serde(deny_unknown_fields)]
    pub struct DotConfig {
        pub legend: Option<bool>,
        pub rankdir: Option<RankDir>,
    }

    #[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
    #[serde(deny_unknown_fields)]
    pub struct PaletteConfig {
        pub user_kept: Option<String>,
        pub root: Option<String>,
        pub single_parent: Option<String>,
        pub broken: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
    #[serde(deny_unknown_fields)]
    pub struct Config {
        pub graph: Option<GraphConfig>,
        pub dot: Option<DotConfig>,
        pub palette: Option<PaletteConfig>,
    }

    /// Parse the config file at `path`.
    ///
    /// # Errors
    /// Returns `ImportGrapherError::Config` if the file cannot be read or is not valid.
    pub fn load_config_at(path: &Path) -> Result<Config, ImportGrapherError> {
        let err = |message: String| ImportGrapherError::Config { file: path.to_path_buf(), message };
        let data = fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        toml::from_str::<Config>(&data).map_err(|e| err(e.to_string()))
    }

    #[must_use]
    pub fn default_config_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// Load `import-grapher.toml` from `dir` if it exists.
    ///
    /// # Errors
    /// Same as [`load_config_at`] when the file exists but is invalid.
    pub fn load_config_near(dir: &Path) -> Result<Option<Config>, ImportGrapherError> {
        let p = default_config_path(dir);
        if p.is_file() {
            load_config_at(&p).map(Some)
        } else {
            Ok(None)
        }
    }
}

pub mod logging {
    use std::io::IsTerminal;
    use tracing_subscriber::EnvFilter;

    /// Default directive for the given verbosity flags. `quiet` wins over `verbose`.
    #[must_use]
    pub fn default_level(verbose: bool, quiet: bool) -> &'static str {
        if quiet {
            "warn"
        } else if verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Install the stderr subscriber. `RUST_LOG` takes precedence over the flags.
    /// Calling it twice is harmless; the first subscriber stays.
    pub fn init(verbose: bool, quiet: bool) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level(verbose, quiet)));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false)
            .without_time()
            .try_init();
    }
}
