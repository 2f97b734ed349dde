//! Shared helpers for CLI commands.
//!
//! Workspace discovery, configuration loading, logging setup and path display.

use std::path::{Path, PathBuf};

use texforge_build::{BuildOrchestrator, CommandStrategy};
use texforge_common::normalize_path;
use texforge_config::{load_config_from_str, load_config_or_default, WorkspaceConfig, CONFIG_FILE};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::GlobalArgs;

/// A workspace directory together with its configuration.
pub struct Workspace {
    /// The workspace boundary.
    pub dir: PathBuf,
    /// The effective configuration, CLI overrides applied.
    pub config: WorkspaceConfig,
}

impl Workspace {
    /// Absolute path of the build cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.dir.join(&self.config.build.cache_dir)
    }

    /// Creates an orchestrator using the configured compiler.
    pub fn orchestrator(&self) -> BuildOrchestrator {
        let strategy = CommandStrategy::from(&self.config.compiler);
        BuildOrchestrator::new(&self.dir, &self.config, strategy)
    }

    /// Renders `path` relative to the workspace when it lies inside it.
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Installs the stderr log subscriber.
///
/// `--verbose` and `--quiet` pick the level; otherwise `RUST_LOG` applies,
/// defaulting to warnings.
pub fn init_tracing(global: &GlobalArgs) {
    let filter = if global.verbose {
        EnvFilter::new("debug")
    } else if global.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

/// Walks up from `start` looking for the nearest directory containing `texforge.toml`.
pub fn find_workspace(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}

/// Determines the workspace directory and loads its configuration.
///
/// An explicit `--config` file is loaded strictly; otherwise a missing
/// `texforge.toml` means defaults. `--no-incremental` is applied last.
pub fn load_workspace(global: &GlobalArgs) -> Result<Workspace, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config_file = global.config.as_ref().map(|c| normalize_path(Path::new(c)));

    let dir = match (&global.workspace, &config_file) {
        (Some(ws), _) => normalize_path(Path::new(ws)),
        (None, Some(file)) => file.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone()),
        (None, None) => find_workspace(&cwd).unwrap_or(cwd),
    };
    if !dir.is_dir() {
        return Err(format!("workspace directory not found: {}", dir.display()).into());
    }

    let mut config = match &config_file {
        Some(file) => {
            let content = std::fs::read_to_string(file)
                .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
            load_config_from_str(&content)?
        }
        None => load_config_or_default(&dir)?,
    };
    if global.no_incremental {
        config.build.incremental = false;
    }
    tracing::debug!(workspace = %dir.display(), "workspace loaded");

    Ok(Workspace { dir, config })
}

/// Resolves a command-line file argument to an existing absolute path.
pub fn resolve_document(file: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = normalize_path(Path::new(file));
    if !path.is_file() {
        return Err(format!("file not found: {file}").into());
    }
    Ok(path)
}
