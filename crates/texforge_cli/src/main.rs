//! The `texforge` command-line interface for incremental LaTeX builds.
//!
//! Provides `texforge build` for cached builds, `texforge root`, `deps` and
//! `plan` for inspecting what a build would do, and `texforge cache` for
//! managing the build cache.

#![warn(missing_docs)]

mod build;
mod cache;
mod inspect;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Incremental builds for multi-file LaTeX projects.
#[derive(Parser, Debug)]
#[command(name = "texforge", version, about = "Incremental LaTeX build engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace directory. Defaults to the nearest directory holding
    /// `texforge.toml`, or the current directory.
    #[arg(short, long, global = true)]
    pub workspace: Option<String>,

    /// Path to a custom `texforge.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Plan every build with changes as a full build.
    #[arg(long, global = true)]
    pub no_incremental: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project containing a file.
    Build(BuildArgs),
    /// Show the root document of a file and how it was found.
    Root(InspectArgs),
    /// Show the dependency graph of a file's root.
    Deps(InspectArgs),
    /// Show the build plan for a file without compiling.
    Plan(InspectArgs),
    /// Inspect or clear the build cache.
    Cache {
        /// The cache operation.
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Arguments for the `texforge build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Any `.tex` file of the project.
    pub file: String,
}

/// Arguments shared by the inspection subcommands.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Any `.tex` file of the project.
    pub file: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Build cache operations.
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics.
    Stats {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Remove the record for one root, or every record.
    Clear {
        /// Root document whose record to remove. Clears everything if omitted.
        root: Option<String>,
    },
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional workspace directory.
    pub workspace: Option<String>,
    /// Optional path to a custom config file.
    pub config: Option<String>,
    /// Whether incremental planning is turned off for this run.
    pub no_incremental: bool,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        workspace: cli.workspace,
        config: cli.config,
        no_incremental: cli.no_incremental,
    };
    pipeline::init_tracing(&global);

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Root(ref args) => inspect::root(args, &global),
        Command::Deps(ref args) => inspect::deps(args, &global),
        Command::Plan(ref args) => inspect::plan(args, &global),
        Command::Cache { ref action } => cache::run(action, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_build() {
        let cli = Cli::parse_from(["texforge", "build", "chapters/intro.tex"]);
        match cli.command {
            Command::Build(ref args) => assert_eq!(args.file, "chapters/intro.tex"),
            _ => panic!("expected Build command"),
        }
        assert!(!cli.no_incremental);
    }

    #[test]
    fn parse_root_default_format() {
        let cli = Cli::parse_from(["texforge", "root", "intro.tex"]);
        match cli.command {
            Command::Root(ref args) => {
                assert_eq!(args.file, "intro.tex");
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Root command"),
        }
    }

    #[test]
    fn parse_deps_json() {
        let cli = Cli::parse_from(["texforge", "deps", "main.tex", "--format", "json"]);
        match cli.command {
            Command::Deps(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Deps command"),
        }
    }

    #[test]
    fn parse_plan() {
        let cli = Cli::parse_from(["texforge", "plan", "main.tex"]);
        assert!(matches!(cli.command, Command::Plan(_)));
    }

    #[test]
    fn parse_cache_stats() {
        let cli = Cli::parse_from(["texforge", "cache", "stats", "-f", "json"]);
        match cli.command {
            Command::Cache {
                action: CacheAction::Stats { format },
            } => assert_eq!(format, ReportFormat::Json),
            _ => panic!("expected Cache Stats command"),
        }
    }

    #[test]
    fn parse_cache_clear() {
        let cli = Cli::parse_from(["texforge", "cache", "clear"]);
        match cli.command {
            Command::Cache {
                action: CacheAction::Clear { root },
            } => assert!(root.is_none()),
            _ => panic!("expected Cache Clear command"),
        }

        let cli = Cli::parse_from(["texforge", "cache", "clear", "thesis.tex"]);
        match cli.command {
            Command::Cache {
                action: CacheAction::Clear { root },
            } => assert_eq!(root.as_deref(), Some("thesis.tex")),
            _ => panic!("expected Cache Clear command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "texforge",
            "--quiet",
            "--no-incremental",
            "--workspace",
            "/work/thesis",
            "build",
            "main.tex",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert!(cli.no_incremental);
        assert_eq!(cli.workspace.as_deref(), Some("/work/thesis"));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "texforge",
            "plan",
            "main.tex",
            "--verbose",
            "--config",
            "/work/texforge.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("/work/texforge.toml"));
    }

    #[test]
    fn missing_file_argument_rejected() {
        assert!(Cli::try_parse_from(["texforge", "build"]).is_err());
    }
}
