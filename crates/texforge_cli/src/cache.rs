//! Implementation of the `texforge cache` commands.

use std::path::{Path, PathBuf};

use texforge_build::BuildOrchestrator;
use texforge_cache::CacheStatistics;
use texforge_common::{normalize_path, now_millis};

use crate::pipeline::{load_workspace, Workspace};
use crate::{CacheAction, GlobalArgs, ReportFormat};

/// Runs a `texforge cache` subcommand.
pub fn run(action: &CacheAction, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = load_workspace(global)?;
    let orchestrator = workspace.orchestrator();
    let store = orchestrator.store();

    match action {
        CacheAction::Stats { format } => {
            let stats = store.statistics();
            match format {
                ReportFormat::Text => print_stats(&workspace, &stats),
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
        CacheAction::Clear { root: Some(file) } => {
            let root = clear_target(&orchestrator, file);
            let removed = store.clear(&root);
            store.flush()?;
            if !global.quiet {
                if removed {
                    eprintln!("Cleared build cache for {}", workspace.display(&root));
                } else {
                    eprintln!("No build cache recorded for {}", workspace.display(&root));
                }
            }
        }
        CacheAction::Clear { root: None } => {
            let count = store.statistics().record_count;
            store.clear_all();
            store.flush()?;
            if !global.quiet {
                eprintln!("Cleared {count} build cache record(s)");
            }
        }
    }
    Ok(0)
}

/// The root whose record `cache clear <file>` removes.
///
/// An existing file is resolved to its root; a path that no longer exists is
/// taken as the root itself so stale records can still be dropped.
fn clear_target(orchestrator: &BuildOrchestrator, file: &str) -> PathBuf {
    let path = normalize_path(Path::new(file));
    if path.is_file() {
        orchestrator.resolve_root(&path).root
    } else {
        path
    }
}

fn print_stats(workspace: &Workspace, stats: &CacheStatistics) {
    println!("cache: {}", workspace.display(&workspace.cache_dir()));
    println!("records: {}", stats.record_count);
    println!("entries: {}", stats.entry_count);
    let now = now_millis();
    for root in &stats.roots {
        println!(
            "  {}  {} files  built {}",
            workspace.display(&root.root),
            root.entry_count,
            age(now, root.last_build_ms)
        );
    }
}

/// Formats the time between `then_ms` and `now_ms` for humans.
fn age(now_ms: u64, then_ms: u64) -> String {
    let secs = now_ms.saturating_sub(then_ms) / 1000;
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
