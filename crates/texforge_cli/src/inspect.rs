//! Implementation of the `texforge root`, `deps` and `plan` commands.

use texforge_graph::{DependencyScanner, EdgeKind, InclusionMode, ScanOptions};

use crate::pipeline::{load_workspace, resolve_document};
use crate::{GlobalArgs, InspectArgs, ReportFormat};

/// Prints the root of a document and how it was found.
pub fn root(args: &InspectArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = load_workspace(global)?;
    let document = resolve_document(&args.file)?;
    let resolution = workspace.orchestrator().resolve_root(&document);

    match args.format {
        ReportFormat::Text => println!(
            "{} ({})",
            workspace.display(&resolution.root),
            resolution.source
        ),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
    }
    Ok(0)
}

/// Prints the dependency graph of a document's root.
pub fn deps(args: &InspectArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = load_workspace(global)?;
    let document = resolve_document(&args.file)?;
    let resolution = workspace.orchestrator().resolve_root(&document);
    let scanner = DependencyScanner::new(ScanOptions::from(&workspace.config.scan));
    let graph = scanner.resolve_dependencies(&resolution.root);

    match args.format {
        ReportFormat::Text => {
            println!("{}", workspace.display(graph.root_path()));
            for edge in graph.edges() {
                println!(
                    "  {} -> {} [{}]",
                    workspace.display(&graph.node(edge.from).path),
                    workspace.display(&graph.node(edge.to).path),
                    edge_label(edge.kind)
                );
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&graph)?),
    }
    Ok(0)
}

/// Prints the build plan for a document without compiling.
pub fn plan(args: &InspectArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = load_workspace(global)?;
    let document = resolve_document(&args.file)?;
    let (_, plan) = workspace.orchestrator().plan(&document);

    match args.format {
        ReportFormat::Text => {
            println!("{} ({})", plan.kind, plan.reason);
            for path in &plan.changed {
                let marker = if plan.targets.contains(path) { "*" } else { " " };
                println!("{marker} {}", workspace.display(path));
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(0)
}

fn edge_label(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Subdocument(InclusionMode::Mergeable) => "input",
        EdgeKind::Subdocument(InclusionMode::Sectioned) => "include",
        EdgeKind::Bibliography => "bibliography",
        EdgeKind::Image => "image",
    }
}
