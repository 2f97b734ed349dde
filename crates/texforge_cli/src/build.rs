//! Implementation of the `texforge build` command.

use texforge_build::{BuildStatus, PlanKind};

use crate::pipeline::{load_workspace, resolve_document};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `texforge build` command.
///
/// Returns exit code 0 when the build succeeded or was skipped, 1 when the
/// compiler failed.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let workspace = load_workspace(global)?;
    let document = resolve_document(&args.file)?;
    let orchestrator = workspace.orchestrator();

    let report = orchestrator.build(&document)?;
    let root = workspace.display(&report.resolution.root);

    if !global.quiet {
        eprintln!("   Root {root} ({})", report.resolution.source);
        eprintln!("   Plan {} ({})", report.plan.kind, report.plan.reason);
        if report.plan.kind == PlanKind::Partial {
            for target in &report.plan.targets {
                eprintln!("        {}", workspace.display(target));
            }
        }
    }

    match report.status {
        BuildStatus::Skipped => {
            if !global.quiet {
                eprintln!("  Fresh {root}");
            }
            Ok(0)
        }
        BuildStatus::Succeeded => {
            if !global.quiet {
                match report.outcome.as_ref().and_then(|o| o.output_artifact.as_ref()) {
                    Some(artifact) => eprintln!("  Built {}", workspace.display(artifact)),
                    None => eprintln!("  Built {root}"),
                }
            }
            Ok(0)
        }
        BuildStatus::Failed => {
            if let Some(outcome) = &report.outcome {
                eprint!("{}", outcome.raw_log);
            }
            eprintln!("error: build of {root} failed");
            Ok(1)
        }
    }
}
