//! Incremental build planning and orchestration.
//!
//! Given any document in a workspace, this crate finds its root, decides from
//! the build cache whether a full, incremental, partial or no build is needed,
//! runs a [`CompileStrategy`], and records the result.

#![warn(missing_docs)]

pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod strategy;

pub use error::BuildError;
pub use orchestrator::{BuildOrchestrator, BuildReport, BuildStatus};
pub use planner::{classify, BuildPlan, IncrementalPlanner, PlanKind, PlanReason, PlannerPolicy};
pub use strategy::{CommandStrategy, CompileOutcome, CompileStrategy};
