//! End-to-end build requests.
//!
//! A request for any document runs resolve root, plan, compile, and record.
//! The cache only advances after a successful compile. Requests for the same
//! root are queued behind a per-root lock and re-plan once they get it, so a
//! queued duplicate usually finds nothing left to do. Different roots build
//! concurrently.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use texforge_cache::BuildCacheStore;
use texforge_common::normalize_path;
use texforge_config::WorkspaceConfig;
use texforge_graph::{DependencyScanner, RootResolution, RootResolver, ScanOptions};
use tracing::{info, warn};

use crate::error::BuildError;
use crate::planner::{BuildPlan, IncrementalPlanner, PlanKind, PlannerPolicy};
use crate::strategy::{CommandStrategy, CompileOutcome, CompileStrategy};

/// How a build request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    /// Nothing changed, so nothing was compiled.
    Skipped,
    /// The compiler succeeded and the cache was updated.
    Succeeded,
    /// The compiler failed; the cache was left alone.
    Failed,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Skipped => "skipped",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything that happened during one build request.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The resolved root and how it was found.
    pub resolution: RootResolution,
    /// The plan that was executed.
    pub plan: BuildPlan,
    /// The final status.
    pub status: BuildStatus,
    /// Compiler output, absent when the build was skipped.
    pub outcome: Option<CompileOutcome>,
}

/// Drives builds for one workspace.
pub struct BuildOrchestrator<S = CommandStrategy> {
    workspace: PathBuf,
    resolver: RootResolver,
    store: BuildCacheStore,
    planner: IncrementalPlanner,
    strategy: S,
    skip_unchanged: bool,
    root_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl<S: CompileStrategy> BuildOrchestrator<S> {
    /// Creates an orchestrator for `workspace`, loading its build cache.
    pub fn new(workspace: &Path, config: &WorkspaceConfig, strategy: S) -> Self {
        let workspace = normalize_path(workspace);
        let options = ScanOptions::from(&config.scan);
        let resolver = RootResolver::new(DependencyScanner::new(options.clone()))
            .with_explicit_root(config.project.root.as_ref().map(PathBuf::from))
            .with_ancestor_order(config.root.ancestor_order);
        let store = BuildCacheStore::load(&workspace.join(&config.build.cache_dir), options);
        Self {
            workspace,
            resolver,
            store,
            planner: IncrementalPlanner::new(PlannerPolicy::from(&config.build)),
            strategy,
            skip_unchanged: config.build.skip_unchanged,
            root_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The workspace boundary.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// The build cache.
    pub fn store(&self) -> &BuildCacheStore {
        &self.store
    }

    /// The compilation strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Finds the root for `document`.
    pub fn resolve_root(&self, document: &Path) -> RootResolution {
        self.resolver.resolve_root(document, &self.workspace)
    }

    /// Resolves the root for `document` and plans its build without compiling.
    pub fn plan(&self, document: &Path) -> (RootResolution, BuildPlan) {
        let resolution = self.resolve_root(document);
        let plan = self.planner.plan(&self.store, &resolution.root);
        (resolution, plan)
    }

    /// Builds the project containing `document`.
    ///
    /// Fails only when the strategy is unavailable. A compiler failure is a
    /// [`BuildStatus::Failed`] report and leaves the cache untouched.
    pub fn build(&self, document: &Path) -> Result<BuildReport, BuildError> {
        if !self.strategy.is_available() {
            return Err(BuildError::StrategyUnavailable {
                name: self.strategy.name().to_string(),
            });
        }

        let resolution = self.resolve_root(document);
        let root = resolution.root.clone();
        let lock = self.root_lock(&root);
        let report = {
            let _guard = lock.lock();
            self.build_locked(resolution)
        };
        self.release_root_lock(&root, lock);
        Ok(report)
    }

    /// Plans, compiles and records one root. The caller holds the root's lock.
    fn build_locked(&self, resolution: RootResolution) -> BuildReport {
        let changes = self.store.detect_changes(&resolution.root);
        let plan = self.planner.plan_changes(&changes);
        if plan.is_unchanged() && self.skip_unchanged {
            info!(root = %plan.root.display(), "build skipped, nothing changed");
            return BuildReport {
                resolution,
                plan,
                status: BuildStatus::Skipped,
                outcome: None,
            };
        }

        // Fingerprint before compiling: anything saved during the compile
        // must still count as changed afterwards.
        let snapshot = self.store.snapshot(&changes.graph);
        let outcome = match plan.kind {
            PlanKind::Partial => self.strategy.build_partial(&plan.root, &plan.targets),
            _ => self.strategy.build(&plan.root),
        };

        let status = if outcome.success {
            self.store.commit(snapshot);
            BuildStatus::Succeeded
        } else {
            warn!(root = %plan.root.display(), "compilation failed, build cache not updated");
            BuildStatus::Failed
        };
        info!(
            root = %plan.root.display(),
            strategy = self.strategy.name(),
            kind = %plan.kind,
            status = %status,
            "build finished"
        );

        BuildReport {
            resolution,
            plan,
            status,
            outcome: Some(outcome),
        }
    }

    fn root_lock(&self, root: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.root_locks.lock();
        Arc::clone(locks.entry(root.to_path_buf()).or_default())
    }

    /// Drops the map entry for `root` once no other request holds or awaits it.
    fn release_root_lock(&self, root: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.root_locks.lock();
        drop(lock);
        if locks.get(root).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(root);
        }
    }
}
