//! Build planning from detected changes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use texforge_cache::{BuildCacheStore, ChangeSet};
use texforge_config::{BuildConfig, DEFAULT_CHANGE_THRESHOLD};
use tracing::info;

/// The kind of build a root needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// Compile everything from scratch.
    Full,
    /// Recompile the whole project; the change set is small and non-structural.
    Incremental,
    /// Only the listed sectioned subdocuments need recompiling.
    Partial,
    /// Nothing changed since the last successful build.
    Unchanged,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Partial => "partial",
            Self::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Why the planner chose a [`PlanKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PlanReason {
    /// The root has never been built successfully.
    NoRecord,
    /// The root document itself changed.
    RootChanged,
    /// No file changed.
    NothingChanged,
    /// Incremental builds are turned off.
    IncrementalDisabled,
    /// Too many files changed.
    ThresholdReached {
        /// Number of changed files.
        changed: usize,
        /// Configured threshold.
        threshold: usize,
    },
    /// Every change sits behind sectioned inclusions only.
    SectionedOnly,
    /// Some change is merged into its parent or is not a subdocument.
    MixedChanges,
}

impl fmt::Display for PlanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecord => f.write_str("no previous build recorded"),
            Self::RootChanged => f.write_str("root document changed"),
            Self::NothingChanged => f.write_str("no files changed"),
            Self::IncrementalDisabled => f.write_str("incremental builds disabled"),
            Self::ThresholdReached { changed, threshold } => {
                write!(f, "{changed} files changed (threshold {threshold})")
            }
            Self::SectionedOnly => f.write_str("only sectioned subdocuments changed"),
            Self::MixedChanges => f.write_str("changes affect merged content"),
        }
    }
}

/// Tunable planning policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlannerPolicy {
    /// When `false`, every build with changes is planned as full.
    pub incremental_enabled: bool,
    /// Change counts at or above this force a full build.
    pub change_threshold: usize,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            incremental_enabled: true,
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
        }
    }
}

impl From<&BuildConfig> for PlannerPolicy {
    fn from(config: &BuildConfig) -> Self {
        Self {
            incremental_enabled: config.incremental,
            change_threshold: config.change_threshold,
        }
    }
}

/// A planning decision for one root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// The root document.
    pub root: PathBuf,
    /// What kind of build to run.
    pub kind: PlanKind,
    /// Files to recompile for [`PlanKind::Partial`]; empty otherwise.
    pub targets: Vec<PathBuf>,
    /// Every file that changed since the last successful build.
    pub changed: Vec<PathBuf>,
    /// Why this kind was chosen.
    pub reason: PlanReason,
}

impl BuildPlan {
    /// Returns `true` if the plan calls for no compilation.
    pub fn is_unchanged(&self) -> bool {
        self.kind == PlanKind::Unchanged
    }
}

/// Classifies a change set under `policy`.
///
/// Rules apply in order, first match wins: no record or a changed root is
/// full; no changes is unchanged; disabled incremental builds are full; a
/// change count at the threshold is full; changes reached only through
/// sectioned inclusions are partial; anything else is incremental.
pub fn classify(changes: &ChangeSet, policy: &PlannerPolicy) -> BuildPlan {
    let graph = &changes.graph;
    let plan = |kind, targets, reason| BuildPlan {
        root: graph.root_path().to_path_buf(),
        kind,
        targets,
        changed: changes.changed.clone(),
        reason,
    };

    if !changes.has_record {
        return plan(PlanKind::Full, Vec::new(), PlanReason::NoRecord);
    }
    if changes.root_changed() {
        return plan(PlanKind::Full, Vec::new(), PlanReason::RootChanged);
    }
    if changes.is_empty() {
        return plan(PlanKind::Unchanged, Vec::new(), PlanReason::NothingChanged);
    }
    if !policy.incremental_enabled {
        return plan(PlanKind::Full, Vec::new(), PlanReason::IncrementalDisabled);
    }
    let count = changes.changed.len();
    if count >= policy.change_threshold {
        return plan(
            PlanKind::Full,
            Vec::new(),
            PlanReason::ThresholdReached {
                changed: count,
                threshold: policy.change_threshold,
            },
        );
    }

    let sectioned_only = changes.changed.iter().all(|path| {
        graph
            .id_of(path)
            .is_some_and(|id| graph.is_sectioned_only(id))
    });
    if sectioned_only {
        plan(PlanKind::Partial, changes.changed.clone(), PlanReason::SectionedOnly)
    } else {
        plan(PlanKind::Incremental, Vec::new(), PlanReason::MixedChanges)
    }
}

/// Decides how a root should be built, based on its build cache.
#[derive(Debug, Clone, Default)]
pub struct IncrementalPlanner {
    policy: PlannerPolicy,
}

impl IncrementalPlanner {
    /// Creates a planner with the given policy.
    pub fn new(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// Detects changes for `root` and classifies them.
    pub fn plan(&self, store: &BuildCacheStore, root: &Path) -> BuildPlan {
        self.plan_changes(&store.detect_changes(root))
    }

    /// Classifies an already detected change set.
    pub fn plan_changes(&self, changes: &ChangeSet) -> BuildPlan {
        let plan = classify(changes, &self.policy);
        info!(
            root = %plan.root.display(),
            kind = %plan.kind,
            changed = plan.changed.len(),
            reason = %plan.reason,
            "build planned"
        );
        plan
    }
}
