//! Configuration types deserialized from `texforge.toml`.

use serde::Deserialize;

/// Default change-count threshold at or above which the planner forces a full build.
pub const DEFAULT_CHANGE_THRESHOLD: usize = 3;

/// The top-level workspace configuration parsed from `texforge.toml`.
///
/// Every section is optional; an absent file or section yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Project-level settings (explicit root override).
    pub project: ProjectSection,
    /// Incremental build policy and cache location.
    pub build: BuildConfig,
    /// Directive scanning settings (extensions, magic comments).
    pub scan: ScanConfig,
    /// Root resolution policy.
    pub root: RootConfig,
    /// External compiler command.
    pub compiler: CompilerConfig,
}

/// Project-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    /// Explicit root document, relative to the workspace directory.
    ///
    /// When set and the file exists, root resolution stops here.
    pub root: Option<String>,
}

/// Incremental build policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Whether incremental and partial plans may be produced at all.
    pub incremental: bool,
    /// Number of changed files at or above which a full build is forced.
    pub change_threshold: usize,
    /// Whether a build with no changed files skips compilation entirely.
    pub skip_unchanged: bool,
    /// Cache directory, relative to the workspace directory.
    pub cache_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
            skip_unchanged: true,
            cache_dir: ".texforge".to_string(),
        }
    }
}

/// Directive scanning settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Extension appended to extensionless subdocument targets.
    pub source_extension: String,
    /// Extension appended to bibliography names that lack it.
    pub bibliography_extension: String,
    /// Ordered extensions tried when an image reference has no extension.
    pub image_extensions: Vec<String>,
    /// Whether `% !TEX root = ...` comments participate in root resolution.
    pub magic_comments: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_extension: "tex".to_string(),
            bibliography_extension: "bib".to_string(),
            image_extensions: ["pdf", "png", "jpg", "jpeg", "eps", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
            magic_comments: true,
        }
    }
}

/// Root resolution policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RootConfig {
    /// Which ancestor directory wins when several hold a valid root.
    pub ancestor_order: AncestorOrder,
}

/// Order in which ancestor directories are searched for a root document.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AncestorOrder {
    /// Closest directory to the document first (default).
    #[default]
    Nearest,
    /// Workspace boundary first, walking down toward the document.
    Furthest,
}

/// External compiler command.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Program name or path.
    pub program: String,
    /// Arguments passed before the root document path.
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "latexmk".to_string(),
            args: ["-pdf", "-interaction=nonstopmode", "-file-line-error"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
