//! The build cache store.
//!
//! [`BuildCacheStore`] is the single owner of every [`BuildCacheRecord`] in a
//! workspace. Records sit in one in-memory map behind a mutex, and the map is
//! written back to disk while the lock is held, so concurrent builds of
//! different roots cannot interleave their writes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use texforge_common::{normalize_path, now_millis};
use texforge_graph::{DependencyScanner, ProjectGraph, ScanOptions};
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::hasher::ContentHasher;
use crate::record::{BuildCacheRecord, CacheFile, CACHE_FILE};

/// Result of comparing a root's current state against its record.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    /// The freshly scanned dependency graph.
    pub graph: ProjectGraph,

    /// Files that are new, modified, or missing since the last build.
    /// Graph order, root first, followed by dependencies that vanished.
    pub changed: Vec<PathBuf>,

    /// Whether a record existed for the root.
    pub has_record: bool,
}

impl ChangeSet {
    /// Returns `true` if nothing changed since the last recorded build.
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// Returns `true` if the root document itself is among the changes.
    pub fn root_changed(&self) -> bool {
        let root = self.graph.root_path();
        self.changed.iter().any(|p| p == root)
    }
}

/// Per-root summary for [`CacheStatistics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootStatistics {
    /// The root document.
    pub root: PathBuf,
    /// Number of file entries in the record.
    pub entry_count: usize,
    /// When the root was last built successfully.
    pub last_build_ms: u64,
}

/// Read-only summary of the store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatistics {
    /// Number of roots with a record.
    pub record_count: usize,
    /// Entries across all records.
    pub entry_count: usize,
    /// One summary per root, sorted by path.
    pub roots: Vec<RootStatistics>,
}

/// Persisted, per-root record of the last successful build.
///
/// Loading never fails: a missing, corrupt or incompatible cache file yields
/// an empty store. Write failures are logged and swallowed by every mutating
/// operation; [`flush`](Self::flush) is the only place they surface.
pub struct BuildCacheStore {
    cache_dir: PathBuf,
    scanner: DependencyScanner,
    state: Mutex<CacheFile>,
}

impl BuildCacheStore {
    /// Loads the store from `cache_dir`, or starts empty.
    pub fn load(cache_dir: &Path, options: ScanOptions) -> Self {
        let state = match CacheFile::load(cache_dir) {
            Some(file) if file.is_compatible() => file,
            Some(file) => {
                info!(
                    found = file.format_version,
                    "ignoring build cache written by an incompatible version"
                );
                CacheFile::new()
            }
            None => CacheFile::new(),
        };
        debug!(
            cache_dir = %cache_dir.display(),
            records = state.records.len(),
            "build cache loaded"
        );
        Self {
            cache_dir: cache_dir.to_path_buf(),
            scanner: DependencyScanner::new(options),
            state: Mutex::new(state),
        }
    }

    /// The directory holding the cache file.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Full path of the persisted cache file.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// The scanner used to enumerate dependency sets.
    pub fn scanner(&self) -> &DependencyScanner {
        &self.scanner
    }

    /// Returns a copy of the record for `root`, if any.
    pub fn record(&self, root: &Path) -> Option<BuildCacheRecord> {
        let root = normalize_path(root);
        self.state.lock().records.get(&root).cloned()
    }

    /// Returns `true` if `root` has been built successfully before.
    pub fn has_record(&self, root: &Path) -> bool {
        let root = normalize_path(root);
        self.state.lock().records.contains_key(&root)
    }

    /// Rescans `root` and compares every reachable file against its record.
    ///
    /// A file is changed when it has no entry, its content hash differs, or it
    /// cannot be read. Without a record every file is changed. Dependencies from
    /// the previous build that no longer exist are reported too.
    pub fn detect_changes(&self, root: &Path) -> ChangeSet {
        let root = normalize_path(root);
        let graph = self.scanner.resolve_dependencies(&root);
        let record = self.record(&root);

        let Some(record) = record else {
            let changed = graph.paths().map(Path::to_path_buf).collect();
            return ChangeSet {
                graph,
                changed,
                has_record: false,
            };
        };

        let mut changed: Vec<PathBuf> = graph
            .paths()
            .filter(|path| {
                let current = ContentHasher::hash(path);
                let previous = record.entries.get(*path).map(|e| e.content_hash);
                current.is_none() || current != previous
            })
            .map(Path::to_path_buf)
            .collect();

        let seen: BTreeSet<&Path> = changed.iter().map(PathBuf::as_path).collect();
        let vanished: Vec<PathBuf> = record
            .dependencies
            .iter()
            .filter(|dep| !graph.contains(dep) && !seen.contains(dep.as_path()) && !dep.exists())
            .cloned()
            .collect();
        changed.extend(vanished);

        debug!(
            root = %root.display(),
            changed = changed.len(),
            "change detection complete"
        );
        ChangeSet {
            graph,
            changed,
            has_record: true,
        }
    }

    /// Returns the files that changed since the last successful build of `root`.
    pub fn changed_files(&self, root: &Path) -> Vec<PathBuf> {
        self.detect_changes(root).changed
    }

    /// Records the current state of `root`'s dependency set.
    ///
    /// Call only after a successful build. The previous record is replaced, not
    /// merged, and the store is persisted before returning.
    pub fn update_cache(&self, root: &Path) {
        let graph = self.scanner.resolve_dependencies(&normalize_path(root));
        self.commit(self.snapshot(&graph));
    }

    /// Fingerprints every file of `graph` as it is on disk right now.
    ///
    /// Take the snapshot before compiling and [`commit`](Self::commit) it once
    /// the compile succeeds, so edits saved mid-compile stay visible as changes.
    /// Files that cannot be read get no entry.
    pub fn snapshot(&self, graph: &ProjectGraph) -> BuildCacheRecord {
        let entries = graph
            .paths()
            .filter_map(|path| ContentHasher::snapshot(path).map(|e| (path.to_path_buf(), e)))
            .collect();
        BuildCacheRecord {
            root: graph.root_path().to_path_buf(),
            entries,
            dependencies: graph.dependencies(),
            last_build_ms: 0,
        }
    }

    /// Stores `record` as the last successful build of its root.
    ///
    /// The previous record is replaced wholesale and the store is persisted
    /// before returning. The build time is stamped here.
    pub fn commit(&self, mut record: BuildCacheRecord) {
        record.last_build_ms = now_millis();
        let root = record.root.clone();
        let files = record.entries.len();

        let mut state = self.state.lock();
        state.records.insert(root.clone(), record);
        debug!(root = %root.display(), files, "build cache updated");
        self.persist(&state);
    }

    /// Removes the record for `root`. Returns `true` if one existed.
    pub fn clear(&self, root: &Path) -> bool {
        let root = normalize_path(root);
        let mut state = self.state.lock();
        let removed = state.records.remove(&root).is_some();
        if removed {
            self.persist(&state);
        }
        removed
    }

    /// Removes every record.
    pub fn clear_all(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        self.persist(&state);
    }

    /// Summarizes the store contents.
    pub fn statistics(&self) -> CacheStatistics {
        let state = self.state.lock();
        let roots: Vec<RootStatistics> = state
            .records
            .values()
            .map(|r| RootStatistics {
                root: r.root.clone(),
                entry_count: r.entries.len(),
                last_build_ms: r.last_build_ms,
            })
            .collect();
        CacheStatistics {
            record_count: roots.len(),
            entry_count: roots.iter().map(|r| r.entry_count).sum(),
            roots,
        }
    }

    /// Writes the store to disk, returning any error.
    pub fn flush(&self) -> Result<(), CacheError> {
        let state = self.state.lock();
        state.save(&self.cache_dir)
    }

    fn persist(&self, state: &CacheFile) {
        if let Err(e) = state.save(&self.cache_dir) {
            warn!(error = %e, "failed to persist build cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    struct Project {
        dir: tempfile::TempDir,
    }

    impl Project {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, name: &str, text: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, text).unwrap();
            path
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn cache_dir(&self) -> PathBuf {
            self.dir.path().join(".texforge")
        }

        fn store(&self) -> BuildCacheStore {
            BuildCacheStore::load(&self.cache_dir(), ScanOptions::default())
        }
    }

    fn paper(project: &Project) -> PathBuf {
        project.write("intro.tex", "\\section{Intro}");
        project.write("results.tex", "\\section{Results}");
        project.write("refs.bib", "@article{a}");
        project.write(
            "paper.tex",
            "\\documentclass{article}\n\\begin{document}\n\\include{intro}\n\\include{results}\n\\bibliography{refs}\n\\end{document}\n",
        )
    }

    #[test]
    fn no_record_reports_everything() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();

        let changes = store.detect_changes(&root);
        assert!(!changes.has_record);
        assert_eq!(changes.changed.len(), 4);
        assert_eq!(changes.changed[0], root);
        assert!(changes.root_changed());
    }

    #[test]
    fn cache_hit_after_update() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();

        store.update_cache(&root);
        assert!(store.changed_files(&root).is_empty());
        assert_eq!(store.record(&root).unwrap().entries.len(), 4);
    }

    #[test]
    fn content_change_detected_without_mtime_change() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();
        store.update_cache(&root);

        let results = project.path("results.tex");
        let mtime = fs::metadata(&results).unwrap().modified().unwrap();
        fs::write(&results, "\\section{Better results}").unwrap();
        let file = fs::File::options().write(true).open(&results).unwrap();
        file.set_modified(mtime).unwrap();

        assert_eq!(store.changed_files(&root), vec![results]);
    }

    #[test]
    fn touch_without_content_change_is_not_a_change() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();
        store.update_cache(&root);

        project.write("intro.tex", "\\section{Intro}");
        assert!(store.changed_files(&root).is_empty());
    }

    #[test]
    fn deleted_dependency_reported() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();
        store.update_cache(&root);

        let refs = project.path("refs.bib");
        fs::remove_file(&refs).unwrap();
        assert_eq!(store.changed_files(&root), vec![refs]);
    }

    #[test]
    fn new_dependency_reported() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();
        store.update_cache(&root);

        project.write("results.tex", "\\section{Results}\n\\input{table}");
        let table = project.write("table.tex", "a & b");
        let changed = store.changed_files(&root);
        assert_eq!(changed, vec![project.path("results.tex"), table]);
    }

    #[test]
    fn commit_keeps_snapshot_taken_before_edit() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();

        let graph = store.scanner().resolve_dependencies(&root);
        let snapshot = store.snapshot(&graph);
        let intro = project.write("intro.tex", "\\section{Saved while compiling}");
        store.commit(snapshot);

        assert_eq!(store.changed_files(&root), vec![intro]);
        assert!(store.record(&root).unwrap().last_build_ms > 0);
    }

    #[test]
    fn commit_replaces_previous_record() {
        let project = Project::new();
        let root = paper(&project);
        let store = project.store();
        store.update_cache(&root);

        project.write(
            "paper.tex",
            "\\documentclass{article}\n\\begin{document}\n\\include{intro}\n\\end{document}\n",
        );
        let graph = store.scanner().resolve_dependencies(&root);
        store.commit(store.snapshot(&graph));

        let record = store.record(&root).unwrap();
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.dependencies, vec![project.path("intro.tex")]);
    }

    #[test]
    fn records_survive_reload() {
        let project = Project::new();
        let root = paper(&project);
        project.store().update_cache(&root);

        let reloaded = project.store();
        assert!(reloaded.has_record(&root));
        assert!(reloaded.changed_files(&root).is_empty());
    }

    #[test]
    fn corrupt_cache_file_starts_empty() {
        let project = Project::new();
        let root = paper(&project);
        fs::create_dir_all(project.cache_dir()).unwrap();
        fs::write(project.cache_dir().join(CACHE_FILE), "[1, 2").unwrap();

        let store = project.store();
        assert!(!store.has_record(&root));
        assert_eq!(store.statistics(), CacheStatistics::default());
    }

    #[test]
    fn incompatible_cache_file_starts_empty() {
        let project = Project::new();
        let root = paper(&project);
        project.store().update_cache(&root);

        let path = project.cache_dir().join(CACHE_FILE);
        let mut file = CacheFile::load(&project.cache_dir()).unwrap();
        file.format_version += 1;
        fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();

        assert!(!project.store().has_record(&root));
    }

    #[test]
    fn clear_and_clear_all() {
        let project = Project::new();
        let a = project.write("a.tex", "\\documentclass{article}");
        let b = project.write("b.tex", "\\documentclass{article}");
        let store = project.store();
        store.update_cache(&a);
        store.update_cache(&b);

        assert!(store.clear(&a));
        assert!(!store.clear(&a));
        assert!(!project.store().has_record(&a));
        assert!(project.store().has_record(&b));

        store.clear_all();
        assert_eq!(project.store().statistics().record_count, 0);
    }

    #[test]
    fn statistics_summarize_records() {
        let project = Project::new();
        let root = paper(&project);
        let other = project.write("other.tex", "\\documentclass{article}");
        let store = project.store();
        store.update_cache(&root);
        store.update_cache(&other);

        let stats = store.statistics();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.entry_count, 5);
        let paper_stats = stats.roots.iter().find(|r| r.root == root).unwrap();
        assert_eq!(paper_stats.entry_count, 4);
        assert!(paper_stats.last_build_ms > 0);
    }

    #[test]
    fn unwritable_cache_dir_is_swallowed() {
        let project = Project::new();
        let root = paper(&project);
        let blocker = project.write("blocked", "not a directory");
        let store = BuildCacheStore::load(&blocker.join("cache"), ScanOptions::default());

        store.update_cache(&root);
        assert!(store.changed_files(&root).is_empty());
        assert!(store.flush().is_err());
    }

    #[test]
    fn concurrent_updates_of_different_roots() {
        let project = Project::new();
        let roots: Vec<PathBuf> = (0..8)
            .map(|i| {
                project.write(&format!("part{i}.tex"), "text");
                project.write(
                    &format!("root{i}.tex"),
                    &format!("\\documentclass{{article}}\n\\input{{part{i}}}"),
                )
            })
            .collect();
        let store = Arc::new(project.store());

        std::thread::scope(|scope| {
            for root in &roots {
                let store = Arc::clone(&store);
                scope.spawn(move || store.update_cache(root));
            }
        });

        let reloaded = project.store();
        assert_eq!(reloaded.statistics().record_count, roots.len());
        for root in &roots {
            assert!(reloaded.changed_files(root).is_empty());
        }
    }
}
