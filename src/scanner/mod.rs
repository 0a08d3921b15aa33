//! File discovery and the per-file scan engine shared by both scanners.

pub mod literal;
pub mod syntax;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::types::{HitRecord, MatchSet};

pub use literal::LiteralScanner;
pub use syntax::SyntaxScanner;

/// Extensions of the language the syntax scanner understands.
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub fn is_python_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PYTHON_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Basenames to drop. Entries with glob metacharacters are matched as globs.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    names: HashSet<String>,
    globs: Option<GlobSet>,
}

impl ExcludeSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = HashSet::new();
        let mut builder = GlobSetBuilder::new();
        let mut has_globs = false;

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            names.insert(pattern.to_string());
            if pattern.contains(['*', '?', '[', '{']) {
                match Glob::new(pattern) {
                    Ok(glob) => {
                        builder.add(glob);
                        has_globs = true;
                    }
                    Err(e) => warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e),
                }
            }
        }

        let globs = if has_globs {
            builder.build().ok()
        } else {
            None
        };
        Self { names, globs }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Patterns as given, in no particular order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn matches(&self, basename: &str) -> bool {
        self.names.contains(basename)
            || self
                .globs
                .as_ref()
                .map(|set| set.is_match(basename))
                .unwrap_or(false)
    }

    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.matches(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// User-facing file filters, applied in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// When set, only files with exactly this basename pass and the other
    /// filters are ignored.
    pub exact_name: Option<String>,
    /// Extension without the dot, compared case-insensitively.
    pub extension: Option<String>,
    /// Case-insensitive basename substring.
    pub name_contains: Option<String>,
    pub exclude: ExcludeSet,
}

impl FileFilter {
    pub fn with_extension(mut self, ext: impl AsRef<str>) -> Self {
        let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
        self.extension = (!ext.is_empty()).then_some(ext);
        self
    }

    pub fn with_name_contains(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into().to_lowercase());
        self
    }

    pub fn with_exact_name(mut self, name: impl Into<String>) -> Self {
        self.exact_name = Some(name.into());
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludeSet) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return false,
        };

        if let Some(exact) = &self.exact_name {
            return name == exact.as_str();
        }

        let lower = name.to_lowercase();
        if let Some(ext) = &self.extension {
            if !lower.ends_with(&format!(".{ext}")) {
                return false;
            }
        }
        if let Some(fragment) = &self.name_contains {
            if !lower.contains(fragment.to_lowercase().as_str()) {
                return false;
            }
        }
        !self.exclude.matches(&name)
    }
}

/// Shared flag used to abandon a scan early.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub filter: FileFilter,
    pub follow_symlinks: bool,
    pub max_file_size: u64,
    /// Directory basenames pruned from the walk.
    pub skip_dirs: Vec<String>,
    pub parallel: bool,
    /// Worker count; 0 means one per CPU.
    pub threads: usize,
    pub cancel: CancelFlag,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            filter: FileFilter::default(),
            follow_symlinks: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            skip_dirs: vec![".git".to_string(), "__pycache__".to_string()],
            parallel: true,
            threads: 0,
            cancel: CancelFlag::new(),
        }
    }
}

impl ScanOptions {
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Unreadable,
    ParseError,
    Binary,
    TooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
    pub detail: String,
}

impl SkippedFile {
    pub fn new(path: &Path, reason: SkipReason, detail: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason,
            detail: detail.into(),
        }
    }
}

/// What one scan produced. `cancelled` marks a partial `matches`.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub matches: MatchSet,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
    pub cancelled: bool,
}

/// Per-file matching logic plugged into [`run_scan`].
pub trait FileMatcher: Sync {
    /// Whether the file is of a type this matcher understands.
    fn eligible(&self, path: &Path) -> bool;

    fn match_source(&self, path: &Path, source: &str) -> Result<Vec<HitRecord>, SkippedFile>;
}

enum FileOutcome {
    Hits(Vec<HitRecord>),
    Skipped(SkippedFile),
    Cancelled,
}

/// Enumerate candidate files under `root` in lexical path order.
pub fn discover_files(root: &Path, options: &ScanOptions) -> (Vec<PathBuf>, bool) {
    let skip_dirs: HashSet<&str> = options.skip_dirs.iter().map(String::as_str).collect();
    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && skip_dirs.contains(entry.file_name().to_string_lossy().as_ref()))
        });

    let mut files = Vec::new();
    let mut cancelled = false;
    for entry in walker {
        if options.cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if options.filter.accepts(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    (files, cancelled)
}

/// Read a file as text, rejecting oversized and binary content.
pub fn read_source(path: &Path, max_file_size: u64) -> Result<String, SkippedFile> {
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.len() > max_file_size {
            return Err(SkippedFile::new(
                path,
                SkipReason::TooLarge,
                format!("{} bytes", metadata.len()),
            ));
        }
    }

    let bytes = fs::read(path)
        .map_err(|e| SkippedFile::new(path, SkipReason::Unreadable, e.to_string()))?;
    if bytes.contains(&0) {
        return Err(SkippedFile::new(path, SkipReason::Binary, "binary content"));
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Walk `root`, run `matcher` over every eligible file and merge the hits in
/// path order. Per-file failures are recorded in `skipped`, never returned.
pub fn run_scan<M: FileMatcher>(root: &Path, options: &ScanOptions, matcher: &M) -> ScanOutput {
    let (files, walk_cancelled) = discover_files(root, options);
    let files: Vec<PathBuf> = files.into_iter().filter(|f| matcher.eligible(f)).collect();
    debug!("{} eligible files under {}", files.len(), root.display());

    let process = |path: &PathBuf| -> FileOutcome {
        if options.cancel.is_cancelled() {
            return FileOutcome::Cancelled;
        }
        match read_source(path, options.max_file_size)
            .and_then(|source| matcher.match_source(path, &source))
        {
            Ok(hits) => FileOutcome::Hits(hits),
            Err(skipped) => FileOutcome::Skipped(skipped),
        }
    };

    let outcomes: Vec<FileOutcome> = if options.parallel {
        let threads = if options.threads == 0 {
            num_cpus::get()
        } else {
            options.threads
        };
        let run = || files.par_iter().map(&process).collect::<Vec<_>>();
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("Falling back to the global thread pool: {}", e);
                run()
            }
        }
    } else {
        let mut outcomes = Vec::with_capacity(files.len());
        for path in &files {
            let outcome = process(path);
            let stop = matches!(outcome, FileOutcome::Cancelled);
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        outcomes
    };

    let mut output = ScanOutput {
        cancelled: walk_cancelled,
        ..ScanOutput::default()
    };
    for outcome in outcomes {
        match outcome {
            FileOutcome::Hits(hits) => {
                output.files_scanned += 1;
                output.matches.extend(hits);
            }
            FileOutcome::Skipped(skipped) => {
                debug!("Skipped {}: {:?} ({})", skipped.path.display(), skipped.reason, skipped.detail);
                output.skipped.push(skipped);
            }
            FileOutcome::Cancelled => output.cancelled = true,
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_filter_extension_and_substring() {
        let filter = FileFilter::default()
            .with_extension(".PY")
            .with_name_contains("Net");
        assert!(filter.accepts(Path::new("src/network.py")));
        assert!(!filter.accepts(Path::new("src/network.txt")));
        assert!(!filter.accepts(Path::new("src/main.py")));
    }

    #[test]
    fn test_exact_name_overrides_other_filters() {
        let filter = FileFilter::default()
            .with_extension("txt")
            .with_exact_name("setup.py")
            .with_exclude(ExcludeSet::new(["setup.py"]));
        assert!(filter.accepts(Path::new("pkg/setup.py")));
        assert!(!filter.accepts(Path::new("pkg/setup.pyc")));
        assert!(!filter.accepts(Path::new("pkg/notes.txt")));
    }

    #[test]
    fn test_exclude_set_names_and_globs() {
        let exclude = ExcludeSet::new(["conftest.py", "test_*.py"]);
        assert!(exclude.matches("conftest.py"));
        assert!(exclude.matches("test_api.py"));
        assert!(!exclude.matches("api.py"));
        assert!(exclude.matches_path(Path::new("a/b/conftest.py")));
    }

    #[test]
    fn test_discovery_is_sorted_and_prunes_skip_dirs() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "b.py", "");
        touch(&dir, "a/z.py", "");
        touch(&dir, "a/c.py", "");
        touch(&dir, ".git/config.py", "");

        let (files, cancelled) = discover_files(dir.path(), &ScanOptions::default());
        assert!(!cancelled);
        let rel: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a/c.py"),
                PathBuf::from("a/z.py"),
                PathBuf::from("b.py")
            ]
        );
    }

    #[test]
    fn test_read_source_rejects_binary_and_large() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("blob.py");
        fs::write(&bin, [0x61, 0x00, 0x62]).unwrap();
        assert_eq!(read_source(&bin, DEFAULT_MAX_FILE_SIZE).unwrap_err().reason, SkipReason::Binary);

        let big = touch(&dir, "big.py", "x = 1\n");
        assert_eq!(read_source(&big, 2).unwrap_err().reason, SkipReason::TooLarge);

        let missing = dir.path().join("missing.py");
        assert_eq!(
            read_source(&missing, DEFAULT_MAX_FILE_SIZE).unwrap_err().reason,
            SkipReason::Unreadable
        );
    }

    #[test]
    fn test_cancelled_scan_reports_partial() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.txt", "needle");
        touch(&dir, "b.txt", "needle");

        let cancel = CancelFlag::new();
        cancel.cancel();
        let options = ScanOptions::default().with_cancel(cancel).sequential();
        let output = LiteralScanner::new("needle").scan(dir.path(), &options);
        assert!(output.cancelled);
        assert!(output.matches.is_empty());
    }

    struct CancelAfterFirst(CancelFlag);

    impl FileMatcher for CancelAfterFirst {
        fn eligible(&self, _path: &Path) -> bool {
            true
        }

        fn match_source(&self, path: &Path, source: &str) -> Result<Vec<HitRecord>, SkippedFile> {
            self.0.cancel();
            Ok(vec![HitRecord::new(path, 1, source.trim())])
        }
    }

    #[test]
    fn test_cancel_mid_scan_keeps_earlier_hits() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.txt", "first");
        touch(&dir, "b.txt", "second");
        touch(&dir, "c.txt", "third");

        let cancel = CancelFlag::new();
        let options = ScanOptions::default().with_cancel(cancel.clone()).sequential();
        let output = run_scan(dir.path(), &options, &CancelAfterFirst(cancel));

        assert!(output.cancelled);
        assert_eq!(output.files_scanned, 1);
        assert_eq!(output.matches.hit_count(), 1);
        assert!(output.matches.records()[0].file_path().ends_with("a.txt"));
        assert_eq!(output.matches.records()[0].source_text(), "first");
    }
}
