//! Post-processing of a raw match set.
//!
//! Each stage takes a `&MatchSet` and returns a new one. [`Pipeline`] runs
//! them in the fixed order staged -> exclude -> (empty check) -> context ->
//! blame.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::scanner::ExcludeSet;
use crate::types::{ContextLine, HitRecord, MatchSet};
use crate::vcs::{StagedFiles, VersionControl};

/// Keep only hits in staged files.
pub fn filter_staged(matches: &MatchSet, staged: &StagedFiles) -> MatchSet {
    matches.filtered(|record| staged.contains(record.file_path()))
}

/// Drop hits whose file basename is excluded.
pub fn filter_excluded(matches: &MatchSet, exclude: &ExcludeSet) -> MatchSet {
    if exclude.is_empty() {
        return matches.clone();
    }
    matches.filtered(|record| !exclude.matches_path(record.file_path()))
}

/// Lines `[line - radius, line + radius]` clipped to the file.
pub fn context_window<S: AsRef<str>>(lines: &[S], line: usize, radius: usize) -> Vec<ContextLine> {
    if lines.is_empty() || line == 0 {
        return Vec::new();
    }
    let start = line.saturating_sub(radius).max(1);
    let end = line.saturating_add(radius).min(lines.len());
    (start..=end)
        .map(|n| ContextLine::new(n, lines[n - 1].as_ref().trim_end()))
        .collect()
}

/// Attach a context window to every hit. `radius == 0` leaves hits untouched.
pub fn expand_context(matches: &MatchSet, radius: usize) -> MatchSet {
    if radius == 0 {
        return matches.clone();
    }

    let mut cache: HashMap<PathBuf, Option<Vec<String>>> = HashMap::new();
    matches.mapped(|record| {
        let lines = cache
            .entry(record.file_path().to_path_buf())
            .or_insert_with(|| read_lines(record.file_path()));
        match lines {
            Some(lines) => record
                .clone()
                .with_context(context_window(lines.as_slice(), record.line_number(), radius)),
            None => record.clone(),
        }
    })
}

fn read_lines(path: &Path) -> Option<Vec<String>> {
    match fs::read(path) {
        Ok(bytes) => Some(
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect(),
        ),
        Err(e) => {
            warn!("Cannot read {} for context: {}", path.display(), e);
            None
        }
    }
}

/// Attach blame data where the provider has it; failures leave hits as-is.
pub fn merge_blame(matches: &MatchSet, vcs: &dyn VersionControl) -> MatchSet {
    matches.mapped(|record| match vcs.blame(record.file_path(), record.line_number()) {
        Ok(blame) => record.clone().with_blame(blame),
        Err(e) => {
            debug!("{}", e);
            record.clone()
        }
    })
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub staged_only: bool,
    /// Where to start looking for the repository when `staged_only` is set.
    pub repo_start: PathBuf,
    pub exclude: ExcludeSet,
    pub context: usize,
    pub blame: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoMatches,
    Matches(MatchSet),
}

impl Outcome {
    pub fn matches(&self) -> Option<&MatchSet> {
        match self {
            Outcome::Matches(set) => Some(set),
            Outcome::NoMatches => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub outcome: Outcome,
    /// Degraded stages, e.g. `--staged` outside a repository.
    pub warnings: Vec<String>,
}

pub struct Pipeline<'a> {
    vcs: &'a dyn VersionControl,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(vcs: &'a dyn VersionControl, options: PipelineOptions) -> Self {
        Self { vcs, options }
    }

    pub fn run(&self, raw: &MatchSet) -> PipelineReport {
        let mut warnings = Vec::new();

        let staged = if self.options.staged_only {
            match self.vcs.staged_paths(&self.options.repo_start) {
                Ok(staged) => {
                    debug!("{} staged paths", staged.paths().len());
                    filter_staged(raw, &staged)
                }
                Err(e) => {
                    let message = format!("{}, ignoring --staged", e);
                    warn!("{}", message);
                    warnings.push(message);
                    raw.clone()
                }
            }
        } else {
            raw.clone()
        };

        let kept = filter_excluded(&staged, &self.options.exclude);
        if kept.is_empty() {
            return PipelineReport {
                outcome: Outcome::NoMatches,
                warnings,
            };
        }

        let expanded = expand_context(&kept, self.options.context);
        let finished = if self.options.blame {
            merge_blame(&expanded, self.vcs)
        } else {
            expanded
        };

        PipelineReport {
            outcome: Outcome::Matches(finished),
            warnings,
        }
    }
}

/// Unique line numbers shown for a file: context lines if present.
pub fn display_line_numbers(hits: &[&HitRecord]) -> Vec<usize> {
    let mut numbers: Vec<usize> = hits
        .iter()
        .flat_map(|h| h.display_lines().into_iter().map(|l| l.line))
        .collect();
    numbers.sort_unstable();
    numbers.dedup();
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntentGrepError;
    use crate::types::BlameInfo;
    use crate::vcs::MockVersionControl;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, MatchSet) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("b.py");
        fs::write(&a, "l1\nl2\nl3\nl4\nl5\n").unwrap();
        fs::write(&b, "only\n").unwrap();
        let set = MatchSet::from_records(vec![
            HitRecord::new(&a, 3, "l3"),
            HitRecord::new(&b, 1, "only"),
        ]);
        (dir, set)
    }

    #[test]
    fn test_context_window_clips_to_bounds() {
        let lines = ["a", "b", "c", "d"];
        let window = context_window(&lines, 1, 2);
        assert_eq!(
            window.iter().map(|l| l.line).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let window = context_window(&lines, 4, 1);
        assert_eq!(window.iter().map(|l| l.line).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_context_window_huge_radius_covers_file() {
        let lines = ["a", "b", "c", "d"];
        let window = context_window(&lines, 3, usize::MAX);
        assert_eq!(
            window.iter().map(|l| l.line).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(window[2], ContextLine::new(3, "c"));
    }

    #[test]
    fn test_expand_context_reads_files() {
        let (_dir, set) = fixture();
        let expanded = expand_context(&set, 1);
        let ctx = expanded.records()[0].context_lines().unwrap();
        assert_eq!(
            ctx,
            &[
                ContextLine::new(2, "l2"),
                ContextLine::new(3, "l3"),
                ContextLine::new(4, "l4")
            ]
        );
        assert_eq!(expanded.records()[1].context_lines().unwrap().len(), 1);
        // Core fields are untouched.
        assert_eq!(expanded.records()[0].line_number(), 3);
        assert!(set.records()[0].context_lines().is_none());
    }

    #[test]
    fn test_expand_context_missing_file_keeps_hit() {
        let set = MatchSet::from_records(vec![HitRecord::new("/nonexistent/x.py", 2, "x")]);
        let expanded = expand_context(&set, 2);
        assert_eq!(expanded.hit_count(), 1);
        assert!(expanded.records()[0].context_lines().is_none());
    }

    #[test]
    fn test_exclude_filter() {
        let (_dir, set) = fixture();
        let kept = filter_excluded(&set, &ExcludeSet::new(["b.py"]));
        assert_eq!(kept.hit_count(), 1);
        assert!(kept.records()[0].file_path().ends_with("a.py"));
    }

    #[test]
    fn test_empty_staged_set_empties_result() {
        let (dir, set) = fixture();
        let mut vcs = MockVersionControl::new();
        let root = dir.path().to_path_buf();
        vcs.expect_staged_paths()
            .returning(move |_| Ok(StagedFiles::new(&root, Vec::new())));

        let pipeline = Pipeline::new(
            &vcs,
            PipelineOptions {
                staged_only: true,
                repo_start: dir.path().to_path_buf(),
                ..PipelineOptions::default()
            },
        );
        let report = pipeline.run(&set);
        assert_eq!(report.outcome, Outcome::NoMatches);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_staged_filter_keeps_staged_files() {
        let (dir, set) = fixture();
        let mut vcs = MockVersionControl::new();
        let root = dir.path().to_path_buf();
        vcs.expect_staged_paths()
            .returning(move |_| Ok(StagedFiles::new(&root, vec![PathBuf::from("b.py")])));

        let pipeline = Pipeline::new(
            &vcs,
            PipelineOptions {
                staged_only: true,
                repo_start: dir.path().to_path_buf(),
                ..PipelineOptions::default()
            },
        );
        let report = pipeline.run(&set);
        let kept = report.outcome.matches().unwrap();
        assert_eq!(kept.hit_count(), 1);
        assert!(kept.records()[0].file_path().ends_with("b.py"));
    }

    #[test]
    fn test_staged_lookup_failure_is_a_warning() {
        let (dir, set) = fixture();
        let mut vcs = MockVersionControl::new();
        vcs.expect_staged_paths()
            .returning(|p| Err(IntentGrepError::NotARepository(p.to_path_buf())));

        let pipeline = Pipeline::new(
            &vcs,
            PipelineOptions {
                staged_only: true,
                repo_start: dir.path().to_path_buf(),
                ..PipelineOptions::default()
            },
        );
        let report = pipeline.run(&set);
        assert_eq!(report.outcome.matches().unwrap().hit_count(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("ignoring --staged"));
    }

    #[test]
    fn test_blame_merge_is_best_effort() {
        let (_dir, set) = fixture();
        let mut vcs = MockVersionControl::new();
        vcs.expect_blame().returning(|path, line| {
            if path.ends_with("a.py") {
                Ok(BlameInfo {
                    revision_id: "deadbeef".into(),
                    author: "Rui".into(),
                })
            } else {
                Err(IntentGrepError::BlameNotFound {
                    path: path.to_path_buf(),
                    line,
                })
            }
        });

        let pipeline = Pipeline::new(
            &vcs,
            PipelineOptions {
                blame: true,
                ..PipelineOptions::default()
            },
        );
        let report = pipeline.run(&set);
        let records = report.outcome.matches().unwrap().records().to_vec();
        assert_eq!(records[0].blame().unwrap().author, "Rui");
        assert!(records[1].blame().is_none());
    }

    #[test]
    fn test_pipeline_without_options_does_not_touch_vcs() {
        let (_dir, set) = fixture();
        let vcs = MockVersionControl::new();
        let pipeline = Pipeline::new(&vcs, PipelineOptions::default());
        let report = pipeline.run(&set);
        assert_eq!(report.outcome, Outcome::Matches(set));
    }

    #[test]
    fn test_display_line_numbers_dedup() {
        let a = HitRecord::new("a.py", 3, "x")
            .with_context(vec![ContextLine::new(2, "w"), ContextLine::new(3, "x")]);
        let b = HitRecord::new("a.py", 2, "w");
        assert_eq!(display_line_numbers(&[&a, &b]), vec![2, 3]);
    }

    proptest! {
        #[test]
        fn prop_zero_context_is_identity(lines in proptest::collection::vec((1usize..500, "[ -~]{0,40}"), 0..20)) {
            let set = MatchSet::from_records(
                lines.iter().map(|(n, text)| HitRecord::new("f.py", *n, text.clone())).collect(),
            );
            prop_assert_eq!(expand_context(&set, 0), set);
        }

        #[test]
        fn prop_window_contains_hit_line(len in 1usize..200, radius in 0usize..10, pick in 0usize..200) {
            let lines: Vec<String> = (1..=len).map(|n| format!("line {n}")).collect();
            let line = pick % len + 1;
            let window = context_window(&lines, line, radius);
            prop_assert!(window.iter().any(|l| l.line == line));
            prop_assert!(window.len() <= 2 * radius + 1);
            prop_assert!(window.first().map(|l| l.line >= 1).unwrap_or(false));
            prop_assert!(window.last().map(|l| l.line <= len).unwrap_or(false));
        }
    }
}
