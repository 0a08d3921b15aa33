//! Library entry point tying registry, scanners, resolver and pipeline together.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::aggregate::{Outcome, Pipeline, PipelineOptions};
use crate::error::{IntentGrepError, Result};
use crate::registry::IntentRegistry;
use crate::resolver::{IntentResolver, Resolution, DEFAULT_ACCEPT_THRESHOLD};
use crate::scanner::{
    CancelFlag, ExcludeSet, FileFilter, LiteralScanner, ScanOptions, ScanOutput, SkippedFile,
    SyntaxScanner,
};
use crate::vcs::{GitCli, VersionControl};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Intent name or alias, resolved through the registry.
    Intent(String),
    /// Case-insensitive text searched line by line in any file.
    Literal(String),
}

impl Query {
    pub fn text(&self) -> &str {
        match self {
            Query::Intent(text) | Query::Literal(text) => text,
        }
    }
}

/// Everything one search produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// How an intent query was resolved; `None` for literal searches.
    pub resolution: Option<Resolution>,
    pub outcome: Outcome,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
    pub cancelled: bool,
    pub warnings: Vec<String>,
}

pub struct IntentGrepBuilder {
    registry: Option<IntentRegistry>,
    vcs: Option<Box<dyn VersionControl>>,
    scan: ScanOptions,
    threshold: f64,
    context: usize,
    staged_only: bool,
    blame: bool,
}

impl Default for IntentGrepBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            vcs: None,
            scan: ScanOptions::default(),
            threshold: DEFAULT_ACCEPT_THRESHOLD,
            context: 0,
            staged_only: false,
            blame: false,
        }
    }
}

impl IntentGrepBuilder {
    /// Defaults to the built-in registry.
    pub fn registry(mut self, registry: IntentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Defaults to [`GitCli`].
    pub fn version_control(mut self, vcs: Box<dyn VersionControl>) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn scan_options(mut self, options: ScanOptions) -> Self {
        self.scan = options;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn extension(mut self, ext: &str) -> Self {
        self.scan.filter = self.scan.filter.with_extension(ext);
        self
    }

    pub fn name_contains(mut self, fragment: &str) -> Self {
        self.scan.filter = self.scan.filter.with_name_contains(fragment);
        self
    }

    pub fn exact_name(mut self, name: &str) -> Self {
        self.scan.filter = self.scan.filter.with_exact_name(name);
        self
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scan.filter = self.scan.filter.with_exclude(ExcludeSet::new(patterns));
        self
    }

    pub fn context(mut self, radius: usize) -> Self {
        self.context = radius;
        self
    }

    pub fn staged_only(mut self, staged_only: bool) -> Self {
        self.staged_only = staged_only;
        self
    }

    pub fn blame(mut self, blame: bool) -> Self {
        self.blame = blame;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.scan.max_file_size = bytes;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.scan.follow_symlinks = follow;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.scan.parallel = parallel;
        self
    }

    pub fn build(self) -> Result<IntentGrep> {
        let registry = match self.registry {
            Some(registry) => registry,
            None => IntentRegistry::builtin()?,
        };
        info!("intentgrep {} ready with {} intents", VERSION, registry.len());
        Ok(IntentGrep {
            registry,
            vcs: self.vcs.unwrap_or_else(|| Box::new(GitCli::new())),
            scan: self.scan,
            threshold: self.threshold,
            context: self.context,
            staged_only: self.staged_only,
            blame: self.blame,
        })
    }
}

pub struct IntentGrep {
    registry: IntentRegistry,
    vcs: Box<dyn VersionControl>,
    scan: ScanOptions,
    threshold: f64,
    context: usize,
    staged_only: bool,
    blame: bool,
}

impl IntentGrep {
    pub fn builder() -> IntentGrepBuilder {
        IntentGrepBuilder::default()
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> IntentResolver<'_> {
        IntentResolver::new(&self.registry).with_threshold(self.threshold)
    }

    pub fn resolve(&self, query: &str) -> Result<Resolution> {
        self.resolver().resolve(query)
    }

    /// Resolve, scan `root` and post-process the hits.
    ///
    /// Setting `cancel` stops the walk; whatever was matched so far is still
    /// post-processed and returned with `cancelled` set.
    pub fn search(&self, query: &Query, root: &Path, cancel: &CancelFlag) -> Result<SearchOutcome> {
        if query.text().trim().is_empty() {
            return Err(IntentGrepError::MissingQuery);
        }
        let options = self.scan.clone().with_cancel(cancel.clone());

        let (resolution, scan) = match query {
            Query::Literal(value) => (None, LiteralScanner::new(value).scan(root, &options)),
            Query::Intent(text) => {
                let resolution = self.resolve(text)?;
                let scanner = SyntaxScanner::new(&self.registry, &resolution.intent)?;
                let output = scanner.scan(root, &options);
                (Some(resolution), output)
            }
        };
        Ok(self.finish(resolution, scan, root))
    }

    fn finish(&self, resolution: Option<Resolution>, scan: ScanOutput, root: &Path) -> SearchOutcome {
        // An exact file name bypasses the exclude list during the walk too.
        let exclude = if self.scan.filter.exact_name.is_some() {
            ExcludeSet::default()
        } else {
            self.scan.filter.exclude.clone()
        };
        let pipeline = Pipeline::new(
            self.vcs.as_ref(),
            PipelineOptions {
                staged_only: self.staged_only,
                repo_start: root_dir(root),
                exclude,
                context: self.context,
                blame: self.blame,
            },
        );
        let report = pipeline.run(&scan.matches);

        SearchOutcome {
            resolution,
            outcome: report.outcome,
            files_scanned: scan.files_scanned,
            skipped: scan.skipped,
            cancelled: scan.cancelled,
            warnings: report.warnings,
        }
    }
}

fn root_dir(root: &Path) -> PathBuf {
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    }
}
