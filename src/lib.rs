//! Semantic grep for Python sources.
//!
//! An *intent* ("http request", "shell exec", ...) names a set of fully
//! dotted call signatures. Scanning parses every Python file with
//! tree-sitter, resolves each call's callee to a dotted name and reports the
//! calls whose name is one of the intent's signatures.
//!
//! ```no_run
//! use intentgrep::{CancelFlag, IntentGrep, Query};
//!
//! let grep = IntentGrep::builder().context(2).build()?;
//! let result = grep.search(&Query::Intent("http".into()), ".".as_ref(), &CancelFlag::new())?;
//! if let Some(matches) = result.outcome.matches() {
//!     println!("{} hits in {} files", matches.hit_count(), matches.file_count());
//! }
//! # Ok::<(), intentgrep::IntentGrepError>(())
//! ```

pub mod aggregate;
pub mod cli;
pub mod cli_types;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod types;
pub mod ui;
pub mod vcs;

// Re-export commonly used types
pub use aggregate::{Outcome, Pipeline, PipelineOptions, PipelineReport};
pub use cli::CliApp;
pub use config::CliConfig;
pub use engine::{IntentGrep, IntentGrepBuilder, Query, SearchOutcome, VERSION};
pub use error::{IntentGrepError, Result};
pub use registry::{IntentRegistry, IntentSource, RegistryBuilder, Signature};
pub use report::{ReportFormat, Stats};
pub use resolver::{IntentResolver, Resolution, ResolvedVia, SimilarityScorer, WeightedRatio};
pub use scanner::{
    CancelFlag, ExcludeSet, FileFilter, LiteralScanner, ScanOptions, ScanOutput, SkipReason,
    SkippedFile, SyntaxScanner,
};
pub use types::{BlameInfo, ContextLine, FileHits, HitRecord, MatchSet};
pub use ui::{ColorTheme, OutputFormatter, ThemeType, UIManager};
pub use vcs::{GitCli, StagedFiles, VersionControl};
