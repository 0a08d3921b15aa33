use std::path::PathBuf;
use thiserror::Error;

/// Every failure the intent-matching pipeline can report.
///
/// Per-file (`UnreadableFile`, `ParseError`) and version-control
/// (`NotARepository`, `BlameNotFound`) variants are recovered inside the
/// pipeline; they only reach callers through skip lists and warnings.
#[derive(Error, Debug)]
pub enum IntentGrepError {
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Intent `{0}` not found")]
    IntentNotFound(String),

    #[error("Failed to read {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {0}")]
    ParseError(PathBuf),

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("No blame information for {path}:{line}")]
    BlameNotFound { path: PathBuf, line: usize },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No query given: pass an intent name or --value")]
    MissingQuery,

    #[error("Malformed signature `{signature}` in intent `{intent}`")]
    MalformedSignature { intent: String, signature: String },

    #[error("Alias `{alias}` is declared for both `{first}` and `{second}`")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Intent `{0}` has no signatures")]
    EmptyIntent(String),

    #[error("Alias `{alias}` targets unregistered intent `{intent}`")]
    AliasTargetMissing { alias: String, intent: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Grammar error: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IntentGrepError>;

impl IntentGrepError {
    /// True for errors that are isolated to one file and never abort a scan.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            IntentGrepError::UnreadableFile { .. } | IntentGrepError::ParseError(_)
        )
    }
}
