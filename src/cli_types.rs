use std::path::PathBuf;

use clap::Parser;

use crate::report::ReportFormat;
use crate::ui::ThemeType;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "intentgrep")]
#[command(about = "Semantic grep for Python: find the calls that perform an intent")]
#[command(version, disable_version_flag = true)]
pub struct CliArgs {
    /// Intent name or alias (ignored with --value)
    pub intent: Option<String>,

    /// Root folder to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Plain-text search instead of an intent
    #[arg(short = 'V', long, value_name = "VAL")]
    pub value: Option<String>,

    /// Styled table output
    #[arg(short = 'T', long)]
    pub table: bool,

    /// JSON output
    #[arg(short = 'J', long)]
    pub json: bool,

    /// Only files with this extension
    #[arg(short = 'F', long = "file", value_name = "EXT")]
    pub file_ext: Option<String>,

    /// Only files whose name contains this text
    #[arg(short = 'N', long = "name", value_name = "NAME")]
    pub name_filter: Option<String>,

    /// Only files with exactly this name (other filters are ignored)
    #[arg(short = 'E', long = "exact", value_name = "FILENAME")]
    pub exact_name: Option<String>,

    /// File names to exclude (repeatable, globs allowed)
    #[arg(short = 'x', long = "exclude", value_name = "NAME", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Lines of context around each hit
    #[arg(short = 'C', long, default_value_t = 0)]
    pub context: usize,

    /// Only files with staged changes
    #[arg(long)]
    pub staged: bool,

    /// Show git blame for each hit
    #[arg(long)]
    pub blame: bool,

    /// Print statistics instead of the hits
    #[arg(long)]
    pub stats: bool,

    /// Statistics report format (implies --stats)
    #[arg(long, value_enum, value_name = "FMT")]
    pub report: Option<ReportFormat>,

    /// Pick a hit and open it in $EDITOR
    #[arg(long)]
    pub interactive: bool,

    /// List the known intents and their aliases
    #[arg(long)]
    pub intent_list: bool,

    /// Colour theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeType>,

    /// Disable colours
    #[arg(long)]
    pub no_color: bool,

    /// Extra configuration file
    #[arg(long, value_name = "FILE", env = "INTENTGREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    pub fn wants_stats(&self) -> bool {
        self.stats || self.report.is_some()
    }

    /// Directory to scan. With `--value` a single positional is the root.
    pub fn search_root(&self) -> PathBuf {
        match (&self.value, &self.intent) {
            (Some(_), Some(lone)) if self.path == PathBuf::from(".") => PathBuf::from(lone),
            _ => self.path.clone(),
        }
    }
}
