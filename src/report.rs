//! Match-set statistics and the fixed report formats.

use chrono::Local;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::MatchSet;

pub const REPORT_TITLE: &str = "intentgrep Report";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub timestamp: String,
    pub files: usize,
    pub hits: usize,
}

impl Stats {
    /// Reduce `matches`, stamped with the current local time.
    pub fn from_matches(matches: &MatchSet) -> Self {
        Self::with_timestamp(matches, Local::now().format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn with_timestamp(matches: &MatchSet, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            files: matches.file_count(),
            hits: matches.hit_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    #[default]
    Markdown,
    Html,
}

pub fn export(stats: &Stats, format: ReportFormat) -> Result<String> {
    let text = match format {
        ReportFormat::Json => serde_json::to_string_pretty(stats)?,
        ReportFormat::Html => format!(
            "<html><body><h1>{title}</h1><ul><li>Time: {}</li><li>Files: {}</li><li>Hits: {}</li></ul></body></html>",
            stats.timestamp,
            stats.files,
            stats.hits,
            title = REPORT_TITLE,
        ),
        ReportFormat::Markdown => format!(
            "**{title}**\n- Time: {}\n- Files: {}\n- Hits:  {}\n",
            stats.timestamp,
            stats.files,
            stats.hits,
            title = REPORT_TITLE,
        ),
    };
    Ok(text)
}
