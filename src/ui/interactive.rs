//! Numbered picker over the hits, opening the chosen one in `$EDITOR`.

use std::path::PathBuf;
use std::process::Command;

use console::Term;
use tabled::builder::Builder;
use tabled::settings::{Panel, Style};
use tracing::debug;

use crate::error::{IntentGrepError, Result};
use crate::types::MatchSet;

pub const PICKER_TITLE: &str = "intentgrep Interactive";
pub const PROMPT: &str = "Select index to open (ENTER to skip): ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRow {
    pub path: PathBuf,
    pub line: usize,
    pub code: String,
}

/// One row per displayed line, in record order.
pub fn picker_rows(matches: &MatchSet) -> Vec<PickerRow> {
    matches
        .records()
        .iter()
        .flat_map(|record| {
            record.display_lines().into_iter().map(move |line| PickerRow {
                path: record.file_path().to_path_buf(),
                line: line.line,
                code: line.text,
            })
        })
        .collect()
}

pub fn format_picker(rows: &[PickerRow]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Idx", "File", "Line", "Code"].map(String::from));
    for (i, row) in rows.iter().enumerate() {
        builder.push_record([
            (i + 1).to_string(),
            row.path.display().to_string(),
            row.line.to_string(),
            row.code.clone(),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded()).with(Panel::header(PICKER_TITLE));
    table.to_string()
}

/// 1-based choice from user input. Non-numeric input means "skip".
pub fn parse_selection(input: &str, count: usize) -> Result<Option<usize>> {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(Some(n - 1)),
        _ => Err(IntentGrepError::InvalidSelection(input.to_string())),
    }
}

/// Program and arguments that open `row` in an editor.
///
/// `+line` positioning is skipped on Windows, where the default is notepad.
pub fn editor_command(editor: Option<&str>, windows: bool, row: &PickerRow) -> (String, Vec<String>) {
    let default = if windows { "notepad" } else { "vim" };
    let program = editor
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(default)
        .to_string();
    let path = row.path.display().to_string();
    let args = if windows {
        vec![path]
    } else {
        vec![format!("+{}", row.line), path]
    };
    (program, args)
}

pub struct InteractivePrompts {
    term: Term,
    editor: Option<String>,
}

impl InteractivePrompts {
    /// `editor` overrides `$EDITOR`.
    pub fn new(editor: Option<String>) -> Self {
        Self {
            term: Term::stdout(),
            editor,
        }
    }

    /// Show the table and read a choice. `Ok(None)` when the user skips.
    pub fn pick(&self, matches: &MatchSet) -> Result<Option<PickerRow>> {
        let rows = picker_rows(matches);
        self.term.write_line(&format_picker(&rows))?;
        self.term.write_str(PROMPT)?;
        let input = self.term.read_line()?;
        Ok(parse_selection(&input, rows.len())?.and_then(|i| rows.into_iter().nth(i)))
    }

    pub fn open(&self, row: &PickerRow) -> Result<String> {
        let configured = self
            .editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok());
        let (program, args) = editor_command(configured.as_deref(), cfg!(windows), row);
        self.term.write_line(&format!(
            "Opening {}:{} in {}",
            row.path.display(),
            row.line,
            program
        ))?;
        debug!("Launching {} {:?}", program, args);
        Command::new(&program).args(&args).status()?;
        Ok(program)
    }
}
