//! Text renderings of a match set: tree, table, JSON, stats and intent list.

use std::path::{Component, Path, MAIN_SEPARATOR};

use tabled::builder::Builder;
use tabled::settings::Style;

use super::theme::{ColorTheme, Role};
use crate::aggregate::display_line_numbers;
use crate::error::Result;
use crate::registry::IntentRegistry;
use crate::report::{self, ReportFormat, Stats, REPORT_TITLE};
use crate::types::MatchSet;

pub const NO_MATCHES_ROW: &str = "(no matches)";

const BRANCH: &str = "├──";
const LAST_BRANCH: &str = "└──";
const PIPE_INDENT: &str = "│   ";
const BLANK_INDENT: &str = "    ";

/// Directory tree of files with hits, built from paths relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Dir(Vec<(String, TreeNode)>),
    File(Vec<usize>),
}

impl TreeNode {
    pub fn build(root: &Path, matches: &MatchSet) -> TreeNode {
        let mut tree = TreeNode::Dir(Vec::new());
        for group in matches.by_file() {
            let relative = group.path.strip_prefix(root).unwrap_or(group.path);
            let parts: Vec<String> = relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            if parts.is_empty() {
                continue;
            }
            tree.insert(&parts, display_line_numbers(&group.hits));
        }
        tree
    }

    fn insert(&mut self, parts: &[String], lines: Vec<usize>) {
        let TreeNode::Dir(children) = self else {
            return;
        };
        let (name, rest) = match parts.split_first() {
            Some(split) => split,
            None => return,
        };

        if rest.is_empty() {
            match children.iter_mut().find(|(n, _)| n == name) {
                Some((_, TreeNode::File(existing))) => {
                    existing.extend(lines);
                    existing.sort_unstable();
                    existing.dedup();
                }
                Some(_) => {}
                None => children.push((name.clone(), TreeNode::File(lines))),
            }
            return;
        }

        let index = match children.iter().position(|(n, node)| n == name && matches!(node, TreeNode::Dir(_))) {
            Some(index) => index,
            None => {
                children.push((name.clone(), TreeNode::Dir(Vec::new())));
                children.len() - 1
            }
        };
        children[index].1.insert(rest, lines);
    }
}

pub struct OutputFormatter {
    theme: ColorTheme,
}

impl OutputFormatter {
    pub fn new(theme: ColorTheme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &ColorTheme {
        &self.theme
    }

    /// Root line followed by the box-drawing tree.
    pub fn format_tree(&self, root: &Path, matches: &MatchSet) -> String {
        let shown_root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let mut out = self.theme.paint(
            Role::Dir,
            &format!("{}{}", shown_root.display(), MAIN_SEPARATOR),
        );
        out.push('\n');
        if let TreeNode::Dir(children) = TreeNode::build(root, matches) {
            self.write_children(&children, "", &mut out);
        }
        out
    }

    fn write_children(&self, children: &[(String, TreeNode)], prefix: &str, out: &mut String) {
        for (i, (name, node)) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let conn = self
                .theme
                .paint(Role::Connector, if last { LAST_BRANCH } else { BRANCH });
            match node {
                TreeNode::Dir(grandchildren) => {
                    let label = self
                        .theme
                        .paint(Role::Dir, &format!("{name}{MAIN_SEPARATOR}"));
                    out.push_str(&format!("{prefix}{conn} {label}\n"));
                    let indent = if last { BLANK_INDENT } else { PIPE_INDENT };
                    self.write_children(grandchildren, &format!("{prefix}{indent}"), out);
                }
                TreeNode::File(lines) => {
                    let numbers = lines
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push_str(&format!(
                        "{prefix}{conn} {}:{}\n",
                        self.theme.paint(Role::File, name),
                        self.theme.paint(Role::Line, &numbers)
                    ));
                }
            }
        }
    }

    /// Path / Line / Code grid; context lines become extra rows.
    pub fn format_table(&self, matches: &MatchSet) -> String {
        if matches.is_empty() {
            return NO_MATCHES_ROW.to_string();
        }

        let with_blame = matches.records().iter().any(|r| r.blame().is_some());
        let mut builder = Builder::default();
        let mut header = vec!["Path".to_string(), "Line".to_string(), "Code".to_string()];
        if with_blame {
            header.push("Blame".to_string());
        }
        builder.push_record(header);

        for record in matches.records() {
            let blame = record
                .blame()
                .map(|b| format!("{} {}", short_revision(&b.revision_id), b.author))
                .unwrap_or_default();
            for line in record.display_lines() {
                let mut row = vec![
                    record.file_path().display().to_string(),
                    line.line.to_string(),
                    line.text,
                ];
                if with_blame {
                    row.push(if line.line == record.line_number() {
                        blame.clone()
                    } else {
                        String::new()
                    });
                }
                builder.push_record(row);
            }
        }

        let mut table = builder.build();
        table.with(Style::modern());
        table.to_string()
    }

    /// Pretty-printed flat record list; an empty set gives `[]`.
    pub fn format_json(&self, matches: &MatchSet) -> Result<String> {
        if matches.is_empty() {
            return Ok("[]".to_string());
        }
        Ok(serde_json::to_string_pretty(matches)?)
    }

    /// Stats in `format`; markdown is rendered with theme colours.
    pub fn format_stats(&self, stats: &Stats, format: ReportFormat) -> Result<String> {
        if format != ReportFormat::Markdown || !self.theme.enabled() {
            return report::export(stats, format);
        }
        let hdr = |s: &str| self.theme.paint(Role::StatHeader, s);
        let val = |s: &str| self.theme.paint(Role::StatValue, s);
        Ok(format!(
            "{}\n{} {}\n{} {}\n{}  {}\n",
            hdr(REPORT_TITLE),
            hdr("- Time:"),
            val(&stats.timestamp),
            hdr("- Files:"),
            val(&stats.files.to_string()),
            hdr("- Hits:"),
            val(&stats.hits.to_string()),
        ))
    }

    pub fn format_intent_list(&self, registry: &IntentRegistry) -> String {
        let mut out = String::from("Supported intents:\n");
        for name in registry.all_intent_names() {
            let aliases = registry.aliases_for(name);
            if aliases.is_empty() {
                out.push_str(&format!("  - {name}\n"));
            } else {
                out.push_str(&format!(
                    "  - {name} {}\n",
                    self.theme
                        .paint(Role::Line, &format!("(aliases: {})", aliases.join(", ")))
                ));
            }
        }
        out
    }
}

fn short_revision(revision: &str) -> &str {
    revision.get(..7).unwrap_or(revision)
}
