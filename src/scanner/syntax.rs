//! Tree-sitter based call matching for Python sources.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

use super::{is_python_source, run_scan, FileMatcher, ScanOptions, ScanOutput, SkipReason, SkippedFile};
use crate::error::Result;
use crate::registry::{IntentRegistry, Signature};
use crate::types::HitRecord;

/// Callee chains deeper than this are treated as unresolvable.
pub const MAX_CALLEE_DEPTH: usize = 256;

thread_local! {
    static PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

pub fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

fn new_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser.set_language(&python_language())?;
    Ok(parser)
}

/// Parse with this thread's parser, creating it on first use.
fn parse_python(source: &str) -> Option<Tree> {
    PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = new_parser().ok();
        }
        slot.as_mut()?.parse(source, None)
    })
}

/// A call expression found in a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// 1-based line where the call expression starts.
    pub line: usize,
    /// Dotted callee name, `None` when the callee is not a name chain.
    pub callee: Option<String>,
}

/// Resolve a callee expression to a dotted name.
///
/// `a` gives `a`, `a.b.c` gives `a.b.c`; calls, subscripts and any other
/// expression in the chain make it unresolvable.
pub fn resolve_callee(node: Node<'_>, source: &[u8]) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    let mut current = node;

    for _ in 0..MAX_CALLEE_DEPTH {
        match current.kind() {
            "identifier" => {
                segments.push(current.utf8_text(source).ok()?);
                segments.reverse();
                return Some(segments.join("."));
            }
            "attribute" => {
                let member = current.child_by_field_name("attribute")?;
                segments.push(member.utf8_text(source).ok()?);
                current = current.child_by_field_name("object")?;
            }
            "parenthesized_expression" => {
                current = current.named_child(0)?;
            }
            _ => return None,
        }
    }
    None
}

/// Every `call` node in the tree, in source order.
pub fn call_sites(tree: &Tree, source: &[u8]) -> Vec<CallSite> {
    let mut sites = Vec::new();
    let mut cursor = tree.walk();

    loop {
        let node = cursor.node();
        if node.kind() == "call" {
            if let Some(function) = node.child_by_field_name("function") {
                sites.push(CallSite {
                    line: node.start_position().row + 1,
                    callee: resolve_callee(function, source),
                });
            }
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return sites;
            }
        }
    }
}

/// Finds calls whose dotted callee is one of an intent's signatures.
#[derive(Debug, Clone)]
pub struct SyntaxScanner<'r> {
    intent: String,
    signatures: &'r BTreeSet<Signature>,
}

impl<'r> SyntaxScanner<'r> {
    pub fn new(registry: &'r IntentRegistry, intent: &str) -> Result<Self> {
        let signatures = registry.signatures_for(intent)?;
        // Surface grammar/ABI mismatches up front instead of per file.
        new_parser()?;
        Ok(Self {
            intent: intent.to_string(),
            signatures,
        })
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn scan(&self, root: &Path, options: &ScanOptions) -> ScanOutput {
        run_scan(root, options, self)
    }
}

impl FileMatcher for SyntaxScanner<'_> {
    fn eligible(&self, path: &Path) -> bool {
        is_python_source(path)
    }

    fn match_source(&self, path: &Path, source: &str) -> std::result::Result<Vec<HitRecord>, SkippedFile> {
        let tree = parse_python(source)
            .ok_or_else(|| SkippedFile::new(path, SkipReason::ParseError, "parser returned no tree"))?;
        if tree.root_node().has_error() {
            return Err(SkippedFile::new(path, SkipReason::ParseError, "syntax error"));
        }

        let lines: Vec<&str> = source.lines().collect();
        let hits = call_sites(&tree, source.as_bytes())
            .into_iter()
            .filter(|site| {
                site.callee
                    .as_deref()
                    .map(|name| self.signatures.contains(name))
                    .unwrap_or(false)
            })
            .map(|site| {
                let text = lines.get(site.line - 1).map(|l| l.trim()).unwrap_or("");
                HitRecord::new(path, site.line, text)
            })
            .collect();
        Ok(hits)
    }
}
