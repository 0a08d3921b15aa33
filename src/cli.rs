use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    aggregate::Outcome,
    cli_types::CliArgs,
    engine::{IntentGrep, Query, SearchOutcome},
    error::IntentGrepError,
    report::{ReportFormat, Stats},
    resolver::ResolvedVia,
    scanner::{CancelFlag, FileFilter},
    types::MatchSet,
    ui::{InteractivePrompts, UIManager},
    CliConfig,
};

pub const EXIT_OK: u8 = 0;
pub const EXIT_USAGE: u8 = 1;

pub struct CliApp {
    config: CliConfig,
    verbose: bool,
    ui: UIManager,
}

impl CliApp {
    pub fn new(config: CliConfig, verbose: bool, colors_enabled: bool) -> Self {
        info!("Initializing intentgrep CLI");
        let ui = UIManager::new(colors_enabled && config.output.colors, config.output.theme);
        Self { config, verbose, ui }
    }

    pub fn with_ui(config: CliConfig, verbose: bool, ui: UIManager) -> Self {
        Self { config, verbose, ui }
    }

    /// Run one invocation and return the process exit code.
    pub async fn run(&self, args: CliArgs) -> Result<u8> {
        let registry = self
            .config
            .build_registry()
            .context("Failed to build the intent registry")?;

        if args.intent_list {
            print!("{}", self.ui.formatter.format_intent_list(&registry));
            return Ok(EXIT_OK);
        }

        let query = match (&args.value, &args.intent) {
            (Some(value), _) if !value.trim().is_empty() => Query::Literal(value.clone()),
            (None, Some(intent)) if !intent.trim().is_empty() => Query::Intent(intent.clone()),
            _ => {
                self.ui.print_error_with_suggestions(
                    &IntentGrepError::MissingQuery.to_string(),
                    &["Usage: intentgrep [INTENT] [PATH] [-V VALUE]".to_string()],
                );
                return Ok(EXIT_USAGE);
            }
        };

        let root = args.search_root();
        let engine = self.build_engine(&args, registry)?;

        if let Query::Intent(text) = &query {
            match engine.resolve(text) {
                Ok(resolution) => {
                    if let ResolvedVia::Fuzzy { score } = resolution.via {
                        info!("Resolved {:?} to {:?} (score {:.0})", text, resolution.intent, score);
                    }
                }
                Err(IntentGrepError::IntentNotFound(_)) => {
                    self.report_unresolved(&engine, text);
                    return Ok(EXIT_USAGE);
                }
                Err(e) => return Err(e).context("Failed to resolve intent"),
            }
        }

        if self.verbose {
            self.ui.print_header("Search");
            self.ui.print_info(&format!("Query: {}", query.text()));
            self.ui.print_info(&format!("Root: {}", root.display()));
        }

        let progress = self
            .ui
            .create_scan_progress(&format!("Scanning {}", root.display()), !args.json);
        let cancel = CancelFlag::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let engine = Arc::new(engine);
        let outcome = {
            let engine = Arc::clone(&engine);
            let root = root.clone();
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || engine.search(&query, &root, &cancel))
                .await
                .context("Scan task failed")?
        };
        watcher.abort();
        progress.finish();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(IntentGrepError::IntentNotFound(text)) => {
                self.report_unresolved(&engine, &text);
                return Ok(EXIT_USAGE);
            }
            Err(e) => return Err(e).context("Search failed"),
        };

        self.present(&args, &root, outcome)
    }

    fn build_engine(&self, args: &CliArgs, registry: crate::IntentRegistry) -> Result<IntentGrep> {
        let mut filter = FileFilter::default();
        if let Some(ext) = &args.file_ext {
            filter = filter.with_extension(ext);
        }
        if let Some(name) = &args.name_filter {
            filter = filter.with_name_contains(name.as_str());
        }
        if let Some(exact) = &args.exact_name {
            filter = filter.with_exact_name(exact.as_str());
        }
        filter = filter.with_exclude(crate::scanner::ExcludeSet::new(&args.exclude));

        IntentGrep::builder()
            .registry(registry)
            .scan_options(self.config.scan_options(filter))
            .threshold(self.config.resolver.threshold)
            .context(args.context)
            .staged_only(args.staged)
            .blame(args.blame)
            .build()
            .context("Failed to initialise the search engine")
    }

    fn report_unresolved(&self, engine: &IntentGrep, text: &str) {
        let mut suggestions = Vec::new();
        if let Some((closest, score)) = engine.resolver().best_candidate(&text.trim().to_lowercase()) {
            suggestions.push(format!("Closest intent: {closest} (score {score:.0})"));
        }
        suggestions.push("Run with --intent-list to see every intent".to_string());
        self.ui.print_error_with_suggestions(
            &IntentGrepError::IntentNotFound(text.to_string()).to_string(),
            &suggestions,
        );
    }

    fn present(&self, args: &CliArgs, root: &Path, outcome: SearchOutcome) -> Result<u8> {
        for warning in &outcome.warnings {
            self.ui.print_warning(warning);
        }
        if outcome.cancelled {
            self.ui.print_warning("Scan interrupted; results are partial");
        }
        if self.verbose {
            self.ui.print_info(&format!(
                "Scanned {} files, skipped {}",
                outcome.files_scanned,
                outcome.skipped.len()
            ));
            for skipped in &outcome.skipped {
                debug!("skipped {}: {:?}", skipped.path.display(), skipped.reason);
            }
        }

        if args.interactive && !args.wants_stats() {
            if let Outcome::Matches(matches) = &outcome.outcome {
                return self.pick_and_open(matches);
            }
        }

        match self.render(args, root, &outcome.outcome)? {
            Some(text) => print!("{}", text),
            None => self.ui.print_error("No files matched your criteria!"),
        }
        Ok(EXIT_OK)
    }

    /// Stdout text for a finished search. `None` is an empty result outside JSON mode.
    fn render(&self, args: &CliArgs, root: &Path, outcome: &Outcome) -> Result<Option<String>> {
        let matches = match outcome {
            Outcome::NoMatches if args.json => return Ok(Some("[]\n".to_string())),
            Outcome::NoMatches => return Ok(None),
            Outcome::Matches(matches) => matches,
        };

        let rendered = if args.wants_stats() {
            let stats = Stats::from_matches(matches);
            let format = match (args.report, args.json) {
                (Some(format), _) => format,
                (None, true) => ReportFormat::Json,
                (None, false) => ReportFormat::Markdown,
            };
            self.ui.formatter.format_stats(&stats, format)?
        } else if args.json {
            self.ui.formatter.format_json(matches)?
        } else if args.table {
            self.ui.formatter.format_table(matches)
        } else {
            self.ui.formatter.format_tree(root, matches)
        };
        Ok(Some(with_newline(rendered)))
    }

    fn pick_and_open(&self, matches: &MatchSet) -> Result<u8> {
        let prompts = InteractivePrompts::new(self.config.output.editor.clone());
        match prompts.pick(matches) {
            Ok(Some(row)) => {
                if let Err(e) = prompts.open(&row) {
                    warn!("Editor launch failed: {}", e);
                    self.ui.print_error("Editor not found. Please set the EDITOR env var.");
                }
            }
            Ok(None) => {}
            Err(IntentGrepError::InvalidSelection(_)) => self.ui.print_error("Invalid selection"),
            Err(e) => return Err(e).context("Interactive picker failed"),
        }
        Ok(EXIT_OK)
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HitRecord;
    use crate::ui::ColorTheme;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::test;

    fn create_test_app() -> CliApp {
        CliApp::with_ui(CliConfig::default(), false, UIManager::with_theme(ColorTheme::plain()))
    }

    fn create_test_python_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn args(dir: &TempDir) -> CliArgs {
        CliArgs {
            path: dir.path().to_path_buf(),
            json: true,
            ..CliArgs::default()
        }
    }

    #[test]
    async fn test_missing_query_exits_one() {
        let dir = TempDir::new().unwrap();
        let code = create_test_app().run(args(&dir)).await.unwrap();
        assert_eq!(code, EXIT_USAGE);
    }

    #[test]
    async fn test_unknown_intent_exits_one() {
        let dir = TempDir::new().unwrap();
        let code = create_test_app()
            .run(CliArgs {
                intent: Some("qqqqzzzz".into()),
                ..args(&dir)
            })
            .await
            .unwrap();
        assert_eq!(code, EXIT_USAGE);
    }

    #[test]
    async fn test_intent_list_exits_zero() {
        let dir = TempDir::new().unwrap();
        let code = create_test_app()
            .run(CliArgs {
                intent_list: true,
                ..args(&dir)
            })
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }

    #[test]
    async fn test_search_and_no_match_exit_zero() {
        let dir = TempDir::new().unwrap();
        create_test_python_file(&dir, "app.py", "import os\nos.system('ls')\n");
        let app = create_test_app();

        for intent in ["shell exec", "json"] {
            let code = app
                .run(CliArgs {
                    intent: Some(intent.into()),
                    ..args(&dir)
                })
                .await
                .unwrap();
            assert_eq!(code, EXIT_OK);
        }
    }

    #[test]
    async fn test_stats_and_table_modes() {
        let dir = TempDir::new().unwrap();
        create_test_python_file(&dir, "app.py", "import os\nos.system('ls')\n");
        let app = create_test_app();

        let stats = app
            .run(CliArgs {
                intent: Some("shell".into()),
                report: Some(ReportFormat::Html),
                ..args(&dir)
            })
            .await
            .unwrap();
        assert_eq!(stats, EXIT_OK);

        let table = app
            .run(CliArgs {
                value: Some("system".into()),
                json: false,
                table: true,
                context: 1,
                ..args(&dir)
            })
            .await
            .unwrap();
        assert_eq!(table, EXIT_OK);
    }

    #[test]
    async fn test_staged_outside_repository_degrades() {
        let dir = TempDir::new().unwrap();
        create_test_python_file(&dir, "app.py", "import os\nos.system('ls')\n");
        let code = create_test_app()
            .run(CliArgs {
                intent: Some("shell exec".into()),
                staged: true,
                blame: true,
                ..args(&dir)
            })
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }

    fn three_hits() -> Outcome {
        Outcome::Matches(MatchSet::from_records(vec![
            HitRecord::new("/src/a.py", 1, "os.system(a)"),
            HitRecord::new("/src/a.py", 4, "os.popen(b)"),
            HitRecord::new("/src/b.py", 2, "subprocess.run(c)"),
        ]))
    }

    #[test]
    async fn test_render_no_matches() {
        let app = create_test_app();
        let root = Path::new(".");
        let json = CliArgs {
            json: true,
            ..CliArgs::default()
        };
        assert_eq!(
            app.render(&json, root, &Outcome::NoMatches).unwrap().as_deref(),
            Some("[]\n")
        );
        assert!(app
            .render(&CliArgs::default(), root, &Outcome::NoMatches)
            .unwrap()
            .is_none());
    }

    #[test]
    async fn test_render_stats() {
        let app = create_test_app();
        let root = Path::new("/src");

        let markdown = app
            .render(
                &CliArgs {
                    stats: true,
                    ..CliArgs::default()
                },
                root,
                &three_hits(),
            )
            .unwrap()
            .unwrap();
        assert!(markdown.starts_with("**intentgrep Report**\n"));
        assert!(markdown.contains("- Files: 2\n"));
        assert!(markdown.contains("- Hits:  3\n"));

        let json = app
            .render(
                &CliArgs {
                    stats: true,
                    json: true,
                    ..CliArgs::default()
                },
                root,
                &three_hits(),
            )
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"], 2);
        assert_eq!(value["hits"], 3);

        let html = app
            .render(
                &CliArgs {
                    json: true,
                    report: Some(ReportFormat::Html),
                    ..CliArgs::default()
                },
                root,
                &three_hits(),
            )
            .unwrap()
            .unwrap();
        assert!(html.starts_with("<html>"));
        assert!(html.contains("<li>Hits: 3</li>"));
    }

    #[test]
    async fn test_render_json_hits() {
        let app = create_test_app();
        let json = app
            .render(
                &CliArgs {
                    json: true,
                    ..CliArgs::default()
                },
                Path::new("/src"),
                &three_hits(),
            )
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[2]["line"], 2);
        assert_eq!(value[2]["code"], "subprocess.run(c)");
        assert!(json.ends_with('\n'));
    }
}
