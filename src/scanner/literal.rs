//! Plain-text fallback: case-insensitive substring search, one hit per line.

use std::path::Path;

use super::{run_scan, FileMatcher, ScanOptions, ScanOutput, SkippedFile};
use crate::types::HitRecord;

#[derive(Debug, Clone)]
pub struct LiteralScanner {
    needle: String,
}

impl LiteralScanner {
    pub fn new(value: &str) -> Self {
        Self {
            needle: value.to_lowercase(),
        }
    }

    pub fn scan(&self, root: &Path, options: &ScanOptions) -> ScanOutput {
        run_scan(root, options, self)
    }

    pub fn matches_line(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.needle)
    }
}

impl FileMatcher for LiteralScanner {
    fn eligible(&self, _path: &Path) -> bool {
        true
    }

    fn match_source(&self, path: &Path, source: &str) -> Result<Vec<HitRecord>, SkippedFile> {
        Ok(source
            .lines()
            .enumerate()
            .filter(|(_, line)| self.matches_line(line))
            .map(|(idx, line)| HitRecord::new(path, idx + 1, line.trim()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_case_insensitive_one_hit_per_line() {
        let scanner = LiteralScanner::new("Token");
        let source = "a = 1\nTOKEN = token_value  # token\n  no match\n  get_token()\n";
        let hits = scanner.match_source(Path::new("cfg.py"), source).unwrap();
        let lines: Vec<usize> = hits.iter().map(|h| h.line_number()).collect();
        assert_eq!(lines, vec![2, 4]);
        assert_eq!(hits[1].source_text(), "get_token()");
    }

    #[test]
    fn test_any_file_type_is_eligible() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.md"), "API_KEY here\n").unwrap();
        fs::write(dir.path().join("app.py"), "key = API_KEY\n").unwrap();
        fs::write(dir.path().join("skip.py"), "api_key\n").unwrap();

        let options = ScanOptions::default().with_filter(
            crate::scanner::FileFilter::default()
                .with_exclude(crate::scanner::ExcludeSet::new(["skip.py"])),
        );
        let output = LiteralScanner::new("api_key").scan(dir.path(), &options);
        let names: Vec<String> = output
            .matches
            .records()
            .iter()
            .map(|h| h.file_path().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["app.py", "notes.md"]);
    }

    #[test]
    fn test_extension_filter_applies() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "needle\n").unwrap();
        fs::write(dir.path().join("b.py"), "needle\n").unwrap();

        let options = ScanOptions::default()
            .with_filter(crate::scanner::FileFilter::default().with_extension("txt"));
        let output = LiteralScanner::new("NEEDLE").scan(dir.path(), &options);
        assert_eq!(output.matches.hit_count(), 1);
        assert!(output.matches.records()[0].file_path().ends_with("a.txt"));
    }
}
