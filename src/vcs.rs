//! Version-control lookups used by the staged filter and blame merge.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{IntentGrepError, Result};
use crate::types::BlameInfo;

/// Paths with staged changes, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFiles {
    root: PathBuf,
    paths: BTreeSet<PathBuf>,
}

impl StagedFiles {
    pub fn new(root: impl Into<PathBuf>, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let root = root.into();
        Self {
            root: canonical(&root),
            paths: paths.into_iter().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> &BTreeSet<PathBuf> {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `file` (absolute, or relative to the working directory) is staged.
    pub fn contains(&self, file: &Path) -> bool {
        let absolute = canonical(file);
        match absolute.strip_prefix(&self.root) {
            Ok(relative) => self.paths.contains(relative),
            Err(_) => self.paths.contains(file),
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg_attr(test, mockall::automock)]
pub trait VersionControl: Send + Sync {
    /// Staged files of the repository containing `start`.
    fn staged_paths(&self, start: &Path) -> Result<StagedFiles>;

    /// Revision and author of `line` (1-based) in `path`.
    fn blame(&self, path: &Path, line: usize) -> Result<BlameInfo>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Root of the working tree containing `start`.
    pub fn repo_root(&self, start: &Path) -> Result<PathBuf> {
        let dir = if start.is_file() {
            start.parent().unwrap_or(start)
        } else {
            start
        };
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };

        let output = Command::new(&self.program)
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(dir)
            .output()
            .map_err(|e| {
                debug!("git rev-parse could not run: {}", e);
                IntentGrepError::NotARepository(start.to_path_buf())
            })?;

        if !output.status.success() {
            return Err(IntentGrepError::NotARepository(start.to_path_buf()));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(IntentGrepError::NotARepository(start.to_path_buf()));
        }
        Ok(PathBuf::from(root))
    }
}

impl VersionControl for GitCli {
    fn staged_paths(&self, start: &Path) -> Result<StagedFiles> {
        let root = self.repo_root(start)?;
        let output = Command::new(&self.program)
            .args(["diff", "--cached", "--name-only", "-z"])
            .current_dir(&root)
            .output()
            .map_err(|_| IntentGrepError::NotARepository(root.clone()))?;

        if !output.status.success() {
            debug!(
                "git diff --cached failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
            return Err(IntentGrepError::NotARepository(root));
        }

        Ok(StagedFiles::new(&root, parse_name_list(&output.stdout)))
    }

    fn blame(&self, path: &Path, line: usize) -> Result<BlameInfo> {
        let not_found = || IntentGrepError::BlameNotFound {
            path: path.to_path_buf(),
            line,
        };

        let root = canonical(&self.repo_root(path)?);
        let absolute = canonical(path);
        let relative = absolute.strip_prefix(&root).map_err(|_| not_found())?;

        let range = format!("{line},{line}");
        let output = Command::new(&self.program)
            .arg("blame")
            .args(["--porcelain", "-L", range.as_str(), "HEAD", "--"])
            .arg(relative)
            .current_dir(&root)
            .output()
            .map_err(|_| not_found())?;

        if !output.status.success() {
            return Err(not_found());
        }
        parse_porcelain(&String::from_utf8_lossy(&output.stdout)).ok_or_else(not_found)
    }
}

/// Split NUL-separated `git --name-only -z` output.
pub fn parse_name_list(raw: &[u8]) -> Vec<PathBuf> {
    raw.split(|b| *b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| PathBuf::from(String::from_utf8_lossy(chunk).into_owned()))
        .collect()
}

/// Extract revision and author from `git blame --porcelain` output.
pub fn parse_porcelain(raw: &str) -> Option<BlameInfo> {
    let mut lines = raw.lines();
    let revision_id = lines.next()?.split_whitespace().next()?.to_string();
    if revision_id.is_empty() || !revision_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let author = lines
        .find_map(|l| l.strip_prefix("author "))
        .map(str::to_string)?;
    Some(BlameInfo {
        revision_id,
        author,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PORCELAIN: &str = "\
4b825dc642cb6eb9a060e54bf8d69288fbee4904 3 3 1
author Ada Lovelace
author-mail <ada@example.com>
author-time 1700000000
author-tz +0000
committer Ada Lovelace
summary initial import
filename app.py
\tos.system('ls')
";

    #[test]
    fn test_parse_porcelain() {
        let blame = parse_porcelain(PORCELAIN).unwrap();
        assert_eq!(blame.revision_id, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(blame.author, "Ada Lovelace");
    }

    #[test]
    fn test_parse_porcelain_rejects_garbage() {
        assert!(parse_porcelain("").is_none());
        assert!(parse_porcelain("fatal: no such path\n").is_none());
    }

    #[test]
    fn test_parse_name_list() {
        let paths = parse_name_list(b"src/app.py\0docs/readme.md\0");
        assert_eq!(
            paths,
            vec![PathBuf::from("src/app.py"), PathBuf::from("docs/readme.md")]
        );
        assert!(parse_name_list(b"").is_empty());
    }

    #[test]
    fn test_staged_contains_absolute_and_relative() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/app.py"), "").unwrap();
        std::fs::write(dir.path().join("other.py"), "").unwrap();

        let staged = StagedFiles::new(dir.path(), vec![PathBuf::from("src/app.py")]);
        assert!(staged.contains(&dir.path().join("src/app.py")));
        assert!(!staged.contains(&dir.path().join("other.py")));
        assert!(staged.contains(Path::new("src/app.py")));
    }

    #[test]
    fn test_missing_git_binary_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let git = GitCli::with_program("definitely-not-a-git-binary");
        assert!(matches!(
            git.staged_paths(dir.path()),
            Err(IntentGrepError::NotARepository(_))
        ));
        assert!(matches!(
            git.blame(&dir.path().join("x.py"), 1),
            Err(IntentGrepError::NotARepository(_))
        ));
    }
}
