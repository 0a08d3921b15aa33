use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One line of a context window around a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub line: usize,
    pub text: String,
}

impl ContextLine {
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
        }
    }
}

/// Last revision that touched a hit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameInfo {
    #[serde(rename = "commit")]
    pub revision_id: String,
    pub author: String,
}

/// A located occurrence of a matching call or literal line.
///
/// `file_path`, `line_number` and `source_text` are fixed at creation; later
/// pipeline stages only attach `context_lines` and `blame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    #[serde(rename = "path")]
    file_path: PathBuf,
    #[serde(rename = "line")]
    line_number: usize,
    #[serde(rename = "code")]
    source_text: String,
    #[serde(rename = "context", default, skip_serializing_if = "Option::is_none")]
    context_lines: Option<Vec<ContextLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blame: Option<BlameInfo>,
}

impl HitRecord {
    pub fn new(file_path: impl Into<PathBuf>, line_number: usize, source_text: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            source_text: source_text.into(),
            context_lines: None,
            blame: None,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// 1-based line of the hit.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn context_lines(&self) -> Option<&[ContextLine]> {
        self.context_lines.as_deref()
    }

    pub fn blame(&self) -> Option<&BlameInfo> {
        self.blame.as_ref()
    }

    pub fn with_context(mut self, lines: Vec<ContextLine>) -> Self {
        self.context_lines = Some(lines);
        self
    }

    pub fn with_blame(mut self, blame: BlameInfo) -> Self {
        self.blame = Some(blame);
        self
    }

    /// Lines this record displays: its context window, or the hit line itself.
    pub fn display_lines(&self) -> Vec<ContextLine> {
        match &self.context_lines {
            Some(lines) => lines.clone(),
            None => vec![ContextLine::new(self.line_number, self.source_text.clone())],
        }
    }
}

/// Hits for a single file, borrowed from a [`MatchSet`].
#[derive(Debug, Clone)]
pub struct FileHits<'a> {
    pub path: &'a Path,
    pub hits: Vec<&'a HitRecord>,
}

/// Result of one scan.
///
/// Records are stored once, in discovery order. The grouped view
/// ([`MatchSet::by_file`]) and the flat view ([`MatchSet::records`]) are both
/// projections of that single sequence, so they cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchSet {
    records: Vec<HitRecord>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<HitRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: HitRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = HitRecord>) {
        self.records.extend(records);
    }

    /// Flat view across all files.
    pub fn records(&self) -> &[HitRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<HitRecord> {
        self.records
    }

    /// Grouped view; files appear in the order their first hit was found.
    pub fn by_file(&self) -> Vec<FileHits<'_>> {
        let mut groups: Vec<FileHits<'_>> = Vec::new();
        let mut index: HashMap<&Path, usize> = HashMap::new();
        for record in &self.records {
            match index.get(record.file_path()) {
                Some(&i) => groups[i].hits.push(record),
                None => {
                    index.insert(record.file_path(), groups.len());
                    groups.push(FileHits {
                        path: record.file_path(),
                        hits: vec![record],
                    });
                }
            }
        }
        groups
    }

    pub fn file_count(&self) -> usize {
        self.by_file().len()
    }

    pub fn hit_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// New set containing only the records accepted by `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> MatchSet
    where
        F: FnMut(&HitRecord) -> bool,
    {
        MatchSet {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// New set with every record passed through `f`.
    pub fn mapped<F>(&self, f: F) -> MatchSet
    where
        F: FnMut(&HitRecord) -> HitRecord,
    {
        MatchSet {
            records: self.records.iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MatchSet {
        MatchSet::from_records(vec![
            HitRecord::new("b.py", 3, "os.system('ls')"),
            HitRecord::new("a.py", 1, "subprocess.run(cmd)"),
            HitRecord::new("b.py", 9, "os.popen('id')"),
        ])
    }

    #[test]
    fn test_grouped_view_keeps_discovery_order() {
        let set = sample();
        let groups = set.by_file();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].path, Path::new("b.py"));
        assert_eq!(
            groups[0].hits.iter().map(|h| h.line_number()).collect::<Vec<_>>(),
            vec![3, 9]
        );
        assert_eq!(groups[1].path, Path::new("a.py"));
    }

    #[test]
    fn test_views_are_consistent() {
        let set = sample();
        let grouped_total: usize = set.by_file().iter().map(|g| g.hits.len()).sum();
        assert_eq!(grouped_total, set.records().len());
        assert_eq!(set.file_count(), 2);
        assert_eq!(set.hit_count(), 3);
    }

    #[test]
    fn test_filtered_produces_new_set() {
        let set = sample();
        let only_b = set.filtered(|r| r.file_path() == Path::new("b.py"));
        assert_eq!(only_b.hit_count(), 2);
        assert_eq!(set.hit_count(), 3);
    }

    #[test]
    fn test_json_shape() {
        let record = HitRecord::new("a.py", 4, "requests.get(url)").with_blame(BlameInfo {
            revision_id: "abc123".into(),
            author: "Dana".into(),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["path"], "a.py");
        assert_eq!(json["line"], 4);
        assert_eq!(json["code"], "requests.get(url)");
        assert_eq!(json["blame"]["commit"], "abc123");
        assert!(json.get("context").is_none());
    }

    #[test]
    fn test_display_lines_fall_back_to_hit() {
        let plain = HitRecord::new("a.py", 2, "x");
        assert_eq!(plain.display_lines(), vec![ContextLine::new(2, "x")]);

        let with_ctx = plain.clone().with_context(vec![
            ContextLine::new(1, "a"),
            ContextLine::new(2, "x"),
        ]);
        assert_eq!(with_ctx.display_lines().len(), 2);
    }
}
