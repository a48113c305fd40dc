use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constants::file_source::{DEFAULT_SOURCE_ID, JSON_EXTENSION, JSONL_EXTENSION};
use crate::data::Item;
use crate::errors::GenerationError;
use crate::source::ItemSource;
use crate::types::TopicId;

/// Item source reading question files under a directory tree.
///
/// `*.json` files hold either one item object or an array of items; `*.jsonl`
/// files hold one item per line. Other files are ignored. Files are read in
/// sorted path order so pools are stable across runs.
pub struct FileItemSource {
    id: String,
    root: PathBuf,
    follow_links: bool,
}

impl FileItemSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            id: DEFAULT_SOURCE_ID.to_string(),
            root: root.into(),
            follow_links: false,
        }
    }

    /// Override the reported source id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Configure symlink traversal.
    pub fn with_follow_symlinks(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    fn item_files(&self) -> Result<Vec<PathBuf>, GenerationError> {
        if !self.root.is_dir() {
            return Err(GenerationError::SourceUnavailable {
                source_id: self.id.clone(),
                reason: format!("{} is not a directory", self.root.display()),
            });
        }
        let mut walker = WalkDir::new(&self.root);
        if self.follow_links {
            walker = walker.follow_links(true);
        }
        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path().to_path_buf())
            .filter(|path| matches!(extension(path), Some(JSON_EXTENSION | JSONL_EXTENSION)))
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<Item>, GenerationError> {
        let raw = fs::read_to_string(path)?;
        if extension(path) == Some(JSONL_EXTENSION) {
            let mut items = Vec::new();
            for (line_no, line) in raw.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let item = serde_json::from_str(line).map_err(|err| {
                    GenerationError::SourceInconsistent {
                        source_id: self.id.clone(),
                        details: format!("{}:{}: {err}", path.display(), line_no + 1),
                    }
                })?;
                items.push(item);
            }
            return Ok(items);
        }
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else {
            Ok(vec![serde_json::from_value(value)?])
        }
    }
}

impl ItemSource for FileItemSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load_items(&self, topics: &[TopicId]) -> Result<Vec<Item>, GenerationError> {
        let files = self.item_files()?;
        if files.is_empty() {
            warn!(source = %self.id, root = %self.root.display(), "no item files found");
        }
        let mut items = Vec::new();
        for path in &files {
            let loaded = self.read_file(path)?;
            debug!(source = %self.id, path = %path.display(), count = loaded.len(), "loaded item file");
            items.extend(
                loaded
                    .into_iter()
                    .filter(|item| topics.is_empty() || topics.contains(&item.topic)),
            );
        }
        Ok(items)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_arrays_objects_and_lines_in_path_order() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("chem");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp.path().join("a.json"),
            r#"[{"id":"q1","topic":"t1","marks":3},{"id":"q2","topic":"t2","marks":4}]"#,
        )
        .unwrap();
        fs::write(
            nested.join("b.jsonl"),
            "{\"id\":\"q3\",\"topic\":\"t1\",\"marks\":2}\n\n{\"id\":\"q4\",\"topic\":\"t1\",\"marks\":1}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("c.json"),
            r#"{"id":"q5","topic":"t1","marks":5,"nested":true}"#,
        )
        .unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let source = FileItemSource::new(temp.path());
        let ids: Vec<String> = source
            .load_items(&["t1".to_string()])
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec!["q1", "q5", "q3", "q4"]);
    }

    #[test]
    fn missing_root_is_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let source = FileItemSource::new(temp.path().join("absent")).with_id("bank");
        let err = source.load_items(&[]).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::SourceUnavailable { ref source_id, .. } if source_id == "bank"
        ));
    }

    #[test]
    fn malformed_line_reports_location() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("bad.jsonl"), "{\"id\":\"q1\"}\n").unwrap();
        let err = FileItemSource::new(temp.path()).load_items(&[]).unwrap_err();
        match err {
            GenerationError::SourceInconsistent { details, .. } => {
                assert!(details.contains("bad.jsonl:1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
