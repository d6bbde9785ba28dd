//! Core HistoryStore implementation

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Unique identifier for a record (the file stem, e.g. `prompt_2025-01-01_10-00-00`)
pub type RecordId = String;

/// One completed wizard session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Local time the session completed, formatted with [`crate::TIMESTAMP_FORMAT`]
    pub timestamp: String,
    /// Department label the prompt was generated for
    pub department: String,
    /// Request as the user first typed it
    pub original_request: String,
    /// Final synthesized prompt text
    pub final_prompt: String,
    /// Number of clarifying questions the user answered
    pub total_questions: usize,
}

impl HistoryRecord {
    /// Build a record stamped with the current local time
    pub fn new(
        department: impl Into<String>,
        original_request: impl Into<String>,
        final_prompt: impl Into<String>,
        total_questions: usize,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().format(crate::TIMESTAMP_FORMAT).to_string(),
            department: department.into(),
            original_request: original_request.into(),
            final_prompt: final_prompt.into(),
            total_questions,
        }
    }
}

/// Options for searching
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results
    pub max_results: usize,
    /// Case insensitive search
    pub case_insensitive: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            case_insensitive: false,
        }
    }
}

/// A search match result
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Record containing the match
    pub record_id: RecordId,
    /// Which field matched (`original_request` or `final_prompt`)
    pub field: &'static str,
    /// Snippet of matching text
    pub snippet: String,
}

/// Aggregate statistics over all records
#[derive(Debug, Clone, Default)]
pub struct HistoryStats {
    /// Number of records
    pub record_count: usize,
    /// Sum of answered questions across records
    pub total_questions: usize,
    /// Record count per department label
    pub by_department: BTreeMap<String, usize>,
}

/// The main history store
pub struct HistoryStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl HistoryStore {
    /// Open or create a history store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create history directory")?;
        debug!(?base_path, "Opened history store");
        Ok(Self { base_path })
    }

    /// Directory the records live in
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Write a record as `prompt_<timestamp>.json`, never overwriting an existing one
    pub fn save(&self, record: &HistoryRecord) -> Result<RecordId> {
        let stem = format!("prompt_{}", record.timestamp);
        let mut record_id = stem.clone();
        let mut suffix = 1;
        while self.record_path(&record_id)?.exists() {
            suffix += 1;
            record_id = format!("{}-{}", stem, suffix);
        }

        let content = serde_json::to_string_pretty(record)?;
        let path = self.record_path(&record_id)?;
        fs::write(&path, content).context(format!("Failed to write record: {}", path.display()))?;

        info!(record_id, department = %record.department, "Saved history record");
        Ok(record_id)
    }

    /// Load a single record
    pub fn get(&self, record_id: &str) -> Result<HistoryRecord> {
        let path = self.record_path(record_id)?;
        if !path.exists() {
            return Err(eyre::eyre!("Record not found: {}", record_id));
        }
        let content = fs::read_to_string(&path).context(format!("Failed to read record: {}", record_id))?;
        let record = serde_json::from_str(&content).context(format!("Malformed record: {}", record_id))?;
        Ok(record)
    }

    /// List all records, oldest first
    pub fn list(&self) -> Result<Vec<(RecordId, HistoryRecord)>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.get(&id)?;
            records.push((id, record));
        }
        Ok(records)
    }

    /// Search requests and prompts for a regex pattern
    pub fn search(&self, pattern: &str, options: SearchOptions) -> Result<Vec<SearchMatch>> {
        let regex = if options.case_insensitive {
            regex::RegexBuilder::new(pattern).case_insensitive(true).build()?
        } else {
            regex::Regex::new(pattern)?
        };

        let mut matches = Vec::new();

        for (record_id, record) in self.list()? {
            let fields = [
                ("original_request", record.original_request.as_str()),
                ("final_prompt", record.final_prompt.as_str()),
            ];
            for (field, content) in fields {
                if let Some(m) = regex.find(content) {
                    matches.push(SearchMatch {
                        record_id: record_id.clone(),
                        field,
                        snippet: snippet_around(content, m.start(), m.end(), 30),
                    });

                    if matches.len() >= options.max_results {
                        return Ok(matches);
                    }
                }
            }
        }

        Ok(matches)
    }

    /// Get statistics over all records
    pub fn stats(&self) -> Result<HistoryStats> {
        let mut stats = HistoryStats::default();
        for (_, record) in self.list()? {
            stats.record_count += 1;
            stats.total_questions += record.total_questions;
            *stats.by_department.entry(record.department).or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Delete a record
    pub fn delete(&self, record_id: &str) -> Result<()> {
        let path = self.record_path(record_id)?;
        if path.exists() {
            fs::remove_file(&path)?;
            info!(record_id, "Deleted history record");
        }
        Ok(())
    }

    /// Path of a record inside the store; ids that could escape it are rejected
    fn record_path(&self, record_id: &str) -> Result<PathBuf> {
        if record_id.is_empty() || record_id.contains(['/', '\\']) || record_id.contains("..") {
            return Err(eyre::eyre!("Invalid record id: {}", record_id));
        }
        Ok(self.base_path.join(format!("{}.json", record_id)))
    }
}

/// Slice `radius` bytes either side of a match, widened to char boundaries
fn snippet_around(content: &str, start: usize, end: usize, radius: usize) -> String {
    let mut from = start.saturating_sub(radius);
    while !content.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + radius).min(content.len());
    while !content.is_char_boundary(to) {
        to += 1;
    }
    content[from..to].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(timestamp: &str, department: &str, request: &str) -> HistoryRecord {
        HistoryRecord {
            timestamp: timestamp.to_string(),
            department: department.to_string(),
            original_request: request.to_string(),
            final_prompt: format!("You are an expert. Task: {}", request),
            total_questions: 3,
        }
    }

    #[test]
    fn test_save_and_get() {
        let temp = TempDir::new().unwrap();
        let store = HistoryStore::open(temp.path().join("history")).unwrap();

        let rec = record("2025-01-01_10-00-00", "Content", "Write a blog post about rust");
        let id = store.save(&rec).unwrap();

        assert_eq!(id, "prompt_2025-01-01_10-00-00");
        assert_eq!(store.get(&id).unwrap(), rec);
    }

    #[test]
    fn test_save_does_not_overwrite_same_timestamp() {
        let temp = TempDir::new().unwrap();
        let store = HistoryStore::open(temp.path()).unwrap();

        let first = store.save(&record("2025-01-01_10-00-00", "Content", "one")).unwrap();
        let second = store.save(&record("2025-01-01_10-00-00", "Martech", "two")).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, "prompt_2025-01-01_10-00-00-2");
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_list_is_sorted_and_skips_other_files() {
        let temp = TempDir::new().unwrap();
        let store = HistoryStore::open(temp.path()).unwrap();
        fs::write(temp.path().join("notes.txt"), "not a record").unwrap();

        store.save(&record("2025-02-01_09-00-00", "Solutions", "later")).unwrap();
        store.save(&record("2025-01-01_09-00-00", "Solutions", "earlier")).unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1.original_request, "earlier");
        assert_eq!(records[1].1.original_request, "later");
    }

    #[test]
    fn test_search_and_stats() {
        let temp = TempDir::new().unwrap();
        let store = HistoryStore::open(temp.path()).unwrap();

        store.save(&record("2025-01-01_10-00-00", "Digital Marketing", "Social media campaign")).unwrap();
        store.save(&record("2025-01-02_10-00-00", "AI Engineering", "Fraud detection model")).unwrap();

        let matches = store
            .search(
                "CAMPAIGN",
                SearchOptions {
                    case_insensitive: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].field, "original_request");
        assert!(matches[0].snippet.contains("campaign"));

        assert!(store.search("CAMPAIGN", SearchOptions::default()).unwrap().is_empty());

        let stats = store.stats().unwrap();
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.total_questions, 6);
        assert_eq!(stats.by_department.get("AI Engineering"), Some(&1));
    }

    #[test]
    fn test_delete_and_missing_record() {
        let temp = TempDir::new().unwrap();
        let store = HistoryStore::open(temp.path()).unwrap();

        let id = store.save(&record("2025-01-01_10-00-00", "Content", "x")).unwrap();
        store.delete(&id).unwrap();

        assert!(store.get(&id).is_err());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_ids_outside_the_store_are_rejected() {
        let temp = TempDir::new().unwrap();
        let store = HistoryStore::open(temp.path().join("history")).unwrap();
        let outside = temp.path().join("x.json");
        fs::write(&outside, "{}").unwrap();

        for id in ["../x", "..", "a/b", "a\\b", ""] {
            assert!(store.delete(id).is_err(), "delete accepted {:?}", id);
            assert!(store.get(id).is_err(), "get accepted {:?}", id);
        }
        assert!(outside.exists());
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let content = "ééééé campaign ééééé";
        let start = content.find("campaign").unwrap();
        let snippet = snippet_around(content, start, start + 8, 3);
        assert!(snippet.contains("campaign"));
    }
}
