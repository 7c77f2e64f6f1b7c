//! File-backed search history.
//!
//! Persistence is best effort: a missing or corrupt file loads as an empty
//! history, and a failed write keeps the in-memory list usable.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::models::SearchResult;

/// Entries within this many degrees on both axes are the same place.
const DEDUP_EPSILON_DEG: f64 = 1e-4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

/// Newest-first list of previously selected results, capped at `max_items`.
pub struct SearchHistory {
    path: PathBuf,
    max_items: usize,
    entries: Vec<HistoryEntry>,
}

impl SearchHistory {
    /// Load history from `path`; a missing or unreadable file yields an
    /// empty history.
    pub fn load(path: impl Into<PathBuf>, max_items: usize) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("discarding corrupt history file {}: {}", path.display(), err);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            path,
            max_items,
            entries,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Record a selected result, replacing any existing entry for the same
    /// place and trimming to the cap.
    pub fn record(&mut self, result: &SearchResult) {
        self.entries.retain(|entry| {
            (entry.lat - result.lat).abs() > DEDUP_EPSILON_DEG
                || (entry.lng - result.lng).abs() > DEDUP_EPSILON_DEG
        });

        self.entries.insert(
            0,
            HistoryEntry {
                id: Uuid::new_v4(),
                name: result.name.clone(),
                display_name: result.display_name.clone(),
                lat: result.lat,
                lng: result.lng,
                timestamp: Utc::now(),
            },
        );
        self.entries.truncate(self.max_items);
        self.save();
    }

    /// Remove one entry by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.save();
    }

    fn save(&self) {
        let json = match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => json,
            Err(err) => {
                warn!("failed to serialize history: {}", err);
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, json) {
            warn!("failed to persist history to {}: {}", self.path.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, lat: f64, lng: f64) -> SearchResult {
        SearchResult {
            id: Uuid::new_v4(),
            lat,
            lng,
            name: name.to_string(),
            display_name: format!("{}, Somewhere", name),
            kind: "place".to_string(),
            provider: "test".to_string(),
            distance: None,
        }
    }

    fn history_in(dir: &tempfile::TempDir, max_items: usize) -> SearchHistory {
        SearchHistory::load(dir.path().join("history.json"), max_items)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = history_in(&dir, 10);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").unwrap();
        let history = SearchHistory::load(path, 10);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn records_newest_first_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);
        history.record(&result("older", 34.0, -118.0));
        history.record(&result("newer", 35.0, -117.0));

        assert_eq!(history.entries()[0].name, "newer");
        assert_eq!(history.entries()[1].name, "older");

        let reloaded = history_in(&dir, 10);
        assert_eq!(reloaded.entries().len(), 2);
        assert_eq!(reloaded.entries()[0].name, "newer");
    }

    #[test]
    fn nearby_duplicate_replaces_old_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);
        history.record(&result("first visit", 34.0522, -118.2437));
        history.record(&result("second visit", 34.05215, -118.24373));

        assert_eq!(history.entries().len(), 1);
        assert_eq!(history.entries()[0].name, "second visit");
    }

    #[test]
    fn distinct_places_both_survive() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);
        history.record(&result("downtown", 34.0522, -118.2437));
        history.record(&result("uptown", 34.06, -118.2437));
        assert_eq!(history.entries().len(), 2);
    }

    #[test]
    fn list_never_exceeds_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 3);
        for i in 0..5 {
            history.record(&result(&format!("place {}", i), 30.0 + i as f64, -118.0));
        }
        assert_eq!(history.entries().len(), 3);
        assert_eq!(history.entries()[0].name, "place 4");
        assert_eq!(history.entries()[2].name, "place 2");
    }

    #[test]
    fn remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = history_in(&dir, 10);
        history.record(&result("a", 34.0, -118.0));
        history.record(&result("b", 35.0, -118.0));

        let id = history.entries()[0].id;
        assert!(history.remove(id));
        assert!(!history.remove(id));
        assert_eq!(history.entries().len(), 1);

        history.clear();
        assert!(history.entries().is_empty());
        assert!(history_in(&dir, 10).entries().is_empty());
    }
}
