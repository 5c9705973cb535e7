use crate::model::{DiaryEntry, EntryDraft};
use chrono::{Datelike, NaiveDate, Utc};
use directories::ProjectDirs;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("diary store unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("diary data at {path} could not be parsed: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to encode diary data: {0}")]
    Encode(#[source] serde_yaml::Error),
    #[error("no data directory available for the diary")]
    NoDataDir,
}

/// Persistence seam for diary entries, keyed by calendar date. Backends
/// are interchangeable; which one runs is a configuration decision made
/// at startup, not an environment sniff.
pub trait EntryStore {
    fn get(&self, date: NaiveDate) -> Result<Option<DiaryEntry>, StoreError>;

    /// Create-or-merge for the draft's date: a new entry gets fresh
    /// timestamps, an existing one keeps `id` and `created_at` and stamps
    /// `updated_at`. Concurrent writers race as last-write-wins.
    fn upsert(&mut self, draft: EntryDraft) -> Result<DiaryEntry, StoreError>;

    /// All entries, ordered by date ascending.
    fn list(&self) -> Result<Vec<DiaryEntry>, StoreError>;

    fn list_by_month(&self, year: i32, month: u32) -> Result<Vec<DiaryEntry>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .collect())
    }

    /// Anniversary entries for a month/day, excluding today, newest first.
    fn list_on_this_day(
        &self,
        month: u32,
        day: u32,
        today: NaiveDate,
    ) -> Result<Vec<DiaryEntry>, StoreError> {
        let mut matches: Vec<DiaryEntry> = self
            .list()?
            .into_iter()
            .filter(|e| e.date.month() == month && e.date.day() == day && e.date != today)
            .collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matches)
    }

    /// One entry with non-empty content, uniformly chosen.
    fn random_entry(&self) -> Result<Option<DiaryEntry>, StoreError> {
        let candidates: Vec<DiaryEntry> = self
            .list()?
            .into_iter()
            .filter(|e| !e.content.trim().is_empty())
            .collect();
        Ok(candidates.choose(&mut rand::thread_rng()).cloned())
    }

    /// Case-insensitive substring match over content, title, and tags,
    /// newest first.
    fn search(&self, query: &str) -> Result<Vec<DiaryEntry>, StoreError> {
        let mut matches: Vec<DiaryEntry> = self
            .list()?
            .into_iter()
            .filter(|e| e.matches(query))
            .collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// File-backed store: a YAML map of date -> entry
// ---------------------------------------------------------------------------

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = ProjectDirs::from("", "", "daybook").ok_or(StoreError::NoDataDir)?;
        Ok(dirs.data_dir().join("diary.yml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty diary; an unreadable or unparseable one
    /// is an error, never silently empty.
    fn load(&self) -> Result<BTreeMap<NaiveDate, DiaryEntry>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path).map_err(|source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        })?;
        serde_yaml::from_str(&data).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, db: &BTreeMap<NaiveDate, DiaryEntry>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Unavailable {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = serde_yaml::to_string(db).map_err(StoreError::Encode)?;
        fs::write(&self.path, serialized).map_err(|source| StoreError::Unavailable {
            path: self.path.clone(),
            source,
        })
    }
}

impl EntryStore for FileStore {
    fn get(&self, date: NaiveDate) -> Result<Option<DiaryEntry>, StoreError> {
        Ok(self.load()?.remove(&date))
    }

    fn upsert(&mut self, draft: EntryDraft) -> Result<DiaryEntry, StoreError> {
        let mut db = self.load()?;
        let now = Utc::now();
        let entry = match db.get_mut(&draft.date) {
            Some(existing) => {
                existing.revise(draft, now);
                existing.clone()
            }
            None => {
                let entry = DiaryEntry::from_draft(draft, now);
                db.insert(entry.date, entry.clone());
                entry
            }
        };
        self.save(&db)?;
        Ok(entry)
    }

    fn list(&self) -> Result<Vec<DiaryEntry>, StoreError> {
        Ok(self.load()?.into_values().collect())
    }
}

// ---------------------------------------------------------------------------
// In-memory store, for tests and --ephemeral runs
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemStore {
    entries: BTreeMap<NaiveDate, DiaryEntry>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }
}

impl EntryStore for MemStore {
    fn get(&self, date: NaiveDate) -> Result<Option<DiaryEntry>, StoreError> {
        Ok(self.entries.get(&date).cloned())
    }

    fn upsert(&mut self, draft: EntryDraft) -> Result<DiaryEntry, StoreError> {
        let now = Utc::now();
        let entry = match self.entries.get_mut(&draft.date) {
            Some(existing) => {
                existing.revise(draft, now);
                existing.clone()
            }
            None => {
                let entry = DiaryEntry::from_draft(draft, now);
                self.entries.insert(entry.date, entry.clone());
                entry
            }
        };
        Ok(entry)
    }

    fn list(&self) -> Result<Vec<DiaryEntry>, StoreError> {
        Ok(self.entries.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mood;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn draft(d: &str, content: &str) -> EntryDraft {
        EntryDraft {
            date: date(d),
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_file_is_an_empty_diary() {
        let tmp = tempdir().unwrap();
        let store = FileStore::at(tmp.path().join("diary.yml"));
        assert!(store.list().unwrap().is_empty());
        assert!(store.get(date("2025-03-01")).unwrap().is_none());
    }

    #[test]
    fn corrupt_file_surfaces_an_error_not_emptiness() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("diary.yml");
        fs::write(&path, "{{{{not yaml").unwrap();
        let store = FileStore::at(&path);
        assert!(matches!(store.list(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn upsert_is_idempotent_per_date() {
        let tmp = tempdir().unwrap();
        let mut store = FileStore::at(tmp.path().join("diary.yml"));

        let first = store.upsert(draft("2025-03-01", "morning pages")).unwrap();
        let second = store.upsert(draft("2025-03-01", "evening rewrite")).unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content, "evening rewrite");
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn upsert_round_trips_through_the_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/dir/diary.yml");
        {
            let mut store = FileStore::at(&path);
            let mut d = draft("2025-03-01", "persisted");
            d.mood = Mood::Good;
            d.tags = vec!["travel".into()];
            store.upsert(d).unwrap();
        }
        let reopened = FileStore::at(&path);
        let entry = reopened.get(date("2025-03-01")).unwrap().unwrap();
        assert_eq!(entry.content, "persisted");
        assert_eq!(entry.mood, Mood::Good);
        assert_eq!(entry.tags, vec!["travel".to_string()]);
    }

    #[test]
    fn list_is_ordered_by_date() {
        let mut store = MemStore::new();
        store.upsert(draft("2025-03-05", "b")).unwrap();
        store.upsert(draft("2025-03-01", "a")).unwrap();
        let dates: Vec<NaiveDate> = store.list().unwrap().iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date("2025-03-01"), date("2025-03-05")]);
    }

    #[test]
    fn month_listing_filters_by_calendar_month() {
        let mut store = MemStore::new();
        store.upsert(draft("2025-03-05", "in")).unwrap();
        store.upsert(draft("2025-04-05", "out")).unwrap();
        let march = store.list_by_month(2025, 3).unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].content, "in");
    }

    #[test]
    fn on_this_day_excludes_today_and_sorts_newest_first() {
        let mut store = MemStore::new();
        store.upsert(draft("2023-03-10", "two years ago")).unwrap();
        store.upsert(draft("2024-03-10", "last year")).unwrap();
        store.upsert(draft("2025-03-10", "today")).unwrap();
        store.upsert(draft("2025-03-11", "unrelated")).unwrap();

        let hits = store.list_on_this_day(3, 10, date("2025-03-10")).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "last year");
        assert_eq!(hits[1].content, "two years ago");
    }

    #[test]
    fn random_entry_skips_blank_content() {
        let mut store = MemStore::new();
        store.upsert(draft("2025-03-01", "   ")).unwrap();
        assert!(store.random_entry().unwrap().is_none());

        store.upsert(draft("2025-03-02", "something")).unwrap();
        let picked = store.random_entry().unwrap().unwrap();
        assert_eq!(picked.content, "something");
    }

    #[test]
    fn search_reaches_tags_case_insensitively() {
        let mut store = MemStore::new();
        let mut d = draft("2025-03-01", "plain day");
        d.tags = vec!["abc".into()];
        store.upsert(d).unwrap();

        let hits = store.search("ABC").unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.search("zzz").unwrap().is_empty());
    }
}
