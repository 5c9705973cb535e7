use crate::model::{DiaryEntry, EntryDraft};
use crate::schedule::default_schedule;
use crate::storage::EntryStore;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Idle window after the last edit before an autosave fires.
pub const AUTOSAVE_WINDOW: Duration = Duration::from_millis(1000);

/// The editor-facing wrapper around a store.
pub struct Diary {
    store: Box<dyn EntryStore>,
}

pub struct ReviewBundle {
    pub on_this_day: Vec<DiaryEntry>,
    pub random: Option<DiaryEntry>,
}

impl Diary {
    pub fn new(store: Box<dyn EntryStore>) -> Self {
        Diary { store }
    }

    pub fn store(&self) -> &dyn EntryStore {
        self.store.as_ref()
    }

    /// The stored entry for a date, or a fresh draft seeded with the
    /// default sleep blocks.
    pub fn load_day(&self, date: NaiveDate) -> Result<EntryDraft> {
        match self.store.get(date).context("loading entry")? {
            Some(entry) => Ok(EntryDraft::of_entry(&entry)),
            None => Ok(EntryDraft {
                date,
                schedule: default_schedule(),
                ..Default::default()
            }),
        }
    }

    pub fn save_day(&mut self, draft: EntryDraft) -> Result<DiaryEntry> {
        self.store.upsert(draft).context("saving entry")
    }

    /// Tag-autocomplete candidates scanned from every entry, filtered by a
    /// case-insensitive prefix.
    pub fn tag_suggestions(&self, prefix: &str) -> Result<Vec<String>> {
        let lower = prefix.to_lowercase();
        let tags: BTreeSet<String> = self
            .store
            .list()
            .context("scanning tags")?
            .into_iter()
            .flat_map(|e| e.tags)
            .filter(|t| t.to_lowercase().starts_with(&lower))
            .collect();
        Ok(tags.into_iter().collect())
    }

    /// "On this day" anniversaries plus a random recall entry when fewer
    /// than three anniversaries exist.
    pub fn review(&self, today: NaiveDate) -> Result<ReviewBundle> {
        let on_this_day = self
            .store
            .list_on_this_day(today.month(), today.day(), today)
            .context("collecting anniversaries")?;
        let random = if on_this_day.len() < 3 {
            self.store.random_entry().context("picking a recall entry")?
        } else {
            None
        };
        Ok(ReviewBundle {
            on_this_day,
            random,
        })
    }

    pub fn export_json(&self) -> Result<String> {
        let entries = self.store.list().context("collecting entries")?;
        serde_json::to_string_pretty(&entries).context("encoding export")
    }

    /// One `# date - title` block per entry with content and a trailing
    /// tag line.
    pub fn export_markdown(&self) -> Result<String> {
        let entries = self.store.list().context("collecting entries")?;
        let blocks: Vec<String> = entries
            .iter()
            .map(|e| {
                let heading = match &e.title {
                    Some(title) => format!("# {} - {}", e.date, title),
                    None => format!("# {}", e.date),
                };
                format!(
                    "{}\n\n{}\n\nTags: {}\n\n---\n",
                    heading,
                    e.content,
                    e.tags.join(", ")
                )
            })
            .collect();
        Ok(blocks.join("\n"))
    }
}

/// Trailing-edge debounce: every edit cancels the pending deadline and
/// arms a new one, so only the final state inside an idle window is
/// persisted. The owner flushes on teardown.
pub struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Debounce {
            window,
            deadline: None,
        }
    }

    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the idle window has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mood;
    use crate::storage::MemStore;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn diary() -> Diary {
        Diary::new(Box::new(MemStore::new()))
    }

    fn saved(diary: &mut Diary, d: &str, content: &str, tags: &[&str]) {
        let mut draft = diary.load_day(date(d)).unwrap();
        draft.content = content.into();
        draft.tags = tags.iter().map(|t| t.to_string()).collect();
        diary.save_day(draft).unwrap();
    }

    #[test]
    fn fresh_day_is_seeded_with_sleep_blocks() {
        let diary = diary();
        let draft = diary.load_day(date("2025-03-01")).unwrap();
        assert_eq!(draft.schedule.len(), 2);
        assert!(draft.content.is_empty());
    }

    #[test]
    fn saved_day_loads_back_without_reseeding() {
        let mut diary = diary();
        let mut draft = diary.load_day(date("2025-03-01")).unwrap();
        draft.content = "kept".into();
        draft.schedule.clear();
        diary.save_day(draft).unwrap();

        let reloaded = diary.load_day(date("2025-03-01")).unwrap();
        assert_eq!(reloaded.content, "kept");
        assert!(reloaded.schedule.is_empty());
    }

    #[test]
    fn review_adds_random_recall_when_few_anniversaries() {
        let mut diary = diary();
        saved(&mut diary, "2024-03-10", "a year ago", &[]);
        saved(&mut diary, "2025-02-01", "filler", &[]);

        let bundle = diary.review(date("2025-03-10")).unwrap();
        assert_eq!(bundle.on_this_day.len(), 1);
        assert!(bundle.random.is_some());
    }

    #[test]
    fn review_skips_random_with_three_anniversaries() {
        let mut diary = diary();
        saved(&mut diary, "2022-03-10", "x", &[]);
        saved(&mut diary, "2023-03-10", "y", &[]);
        saved(&mut diary, "2024-03-10", "z", &[]);

        let bundle = diary.review(date("2025-03-10")).unwrap();
        assert_eq!(bundle.on_this_day.len(), 3);
        assert!(bundle.random.is_none());
    }

    #[test]
    fn tag_suggestions_dedupe_and_filter_by_prefix() {
        let mut diary = diary();
        saved(&mut diary, "2025-03-01", "x", &["travel", "tea"]);
        saved(&mut diary, "2025-03-02", "y", &["travel", "work"]);

        assert_eq!(
            diary.tag_suggestions("t").unwrap(),
            vec!["tea".to_string(), "travel".to_string()]
        );
        assert_eq!(diary.tag_suggestions("TR").unwrap(), vec!["travel".to_string()]);
        assert_eq!(diary.tag_suggestions("").unwrap().len(), 3);
    }

    #[test]
    fn markdown_export_formats_heading_blocks() {
        let mut diary = diary();
        let mut draft = diary.load_day(date("2025-03-01")).unwrap();
        draft.title = Some("Hiking".into());
        draft.content = "Up the ridge.".into();
        draft.tags = vec!["outdoors".into()];
        draft.mood = Mood::Excellent;
        diary.save_day(draft).unwrap();

        let md = diary.export_markdown().unwrap();
        assert!(md.contains("# 2025-03-01 - Hiking"));
        assert!(md.contains("Up the ridge."));
        assert!(md.contains("Tags: outdoors"));
        assert!(md.contains("---"));
    }

    #[test]
    fn json_export_round_trips() {
        let mut diary = diary();
        saved(&mut diary, "2025-03-01", "exported", &["tag"]);
        let json = diary.export_json().unwrap();
        let parsed: Vec<DiaryEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].content, "exported");
    }

    #[test]
    fn debounce_is_trailing_edge() {
        let mut debounce = Debounce::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        debounce.poke(t0);
        assert!(!debounce.fire(t0 + Duration::from_millis(500)));

        // a second edit pushes the deadline out
        debounce.poke(t0 + Duration::from_millis(500));
        assert!(!debounce.fire(t0 + Duration::from_millis(1100)));
        assert!(debounce.fire(t0 + Duration::from_millis(1500)));

        // fires only once per armed window
        assert!(!debounce.fire(t0 + Duration::from_millis(2000)));
        assert!(!debounce.pending());
    }

    #[test]
    fn debounce_cancel_drops_the_pending_save() {
        let mut debounce = Debounce::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        debounce.poke(t0);
        debounce.cancel();
        assert!(!debounce.fire(t0 + Duration::from_secs(10)));
    }
}
