use chrono::{DateTime, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EntryId = String;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DiaryEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub title: Option<String>,
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
    pub schedule: Vec<ScheduleItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excellent,
    Good,
    #[default]
    Normal,
    Bad,
    Terrible,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Research,
    University,
    Work,
    Dev,
    Study,
    Reading,
    Hobby,
    Routine,
    Commute,
    Sleep,
    #[default]
    Other,
}

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("unknown mood: {0} (expected excellent/good/normal/bad/terrible)")]
    UnknownMood(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl DiaryEntry {
    pub fn from_draft(draft: EntryDraft, now: DateTime<Utc>) -> Self {
        DiaryEntry {
            id: generate_id(),
            date: draft.date,
            title: draft.title,
            content: draft.content,
            mood: draft.mood,
            tags: draft.tags,
            schedule: draft.schedule,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a draft into an existing entry, keeping `id` and `created_at`.
    pub fn revise(&mut self, draft: EntryDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.content = draft.content;
        self.mood = draft.mood;
        self.tags = draft.tags;
        self.schedule = draft.schedule;
        self.updated_at = now;
    }

    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.content.to_lowercase().contains(&q)
            || self
                .title
                .as_deref()
                .map(|t| t.to_lowercase().contains(&q))
                .unwrap_or(false)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }
}

impl EntryDraft {
    pub fn of_entry(entry: &DiaryEntry) -> Self {
        EntryDraft {
            date: entry.date,
            title: entry.title.clone(),
            content: entry.content.clone(),
            mood: entry.mood,
            tags: entry.tags.clone(),
            schedule: entry.schedule.clone(),
        }
    }
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Excellent,
        Mood::Good,
        Mood::Normal,
        Mood::Bad,
        Mood::Terrible,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Mood::Excellent => "excellent",
            Mood::Good => "good",
            Mood::Normal => "normal",
            Mood::Bad => "bad",
            Mood::Terrible => "terrible",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Excellent => "😆",
            Mood::Good => "😊",
            Mood::Normal => "😶",
            Mood::Bad => "😞",
            Mood::Terrible => "😫",
        }
    }

    /// 5 down to 1, used for per-tag mood averages.
    pub fn score(&self) -> u32 {
        match self {
            Mood::Excellent => 5,
            Mood::Good => 4,
            Mood::Normal => 3,
            Mood::Bad => 2,
            Mood::Terrible => 1,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Mood {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.key() == lower)
            .ok_or_else(|| ModelError::UnknownMood(s.to_string()))
    }
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Research,
        Category::University,
        Category::Work,
        Category::Dev,
        Category::Study,
        Category::Reading,
        Category::Hobby,
        Category::Routine,
        Category::Commute,
        Category::Sleep,
        Category::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Research => "research",
            Category::University => "university",
            Category::Work => "work",
            Category::Dev => "dev",
            Category::Study => "study",
            Category::Reading => "reading",
            Category::Hobby => "hobby",
            Category::Routine => "routine",
            Category::Commute => "commute",
            Category::Sleep => "sleep",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.key() == lower)
            .ok_or_else(|| ModelError::UnknownCategory(s.to_string()))
    }
}

pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn revise_keeps_identity_and_created_at() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap();
        let draft = EntryDraft {
            date: date("2025-03-01"),
            content: "first".into(),
            ..Default::default()
        };
        let mut entry = DiaryEntry::from_draft(draft, t0);
        let id = entry.id.clone();

        entry.revise(
            EntryDraft {
                date: date("2025-03-01"),
                content: "second".into(),
                ..Default::default()
            },
            t1,
        );
        assert_eq!(entry.id, id);
        assert_eq!(entry.created_at, t0);
        assert_eq!(entry.updated_at, t1);
        assert_eq!(entry.content, "second");
    }

    #[test]
    fn search_match_is_case_insensitive_across_fields() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let entry = DiaryEntry::from_draft(
            EntryDraft {
                date: date("2025-03-01"),
                title: Some("Trip Planning".into()),
                content: "packed the bags".into(),
                tags: vec!["abc".into()],
                ..Default::default()
            },
            t,
        );
        assert!(entry.matches("ABC"));
        assert!(entry.matches("trip"));
        assert!(entry.matches("BAGS"));
        assert!(!entry.matches("xyz"));
    }

    #[test]
    fn schedule_item_serializes_with_camel_case_times() {
        let item = ScheduleItem {
            id: "abc123".into(),
            start_time: "09:00".into(),
            end_time: "10:30".into(),
            title: "standup".into(),
            description: None,
            category: Category::Work,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"startTime\":\"09:00\""));
        assert!(json.contains("\"endTime\":\"10:30\""));
        assert!(json.contains("\"category\":\"work\""));
    }
}
