//! Read-side projections over the whole entry collection. Everything here
//! is a pure fold; nothing touches the store.

use crate::model::{DiaryEntry, Mood};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const HEATMAP_DAYS: i64 = 365;
const TAG_RANKING_MIN_ENTRIES: usize = 2;
const TAG_RANKING_LIMIT: usize = 5;
const TAG_CLOUD_LIMIT: usize = 20;
const MONTHS_BACK: u32 = 12;

#[derive(Debug, Clone)]
pub struct Stats {
    pub total_entries: usize,
    pub total_chars: usize,
    pub streak: u32,
    /// Trailing 12 calendar months, oldest first.
    pub monthly: Vec<MonthCount>,
    /// Sunday-first.
    pub weekday_counts: [usize; 7],
    pub mood_counts: Vec<(Mood, usize)>,
    pub tag_mood_ranking: Vec<TagMood>,
    pub tag_cloud: Vec<(String, usize)>,
    pub heatmap: Vec<HeatCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagMood {
    pub tag: String,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub level: u8,
}

/// Consecutive-day run ending at `today`, or at yesterday when today has
/// no entry yet.
pub fn streak(dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut check = if dates.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut run = 0;
    while dates.contains(&check) {
        run += 1;
        check = check - Duration::days(1);
    }
    run
}

/// Five intensity levels by content length, matching the activity heatmap.
pub fn heat_level(content_chars: usize) -> u8 {
    match content_chars {
        0 => 1, // an entry exists even when empty of text
        n if n > 400 => 4,
        n if n > 200 => 3,
        n if n > 100 => 2,
        _ => 1,
    }
}

impl Stats {
    pub fn compute(entries: &[DiaryEntry], today: NaiveDate) -> Stats {
        let dates: HashSet<NaiveDate> = entries.iter().map(|e| e.date).collect();
        let by_date: HashMap<NaiveDate, &DiaryEntry> =
            entries.iter().map(|e| (e.date, e)).collect();

        let total_chars = entries.iter().map(|e| e.content.chars().count()).sum();

        let mut monthly = Vec::with_capacity(MONTHS_BACK as usize);
        let (mut year, mut month) = (today.year(), today.month());
        for _ in 0..MONTHS_BACK {
            let count = entries
                .iter()
                .filter(|e| e.date.year() == year && e.date.month() == month)
                .count();
            monthly.push(MonthCount { year, month, count });
            if month == 1 {
                year -= 1;
                month = 12;
            } else {
                month -= 1;
            }
        }
        monthly.reverse();

        let mut weekday_counts = [0usize; 7];
        for entry in entries {
            weekday_counts[entry.date.weekday().num_days_from_sunday() as usize] += 1;
        }

        let mut mood_counts: Vec<(Mood, usize)> = Mood::ALL
            .iter()
            .map(|&mood| (mood, entries.iter().filter(|e| e.mood == mood).count()))
            .filter(|(_, count)| *count > 0)
            .collect();
        mood_counts.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.score().cmp(&a.0.score())));

        let mut tag_scores: BTreeMap<String, (u32, usize)> = BTreeMap::new();
        for entry in entries {
            for tag in &entry.tags {
                let slot = tag_scores.entry(tag.clone()).or_insert((0, 0));
                slot.0 += entry.mood.score();
                slot.1 += 1;
            }
        }
        let mut tag_mood_ranking: Vec<TagMood> = tag_scores
            .iter()
            .filter(|(_, (_, count))| *count >= TAG_RANKING_MIN_ENTRIES)
            .map(|(tag, (total, count))| TagMood {
                tag: tag.clone(),
                average: *total as f64 / *count as f64,
                count: *count,
            })
            .collect();
        tag_mood_ranking.sort_by(|a, b| {
            b.average
                .partial_cmp(&a.average)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tag.cmp(&b.tag))
        });
        tag_mood_ranking.truncate(TAG_RANKING_LIMIT);

        let mut tag_cloud: Vec<(String, usize)> = tag_scores
            .into_iter()
            .map(|(tag, (_, count))| (tag, count))
            .collect();
        tag_cloud.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        tag_cloud.truncate(TAG_CLOUD_LIMIT);

        let heatmap = (0..HEATMAP_DAYS)
            .map(|offset| {
                let date = today - Duration::days(HEATMAP_DAYS - 1 - offset);
                let level = by_date
                    .get(&date)
                    .map(|e| heat_level(e.content.chars().count()))
                    .unwrap_or(0);
                HeatCell { date, level }
            })
            .collect();

        Stats {
            total_entries: entries.len(),
            total_chars,
            streak: streak(&dates, today),
            monthly,
            weekday_counts,
            mood_counts,
            tag_mood_ranking,
            tag_cloud,
            heatmap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryDraft;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(d: &str, content: &str, mood: Mood, tags: &[&str]) -> DiaryEntry {
        DiaryEntry::from_draft(
            EntryDraft {
                date: date(d),
                content: content.into(),
                mood,
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    #[test]
    fn streak_counts_back_from_today() {
        let dates: HashSet<NaiveDate> = ["2025-03-10", "2025-03-09", "2025-03-08"]
            .iter()
            .map(|s| date(s))
            .collect();
        assert_eq!(streak(&dates, date("2025-03-10")), 3);
    }

    #[test]
    fn streak_starts_yesterday_when_today_unwritten() {
        let dates: HashSet<NaiveDate> = ["2025-03-09", "2025-03-08"]
            .iter()
            .map(|s| date(s))
            .collect();
        assert_eq!(streak(&dates, date("2025-03-10")), 2);
    }

    #[test]
    fn streak_is_zero_with_a_gap() {
        let dates: HashSet<NaiveDate> = [date("2025-03-07")].into_iter().collect();
        assert_eq!(streak(&dates, date("2025-03-10")), 0);
    }

    #[test]
    fn heat_levels_follow_content_length() {
        assert_eq!(heat_level(0), 1);
        assert_eq!(heat_level(50), 1);
        assert_eq!(heat_level(150), 2);
        assert_eq!(heat_level(250), 3);
        assert_eq!(heat_level(450), 4);
    }

    #[test]
    fn heatmap_spans_a_trailing_year() {
        let entries = vec![entry("2025-03-10", "hello", Mood::Good, &[])];
        let stats = Stats::compute(&entries, date("2025-03-10"));
        assert_eq!(stats.heatmap.len(), 365);
        assert_eq!(stats.heatmap.last().unwrap().date, date("2025-03-10"));
        assert_eq!(stats.heatmap.last().unwrap().level, 1);
        assert_eq!(stats.heatmap[0].level, 0);
    }

    #[test]
    fn tag_ranking_requires_two_appearances() {
        let entries = vec![
            entry("2025-03-01", "x", Mood::Excellent, &["climbing"]),
            entry("2025-03-02", "x", Mood::Good, &["climbing", "rain"]),
            entry("2025-03-03", "x", Mood::Terrible, &["rain"]),
        ];
        let stats = Stats::compute(&entries, date("2025-03-10"));
        assert_eq!(stats.tag_mood_ranking.len(), 2);
        assert_eq!(stats.tag_mood_ranking[0].tag, "climbing");
        assert!((stats.tag_mood_ranking[0].average - 4.5).abs() < 1e-9);
        assert_eq!(stats.tag_mood_ranking[1].tag, "rain");
        assert!((stats.tag_mood_ranking[1].average - 2.5).abs() < 1e-9);

        // a tag used once never ranks
        let entries = vec![entry("2025-03-01", "x", Mood::Excellent, &["once"])];
        let stats = Stats::compute(&entries, date("2025-03-10"));
        assert!(stats.tag_mood_ranking.is_empty());
    }

    #[test]
    fn monthly_counts_cover_twelve_months() {
        let entries = vec![
            entry("2025-03-01", "x", Mood::Normal, &[]),
            entry("2025-03-15", "x", Mood::Normal, &[]),
            entry("2024-04-02", "x", Mood::Normal, &[]),
            entry("2024-03-02", "x", Mood::Normal, &[]), // 13 months back: outside
        ];
        let stats = Stats::compute(&entries, date("2025-03-10"));
        assert_eq!(stats.monthly.len(), 12);
        assert_eq!(stats.monthly[0].year, 2024);
        assert_eq!(stats.monthly[0].month, 4);
        assert_eq!(stats.monthly[0].count, 1);
        let last = stats.monthly.last().unwrap();
        assert_eq!((last.year, last.month, last.count), (2025, 3, 2));
    }

    #[test]
    fn weekday_counts_are_sunday_first() {
        // 2025-03-09 is a Sunday, 2025-03-10 a Monday
        let entries = vec![
            entry("2025-03-09", "x", Mood::Normal, &[]),
            entry("2025-03-10", "x", Mood::Normal, &[]),
        ];
        let stats = Stats::compute(&entries, date("2025-03-10"));
        assert_eq!(stats.weekday_counts[0], 1);
        assert_eq!(stats.weekday_counts[1], 1);
        assert_eq!(stats.weekday_counts[2..].iter().sum::<usize>(), 0);
    }

    #[test]
    fn mood_histogram_sorted_by_frequency() {
        let entries = vec![
            entry("2025-03-01", "x", Mood::Good, &[]),
            entry("2025-03-02", "x", Mood::Good, &[]),
            entry("2025-03-03", "x", Mood::Bad, &[]),
        ];
        let stats = Stats::compute(&entries, date("2025-03-10"));
        assert_eq!(stats.mood_counts[0], (Mood::Good, 2));
        assert_eq!(stats.mood_counts[1], (Mood::Bad, 1));
    }
}
