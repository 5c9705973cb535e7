use crate::model::{generate_id, Category, ScheduleItem};

pub const DAY_MINUTES: i32 = 1440;
pub const SNAP_MINUTES: i32 = 15;
/// Shortest block a resize can leave behind.
pub const MIN_ITEM_MINUTES: i32 = 15;

pub const DAY_END: &str = "23:59";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid clock time: {0} (expected HH:MM)")]
    Malformed(String),
    #[error("clock time out of range: {0}")]
    OutOfRange(String),
}

/// "HH:MM" to minutes since midnight, in [0, 1439].
pub fn parse_time(s: &str) -> Result<i32, TimeParseError> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| TimeParseError::Malformed(s.to_string()))?;
    let hours: i32 = h
        .parse()
        .map_err(|_| TimeParseError::Malformed(s.to_string()))?;
    let minutes: i32 = m
        .parse()
        .map_err(|_| TimeParseError::Malformed(s.to_string()))?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(TimeParseError::OutOfRange(s.to_string()));
    }
    Ok(hours * 60 + minutes)
}

/// Minutes since midnight to "HH:MM", wrapping modulo a day.
pub fn format_time(minutes: i32) -> String {
    let wrapped = minutes.rem_euclid(DAY_MINUTES);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

/// Like `format_time`, but a span ending on the day boundary stays "23:59"
/// instead of wrapping to "00:00".
pub fn format_end_time(minutes: i32) -> String {
    if minutes >= DAY_MINUTES {
        DAY_END.to_string()
    } else {
        format_time(minutes)
    }
}

/// Nearest multiple of `step`; ties go to the even multiple.
pub fn snap(minutes: f64, step: i32) -> i32 {
    (minutes / step as f64).round_ties_even() as i32 * step
}

/// A schedule block as minute offsets. `end` may reach 1440 (the day
/// boundary) while clock strings stop at 23:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: i32,
    pub end: i32,
}

impl TimeSpan {
    pub fn of(item: &ScheduleItem) -> Result<TimeSpan, TimeParseError> {
        Ok(TimeSpan {
            start: parse_time(&item.start_time)?,
            end: parse_time(&item.end_time)?,
        })
    }

    pub fn duration(&self) -> i32 {
        self.end - self.start
    }

    /// Shift both endpoints, keeping the duration, clamped so the whole
    /// interval stays within the day.
    pub fn moved_by(&self, delta: i32) -> TimeSpan {
        let duration = self.duration();
        let start = (self.start + delta).clamp(0, DAY_MINUTES - duration);
        TimeSpan {
            start,
            end: start + duration,
        }
    }

    pub fn with_start(&self, new_start: i32) -> TimeSpan {
        TimeSpan {
            start: new_start.clamp(0, self.end - MIN_ITEM_MINUTES),
            end: self.end,
        }
    }

    pub fn with_end(&self, new_end: i32) -> TimeSpan {
        TimeSpan {
            start: self.start,
            end: new_end.clamp(self.start + MIN_ITEM_MINUTES, DAY_MINUTES),
        }
    }

    pub fn apply_to(&self, item: &mut ScheduleItem) {
        item.start_time = format_time(self.start);
        item.end_time = format_end_time(self.end);
    }
}

/// A day holds a cross-midnight sleep block iff sleep starts exactly at
/// 00:00 and other sleep ends exactly at 23:59 (the two-segment
/// convention).
pub fn has_midnight_split(schedule: &[ScheduleItem]) -> bool {
    schedule
        .iter()
        .any(|s| s.category == Category::Sleep && s.start_time == "00:00")
        && schedule
            .iter()
            .any(|s| s.category == Category::Sleep && s.end_time == DAY_END)
}

/// Whether an item shows on the circular chart. When the day is
/// midnight-split, the 23:59-ending sleep segment belongs to the previous
/// day's tail and is hidden; it stays in the collection.
pub fn visible_on_dial(item: &ScheduleItem, split: bool) -> bool {
    !(split && item.category == Category::Sleep && item.end_time == DAY_END)
}

/// Items ordered by start time, for rendering.
pub fn sorted_by_start(schedule: &[ScheduleItem]) -> Vec<ScheduleItem> {
    let mut sorted = schedule.to_vec();
    sorted.sort_by_key(|item| parse_time(&item.start_time).unwrap_or(0));
    sorted
}

/// Seed for a fresh day: the midnight-split sleep pair.
pub fn default_schedule() -> Vec<ScheduleItem> {
    vec![
        ScheduleItem {
            id: generate_id(),
            start_time: "00:00".into(),
            end_time: "07:00".into(),
            title: "sleep".into(),
            description: None,
            category: Category::Sleep,
        },
        ScheduleItem {
            id: generate_id(),
            start_time: "23:00".into(),
            end_time: DAY_END.into(),
            title: "sleep".into(),
            description: None,
            category: Category::Sleep,
        },
    ]
}

pub fn new_item(span: TimeSpan, title: &str, category: Category) -> ScheduleItem {
    ScheduleItem {
        id: generate_id(),
        start_time: format_time(span.start),
        end_time: format_end_time(span.end),
        title: title.to_string(),
        description: None,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(start: &str, end: &str, category: Category) -> ScheduleItem {
        ScheduleItem {
            id: "test00".into(),
            start_time: start.into(),
            end_time: end.into(),
            title: String::new(),
            description: None,
            category,
        }
    }

    #[test]
    fn parse_format_round_trips() {
        for s in ["00:00", "00:01", "07:45", "12:00", "23:59"] {
            assert_eq!(format_time(parse_time(s).unwrap()), s);
        }
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            parse_time("24:00"),
            Err(TimeParseError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_time("12:60"),
            Err(TimeParseError::OutOfRange(_))
        ));
        assert!(matches!(parse_time("9am"), Err(TimeParseError::Malformed(_))));
        assert!(matches!(parse_time(""), Err(TimeParseError::Malformed(_))));
    }

    #[test]
    fn format_wraps_modulo_day() {
        assert_eq!(format_time(1440), "00:00");
        assert_eq!(format_time(1500), "01:00");
        assert_eq!(format_time(-60), "23:00");
    }

    #[test]
    fn end_formatting_pins_day_boundary() {
        assert_eq!(format_end_time(1440), "23:59");
        assert_eq!(format_end_time(1439), "23:59");
        assert_eq!(format_end_time(600), "10:00");
    }

    #[test]
    fn snap_is_idempotent() {
        for m in [0.0, 7.0, 8.0, 100.0, 1433.0] {
            let once = snap(m, SNAP_MINUTES);
            assert_eq!(snap(once as f64, SNAP_MINUTES), once);
        }
    }

    #[test]
    fn snap_ties_go_to_even_multiple() {
        // 22.5 sits between 15 (odd multiple) and 30 (even multiple)
        assert_eq!(snap(22.5, SNAP_MINUTES), 30);
        // 7.5 sits between 0 (even) and 15 (odd)
        assert_eq!(snap(7.5, SNAP_MINUTES), 0);
    }

    #[test]
    fn move_preserves_duration_under_clamping() {
        let span = TimeSpan {
            start: 540,
            end: 600,
        };
        for delta in [-2000, -540, -15, 0, 15, 800, 3000] {
            let moved = span.moved_by(delta);
            assert_eq!(moved.duration(), span.duration(), "delta {delta}");
            assert!(moved.start >= 0);
            assert!(moved.end <= DAY_MINUTES);
        }
        assert_eq!(span.moved_by(-3000).start, 0);
        assert_eq!(span.moved_by(3000).end, DAY_MINUTES);
    }

    #[test]
    fn resize_never_collapses_below_minimum() {
        let span = TimeSpan {
            start: 540,
            end: 600,
        };
        assert_eq!(span.with_start(595).start, 585); // end - 15
        assert_eq!(span.with_start(-100).start, 0);
        assert_eq!(span.with_end(541).end, 555); // start + 15
        assert_eq!(span.with_end(5000).end, DAY_MINUTES);
    }

    #[test]
    fn midnight_split_needs_both_segments() {
        let split = vec![
            item("00:00", "07:00", Category::Sleep),
            item("23:00", "23:59", Category::Sleep),
        ];
        assert!(has_midnight_split(&split));

        let only_morning = vec![item("00:00", "07:00", Category::Sleep)];
        assert!(!has_midnight_split(&only_morning));

        // a non-sleep block ending at 23:59 does not count
        let mixed = vec![
            item("00:00", "07:00", Category::Sleep),
            item("23:00", "23:59", Category::Work),
        ];
        assert!(!has_midnight_split(&mixed));
    }

    #[test]
    fn split_hides_tail_segment_only_from_dial() {
        let schedule = default_schedule();
        assert!(has_midnight_split(&schedule));
        let split = has_midnight_split(&schedule);
        let visible: Vec<_> = schedule
            .iter()
            .filter(|i| visible_on_dial(i, split))
            .collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].start_time, "00:00");
        // both segments remain in the collection itself
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn sorted_by_start_orders_blocks() {
        let schedule = vec![
            item("13:00", "14:00", Category::Work),
            item("08:00", "09:00", Category::Routine),
        ];
        let sorted = sorted_by_start(&schedule);
        assert_eq!(sorted[0].start_time, "08:00");
        assert_eq!(sorted[1].start_time, "13:00");
    }
}
