//! Pointer gestures for the two schedule surfaces, kept free of any UI
//! toolkit. The dial speaks in angles, the timeline in pixel offsets;
//! both hand back plain edit values for the caller to apply.

use crate::schedule::{snap, TimeSpan, DAY_MINUTES, SNAP_MINUTES};
use std::f64::consts::{PI, TAU};
use std::time::{Duration, Instant};

/// Window after a drag ends during which the trailing click is swallowed.
pub const CLICK_SUPPRESS: Duration = Duration::from_millis(100);

/// Minimum duration when a bare click (no drag) creates a block.
pub const MIN_CREATE_MINUTES: i32 = 30;

// ---------------------------------------------------------------------------
// Circular 24h dial
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeStart,
    ResizeEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialState {
    Idle,
    Hovering {
        item: String,
    },
    Dragging {
        mode: DragMode,
        item: String,
        anchor_angle: f64,
        original: TimeSpan,
    },
}

/// What sits under the pointer, as resolved by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DialTarget {
    Empty,
    Arc(String),
    StartHandle(String),
    EndHandle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialEdit {
    /// Commit a moved or resized span to the named item.
    Update { item: String, span: TimeSpan },
    /// Click on empty chart area: add a block at a snapped time-of-day.
    AddAt { minutes: i32 },
    /// Click on an arc: open the item editor.
    Open { item: String },
}

pub struct DialGesture {
    state: DialState,
    suppress_until: Option<Instant>,
}

impl DialGesture {
    pub fn new() -> Self {
        DialGesture {
            state: DialState::Idle,
            suppress_until: None,
        }
    }

    pub fn state(&self) -> &DialState {
        &self.state
    }

    pub fn dragging(&self) -> bool {
        matches!(self.state, DialState::Dragging { .. })
    }

    /// Handles are drawn only for the hovered item.
    pub fn hovered(&self) -> Option<&str> {
        match &self.state {
            DialState::Hovering { item } => Some(item),
            DialState::Dragging { item, .. } => Some(item),
            DialState::Idle => None,
        }
    }

    pub fn hover(&mut self, target: &DialTarget) {
        if self.dragging() {
            return;
        }
        self.state = match target {
            DialTarget::Arc(item)
            | DialTarget::StartHandle(item)
            | DialTarget::EndHandle(item) => DialState::Hovering { item: item.clone() },
            DialTarget::Empty => DialState::Idle,
        };
    }

    pub fn pointer_down(&mut self, target: &DialTarget, angle: f64, original: TimeSpan) {
        let (mode, item) = match target {
            DialTarget::Arc(item) => (DragMode::Move, item),
            DialTarget::StartHandle(item) => (DragMode::ResizeStart, item),
            DialTarget::EndHandle(item) => (DragMode::ResizeEnd, item),
            DialTarget::Empty => return,
        };
        self.state = DialState::Dragging {
            mode,
            item: item.clone(),
            anchor_angle: angle,
            original,
        };
    }

    /// Live span for the in-flight drag, for preview rendering.
    pub fn pointer_move(&self, angle: f64) -> Option<(String, TimeSpan)> {
        let DialState::Dragging {
            mode,
            item,
            anchor_angle,
            original,
        } = &self.state
        else {
            return None;
        };
        let delta = snap(
            normalize_angle_delta(angle - anchor_angle) / TAU * DAY_MINUTES as f64,
            SNAP_MINUTES,
        );
        let span = match mode {
            DragMode::Move => original.moved_by(delta),
            DragMode::ResizeStart => original.with_start(original.start + delta),
            DragMode::ResizeEnd => original.with_end(original.end + delta),
        };
        Some((item.clone(), span))
    }

    /// Ends any drag, returning the edit to commit when the span actually
    /// changed. A committing drag arms the click-through guard; a
    /// press-release that went nowhere stays an ordinary click.
    pub fn pointer_up(&mut self, angle: f64, now: Instant) -> Option<DialEdit> {
        let result = match self.pointer_move(angle) {
            Some((item, span)) => {
                let original = match &self.state {
                    DialState::Dragging { original, .. } => *original,
                    _ => span,
                };
                if span != original {
                    Some(DialEdit::Update { item, span })
                } else {
                    None
                }
            }
            None => None,
        };
        if result.is_some() {
            self.suppress_until = Some(now + CLICK_SUPPRESS);
        }
        self.state = DialState::Idle;
        result
    }

    /// Pointer left the chart mid-gesture; drop it without committing.
    pub fn abandon(&mut self) {
        self.state = DialState::Idle;
    }

    pub fn click(&mut self, target: &DialTarget, angle: f64, now: Instant) -> Option<DialEdit> {
        if let Some(until) = self.suppress_until {
            if now < until {
                return None;
            }
            self.suppress_until = None;
        }
        match target {
            DialTarget::Empty => Some(DialEdit::AddAt {
                minutes: snap(angle_to_minutes(angle), SNAP_MINUTES)
                    .rem_euclid(DAY_MINUTES),
            }),
            DialTarget::Arc(item)
            | DialTarget::StartHandle(item)
            | DialTarget::EndHandle(item) => Some(DialEdit::Open { item: item.clone() }),
        }
    }
}

impl Default for DialGesture {
    fn default() -> Self {
        Self::new()
    }
}

/// Screen angle (atan2, y down, 0 at three o'clock) to minutes since
/// midnight; the dial puts 00:00 at the top.
pub fn angle_to_minutes(angle: f64) -> f64 {
    let mut fraction = (angle + PI / 2.0) / TAU;
    fraction = fraction.rem_euclid(1.0);
    fraction * DAY_MINUTES as f64
}

/// Fraction of a day (0.0 at 00:00) to the screen angle of its arc point.
pub fn fraction_to_angle(fraction: f64) -> f64 {
    TAU * fraction - PI / 2.0
}

/// Wrap an angle difference into (-pi, pi] so a drag across the 00:00 seam
/// reads as a small signed step, not a near-full revolution.
pub fn normalize_angle_delta(delta: f64) -> f64 {
    let wrapped = (delta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Vertical day timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineState {
    Idle,
    DraggingMove {
        item: String,
        original: TimeSpan,
        anchor_y: f64,
    },
    DraggingCreate {
        anchor: i32,
        current: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEdit {
    Move { item: String, span: TimeSpan },
    Create { span: TimeSpan },
}

pub struct TimelineGesture {
    state: TimelineState,
    px_per_minute: f64,
}

impl TimelineGesture {
    /// 1 px = 1 min at scale 1.0; the TUI runs one row per 15 minutes.
    pub fn new(px_per_minute: f64) -> Self {
        TimelineGesture {
            state: TimelineState::Idle,
            px_per_minute,
        }
    }

    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    pub fn active(&self) -> bool {
        self.state != TimelineState::Idle
    }

    pub fn press_block(&mut self, item: &str, original: TimeSpan, y: f64) {
        self.state = TimelineState::DraggingMove {
            item: item.to_string(),
            original,
            anchor_y: y,
        };
    }

    pub fn press_background(&mut self, y: f64) {
        let anchor = snap(y / self.px_per_minute, SNAP_MINUTES);
        self.state = TimelineState::DraggingCreate {
            anchor,
            current: anchor,
        };
    }

    /// Live preview of the gesture under the current pointer position.
    pub fn pointer_move(&mut self, y: f64) -> Option<TimeSpan> {
        match &mut self.state {
            TimelineState::DraggingMove {
                original, anchor_y, ..
            } => {
                let delta_minutes = (y - *anchor_y) / self.px_per_minute;
                let new_start = snap(original.start as f64 + delta_minutes, SNAP_MINUTES);
                Some(original.moved_by(new_start - original.start))
            }
            TimelineState::DraggingCreate { anchor, current } => {
                *current = snap(y / self.px_per_minute, SNAP_MINUTES);
                let lo = (*anchor).min(*current);
                let hi = (*anchor).max(*current);
                Some(TimeSpan { start: lo, end: hi })
            }
            TimelineState::Idle => None,
        }
    }

    pub fn release(&mut self, y: f64) -> Option<TimelineEdit> {
        let edit = match self.pointer_move(y) {
            Some(span) => match &self.state {
                TimelineState::DraggingMove { item, original, .. } => {
                    if span.start != original.start {
                        Some(TimelineEdit::Move {
                            item: item.clone(),
                            span,
                        })
                    } else {
                        None
                    }
                }
                TimelineState::DraggingCreate { .. } => {
                    let start = span.start.max(0);
                    let mut end = span.end.min(DAY_MINUTES);
                    if end <= start {
                        end = (start + MIN_CREATE_MINUTES).min(DAY_MINUTES);
                    }
                    if start < DAY_MINUTES && end > start {
                        Some(TimelineEdit::Create {
                            span: TimeSpan { start, end },
                        })
                    } else {
                        None
                    }
                }
                TimelineState::Idle => None,
            },
            None => None,
        };
        self.state = TimelineState::Idle;
        edit
    }

    pub fn abandon(&mut self) {
        self.state = TimelineState::Idle;
    }
}

/// "Now" line position for the timeline, repositioned at most once a
/// minute while the current date is on screen.
pub struct NowMarker {
    refreshed_at: Option<Instant>,
    pub minutes: i32,
}

const NOW_REFRESH: Duration = Duration::from_secs(60);

impl NowMarker {
    pub fn new() -> Self {
        NowMarker {
            refreshed_at: None,
            minutes: 0,
        }
    }

    /// Returns true when the marker moved.
    pub fn tick(&mut self, now: Instant, minutes_since_midnight: i32) -> bool {
        let due = match self.refreshed_at {
            Some(at) => now.duration_since(at) >= NOW_REFRESH,
            None => true,
        };
        if due {
            self.refreshed_at = Some(now);
            let moved = self.minutes != minutes_since_midnight;
            self.minutes = minutes_since_midnight;
            moved
        } else {
            false
        }
    }
}

impl Default for NowMarker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn span(start: i32, end: i32) -> TimeSpan {
        TimeSpan { start, end }
    }

    fn minutes_to_angle(minutes: f64) -> f64 {
        fraction_to_angle(minutes / DAY_MINUTES as f64)
    }

    #[test]
    fn angle_mapping_puts_midnight_at_top() {
        assert!((angle_to_minutes(-PI / 2.0) - 0.0).abs() < EPS);
        assert!((angle_to_minutes(0.0) - 360.0).abs() < EPS); // 06:00 at right
        assert!((angle_to_minutes(PI / 2.0) - 720.0).abs() < EPS); // 12:00 at bottom
    }

    #[test]
    fn delta_normalization_handles_the_seam() {
        // a step across 00:00 reads as +0.02, not -(tau - 0.02)
        assert!((normalize_angle_delta(-TAU + 0.02) - 0.02).abs() < EPS);
        assert!((normalize_angle_delta(TAU + 0.1) - 0.1).abs() < EPS);
        assert!((normalize_angle_delta(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn dial_move_shifts_both_ends_snapped() {
        let mut dial = DialGesture::new();
        let anchor = minutes_to_angle(570.0);
        dial.pointer_down(&DialTarget::Arc("a".into()), anchor, span(540, 600));

        // 37 minutes clockwise snaps to 30
        let (_, preview) = dial
            .pointer_move(minutes_to_angle(570.0 + 37.0))
            .unwrap();
        assert_eq!(preview, span(570, 630));

        let edit = dial
            .pointer_up(minutes_to_angle(570.0 + 37.0), Instant::now())
            .unwrap();
        assert_eq!(
            edit,
            DialEdit::Update {
                item: "a".into(),
                span: span(570, 630)
            }
        );
        assert_eq!(*dial.state(), DialState::Idle);
    }

    #[test]
    fn dial_move_clamps_at_day_edges_keeping_duration() {
        let mut dial = DialGesture::new();
        let anchor = minutes_to_angle(100.0);
        dial.pointer_down(&DialTarget::Arc("a".into()), anchor, span(60, 180));

        // dragging far counter-clockwise pins the block at 00:00
        let (_, preview) = dial.pointer_move(minutes_to_angle(10.0)).unwrap();
        assert_eq!(preview, span(0, 120));
        assert_eq!(preview.duration(), 120);
    }

    #[test]
    fn dial_resize_respects_floors() {
        let mut dial = DialGesture::new();
        let original = span(540, 600);

        let anchor = minutes_to_angle(540.0);
        dial.pointer_down(&DialTarget::StartHandle("a".into()), anchor, original);
        let (_, preview) = dial.pointer_move(minutes_to_angle(610.0)).unwrap();
        assert_eq!(preview.start, 585); // end - 15
        dial.pointer_up(minutes_to_angle(610.0), Instant::now());

        let anchor = minutes_to_angle(600.0);
        dial.pointer_down(&DialTarget::EndHandle("a".into()), anchor, original);
        let (_, preview) = dial.pointer_move(minutes_to_angle(500.0)).unwrap();
        assert_eq!(preview.end, 555); // start + 15
    }

    #[test]
    fn drag_end_suppresses_the_trailing_click() {
        let mut dial = DialGesture::new();
        let t0 = Instant::now();
        let anchor = minutes_to_angle(570.0);
        dial.pointer_down(&DialTarget::Arc("a".into()), anchor, span(540, 600));
        dial.pointer_up(minutes_to_angle(600.0), t0);

        assert_eq!(dial.click(&DialTarget::Empty, anchor, t0 + Duration::from_millis(50)), None);
        // once the window passes, clicks work again
        let later = t0 + Duration::from_millis(150);
        assert!(matches!(
            dial.click(&DialTarget::Empty, minutes_to_angle(480.0), later),
            Some(DialEdit::AddAt { minutes: 480 })
        ));
    }

    #[test]
    fn plain_click_adds_at_snapped_time() {
        let mut dial = DialGesture::new();
        let edit = dial.click(
            &DialTarget::Empty,
            minutes_to_angle(487.0),
            Instant::now(),
        );
        assert_eq!(edit, Some(DialEdit::AddAt { minutes: 480 }));

        let open = dial.click(
            &DialTarget::Arc("b".into()),
            minutes_to_angle(487.0),
            Instant::now(),
        );
        assert_eq!(open, Some(DialEdit::Open { item: "b".into() }));
    }

    #[test]
    fn hover_tracks_arc_and_clears_on_empty() {
        let mut dial = DialGesture::new();
        dial.hover(&DialTarget::Arc("a".into()));
        assert_eq!(dial.hovered(), Some("a"));
        dial.hover(&DialTarget::Empty);
        assert_eq!(dial.hovered(), None);
    }

    #[test]
    fn timeline_move_snaps_and_reports_only_real_moves() {
        let mut tl = TimelineGesture::new(1.0);
        tl.press_block("a", span(540, 600), 550.0);

        let preview = tl.pointer_move(582.0).unwrap(); // +32 px
        assert_eq!(preview, span(570, 630));
        assert_eq!(
            tl.release(582.0),
            Some(TimelineEdit::Move {
                item: "a".into(),
                span: span(570, 630)
            })
        );

        // a 2 px wiggle snaps back to the original start: no edit
        tl.press_block("a", span(540, 600), 550.0);
        assert_eq!(tl.release(552.0), None);
    }

    #[test]
    fn timeline_move_keeps_block_inside_day() {
        let mut tl = TimelineGesture::new(1.0);
        tl.press_block("a", span(1380, 1440), 1400.0);
        let preview = tl.pointer_move(2000.0).unwrap();
        assert_eq!(preview, span(1380, 1440));
    }

    #[test]
    fn timeline_create_spans_between_anchor_and_release() {
        let mut tl = TimelineGesture::new(1.0);
        tl.press_background(130.0); // snaps to 135
        tl.pointer_move(250.0); // snaps to 255
        assert_eq!(
            tl.release(250.0),
            Some(TimelineEdit::Create {
                span: span(135, 255)
            })
        );

        // dragging upward still yields an ordered span
        tl.press_background(250.0);
        assert_eq!(
            tl.release(130.0),
            Some(TimelineEdit::Create {
                span: span(135, 255)
            })
        );
    }

    #[test]
    fn timeline_bare_click_creates_thirty_minutes() {
        let mut tl = TimelineGesture::new(1.0);
        tl.press_background(600.0);
        assert_eq!(
            tl.release(600.0),
            Some(TimelineEdit::Create {
                span: span(600, 630)
            })
        );
    }

    #[test]
    fn abandoned_gesture_leaves_no_edit() {
        let mut tl = TimelineGesture::new(1.0);
        tl.press_block("a", span(540, 600), 550.0);
        tl.abandon();
        assert_eq!(*tl.state(), TimelineState::Idle);
        assert_eq!(tl.release(999.0), None);
    }

    #[test]
    fn now_marker_repositions_once_a_minute() {
        let mut marker = NowMarker::new();
        let t0 = Instant::now();
        assert!(marker.tick(t0, 500));
        assert_eq!(marker.minutes, 500);
        // within the refresh window nothing moves
        assert!(!marker.tick(t0 + Duration::from_secs(10), 501));
        assert_eq!(marker.minutes, 500);
        assert!(marker.tick(t0 + Duration::from_secs(61), 501));
        assert_eq!(marker.minutes, 501);
    }
}
