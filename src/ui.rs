use crate::gesture::{
    DialEdit, DialGesture, DialTarget, NowMarker, TimelineEdit, TimelineGesture,
};
use crate::model::{Category, DiaryEntry, EntryDraft, Mood, ScheduleItem};
use crate::schedule::{
    format_end_time, format_time, has_midnight_split, new_item, parse_time, sorted_by_start,
    visible_on_dial, TimeSpan, DAY_MINUTES, SNAP_MINUTES,
};
use crate::service::{Diary, Debounce, AUTOSAVE_WINDOW};
use crate::stats::{HeatCell, Stats};
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, Timelike};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::symbols::Marker;
use ratatui::Terminal;
use std::collections::HashSet;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

/// One timeline row covers a snap step.
const ROW_MINUTES: i32 = SNAP_MINUTES;
const TIMELINE_ROWS: i32 = DAY_MINUTES / ROW_MINUTES;
/// Canvas bounds for the dial; the outer arc sits at radius 1.0.
const DIAL_BOUND: f64 = 1.25;
const DIAL_OUTER: f64 = 1.0;
const DIAL_INNER: f64 = 0.375;
/// Pointer proximity (in minutes of arc) that grabs a resize handle.
const HANDLE_MINUTES: f64 = 20.0;

pub fn run(diary: Diary) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(diary);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    diary: Diary,
    today: NaiveDate,
    cursor: NaiveDate,
    view: ViewMode,
    mode: Mode,
    status: String,

    // Day editor state
    draft: EntryDraft,
    dirty: bool,
    autosave: Debounce,
    last_saved: Option<Instant>,
    selected_item: usize,
    scroll_rows: i32,

    // Gesture state and layout cache for hit-testing
    timeline: TimelineGesture,
    timeline_area: Rect,
    timeline_preview: Option<(Option<String>, TimeSpan)>,
    dial: DialGesture,
    dial_area: Rect,
    dial_pressed: Option<DialTarget>,
    dial_preview: Option<(String, TimeSpan)>,
    last_dial_angle: f64,
    now_marker: NowMarker,

    // Read-side caches
    month_cache: Option<((i32, u32), HashSet<NaiveDate>)>,
    review: Vec<DiaryEntry>,
    review_random: Option<DiaryEntry>,
    stats: Option<Stats>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Calendar,
    Day,
    Dial,
    Stats,
}

enum Mode {
    Normal,
    EditingEntry(EntryForm),
    EditingItem {
        item_id: Option<String>,
        form: ItemForm,
    },
    ConfirmDeleteItem {
        item_id: String,
    },
    Searching {
        query: FieldValue,
        results: Vec<DiaryEntry>,
        selected: usize,
    },
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Calendar => "Calendar",
            ViewMode::Day => "Day",
            ViewMode::Dial => "Dial",
            ViewMode::Stats => "Stats",
        }
    }
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

struct EntryForm {
    title: FieldValue,
    content: FieldValue,
    tags: FieldValue,
    mood: Mood,
    field: EntryField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum EntryField {
    Title,
    Content,
    Tags,
    Mood,
}

struct ItemForm {
    title: FieldValue,
    start: FieldValue,
    end: FieldValue,
    description: FieldValue,
    category: Category,
    field: ItemField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ItemField {
    Title,
    Start,
    End,
    Description,
    Category,
}

impl EntryForm {
    fn from_draft(draft: &EntryDraft) -> Self {
        EntryForm {
            title: FieldValue::new(draft.title.as_deref().unwrap_or_default()),
            content: FieldValue::new(&draft.content),
            tags: FieldValue::new(&draft.tags.join(" ")),
            mood: draft.mood,
            field: EntryField::Content,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            EntryField::Title => EntryField::Content,
            EntryField::Content => EntryField::Tags,
            EntryField::Tags => EntryField::Mood,
            EntryField::Mood => EntryField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            EntryField::Title => EntryField::Mood,
            EntryField::Content => EntryField::Title,
            EntryField::Tags => EntryField::Content,
            EntryField::Mood => EntryField::Tags,
        };
    }

    fn active_field_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            EntryField::Title => Some(&mut self.title),
            EntryField::Content => Some(&mut self.content),
            EntryField::Tags => Some(&mut self.tags),
            EntryField::Mood => None,
        }
    }

    fn cycle_mood(&mut self, delta: isize) {
        let idx = Mood::ALL.iter().position(|m| *m == self.mood).unwrap_or(2) as isize;
        let len = Mood::ALL.len() as isize;
        self.mood = Mood::ALL[((idx + delta).rem_euclid(len)) as usize];
    }
}

impl ItemForm {
    fn blank(span: TimeSpan) -> Self {
        ItemForm {
            title: FieldValue::new(""),
            start: FieldValue::new(&format_time(span.start)),
            end: FieldValue::new(&format_end_time(span.end)),
            description: FieldValue::new(""),
            category: Category::Work,
            field: ItemField::Title,
        }
    }

    fn from_item(item: &ScheduleItem) -> Self {
        ItemForm {
            title: FieldValue::new(&item.title),
            start: FieldValue::new(&item.start_time),
            end: FieldValue::new(&item.end_time),
            description: FieldValue::new(item.description.as_deref().unwrap_or_default()),
            category: item.category,
            field: ItemField::Title,
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            ItemField::Title => ItemField::Start,
            ItemField::Start => ItemField::End,
            ItemField::End => ItemField::Description,
            ItemField::Description => ItemField::Category,
            ItemField::Category => ItemField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            ItemField::Title => ItemField::Category,
            ItemField::Start => ItemField::Title,
            ItemField::End => ItemField::Start,
            ItemField::Description => ItemField::End,
            ItemField::Category => ItemField::Description,
        };
    }

    fn active_field_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            ItemField::Title => Some(&mut self.title),
            ItemField::Start => Some(&mut self.start),
            ItemField::End => Some(&mut self.end),
            ItemField::Description => Some(&mut self.description),
            ItemField::Category => None,
        }
    }

    fn cycle_category(&mut self, delta: isize) {
        let idx = Category::ALL
            .iter()
            .position(|c| *c == self.category)
            .unwrap_or(0) as isize;
        let len = Category::ALL.len() as isize;
        self.category = Category::ALL[((idx + delta).rem_euclid(len)) as usize];
    }
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn move_up(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx == 0 {
            return;
        }
        let target_start = line_starts[line_idx - 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn move_down(&mut self) {
        let (line_starts, line_idx, col) = line_state(&self.value, self.cursor);
        if line_idx + 1 >= line_starts.len() {
            return;
        }
        let target_start = line_starts[line_idx + 1];
        self.cursor = index_at_col(&self.value, target_start, col);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

impl App {
    fn new(diary: Diary) -> Self {
        let today = Local::now().date_naive();
        let mut app = App {
            diary,
            today,
            cursor: today,
            view: ViewMode::Calendar,
            mode: Mode::Normal,
            status: "Welcome back".into(),
            draft: EntryDraft {
                date: today,
                ..Default::default()
            },
            dirty: false,
            autosave: Debounce::new(AUTOSAVE_WINDOW),
            last_saved: None,
            selected_item: 0,
            scroll_rows: 0,
            timeline: TimelineGesture::new(1.0),
            timeline_area: Rect::default(),
            timeline_preview: None,
            dial: DialGesture::new(),
            dial_area: Rect::default(),
            dial_pressed: None,
            dial_preview: None,
            last_dial_angle: 0.0,
            now_marker: NowMarker::new(),
            month_cache: None,
            review: Vec::new(),
            review_random: None,
            stats: None,
        };
        app.reload_review();
        app
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
            self.tick();
        }
        self.flush_save();
        Ok(())
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if self.autosave.fire(now) {
            self.flush_save();
        }
        if self.cursor == self.today {
            let local = Local::now();
            self.now_marker
                .tick(now, (local.hour() * 60 + local.minute()) as i32);
        }
    }

    // -- persistence ------------------------------------------------------

    fn mark_edited(&mut self) {
        self.dirty = true;
        self.autosave.poke(Instant::now());
    }

    fn flush_save(&mut self) {
        if !self.dirty {
            return;
        }
        self.autosave.cancel();
        match self.diary.save_day(self.draft.clone()) {
            Ok(entry) => {
                self.dirty = false;
                self.last_saved = Some(Instant::now());
                self.month_cache = None;
                self.status = format!("Saved {}", entry.date);
            }
            Err(err) => {
                self.status = format!("Save failed: {:#}", err);
            }
        }
    }

    fn enter_day(&mut self, date: NaiveDate) {
        self.flush_save();
        self.cursor = date;
        match self.diary.load_day(date) {
            Ok(draft) => self.draft = draft,
            Err(err) => {
                self.status = format!("Load failed: {:#}", err);
                self.draft = EntryDraft {
                    date,
                    ..Default::default()
                };
            }
        }
        self.dirty = false;
        self.selected_item = 0;
        self.timeline.abandon();
        self.dial.abandon();
        self.timeline_preview = None;
        self.dial_preview = None;
        let target = if date == self.today {
            let local = Local::now();
            (local.hour() * 60 + local.minute()) as i32
        } else {
            480
        };
        self.scroll_rows = ((target - 60).max(0) / ROW_MINUTES).min(TIMELINE_ROWS - 1);
        self.set_view(ViewMode::Day);
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view == view {
            return;
        }
        if self.view == ViewMode::Day || self.view == ViewMode::Dial {
            self.flush_save();
        }
        self.view = view;
        match view {
            ViewMode::Calendar => self.reload_review(),
            ViewMode::Stats => self.reload_stats(),
            ViewMode::Day | ViewMode::Dial => {
                if self.draft.date != self.cursor {
                    self.enter_day(self.cursor);
                }
            }
        }
        self.status = format!("Switched to {} view", view.label());
    }

    fn reload_review(&mut self) {
        match self.diary.review(self.today) {
            Ok(bundle) => {
                self.review = bundle.on_this_day;
                self.review_random = bundle.random;
            }
            Err(err) => self.status = format!("Review unavailable: {:#}", err),
        }
    }

    fn reload_stats(&mut self) {
        match self.diary.store().list() {
            Ok(entries) => self.stats = Some(Stats::compute(&entries, self.today)),
            Err(err) => self.status = format!("Stats unavailable: {:#}", err),
        }
    }

    fn month_dates(&mut self) -> HashSet<NaiveDate> {
        let key = (self.cursor.year(), self.cursor.month());
        if let Some((cached_key, dates)) = &self.month_cache {
            if *cached_key == key {
                return dates.clone();
            }
        }
        let dates: HashSet<NaiveDate> = self
            .diary
            .store()
            .list_by_month(key.0, key.1)
            .map(|entries| entries.into_iter().map(|e| e.date).collect())
            .unwrap_or_default();
        self.month_cache = Some((key, dates.clone()));
        dates
    }

    // -- key handling -----------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::EditingEntry(_) => {
                self.handle_entry_form_key(key);
                Ok(false)
            }
            Mode::EditingItem { .. } => {
                self.handle_item_form_key(key);
                Ok(false)
            }
            Mode::ConfirmDeleteItem { .. } => {
                self.handle_confirm_key(key);
                Ok(false)
            }
            Mode::Searching { .. } => {
                self.handle_search_key(key);
                Ok(false)
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Calendar);
                return Ok(false);
            }
            KeyCode::Char('2') => {
                self.set_view(ViewMode::Day);
                return Ok(false);
            }
            KeyCode::Char('3') => {
                self.set_view(ViewMode::Dial);
                return Ok(false);
            }
            KeyCode::Char('4') => {
                self.set_view(ViewMode::Stats);
                return Ok(false);
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Searching {
                    query: FieldValue::new(""),
                    results: Vec::new(),
                    selected: 0,
                };
                self.status = "Search (Enter opens, Esc closes)".into();
                return Ok(false);
            }
            _ => {}
        }
        match self.view {
            ViewMode::Calendar => self.handle_calendar_key(key),
            ViewMode::Day | ViewMode::Dial => self.handle_day_key(key),
            ViewMode::Stats => Ok(false),
        }
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.shift_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.shift_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.shift_cursor(7),
            KeyCode::Char('[') | KeyCode::Char('p') => self.shift_month(-1),
            KeyCode::Char(']') | KeyCode::Char('n') => self.shift_month(1),
            KeyCode::Char('t') => self.cursor = self.today,
            KeyCode::Enter => self.enter_day(self.cursor),
            _ => {}
        }
        Ok(false)
    }

    fn handle_day_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('e') => {
                self.mode = Mode::EditingEntry(EntryForm::from_draft(&self.draft));
                self.status =
                    "Editing entry (Tab moves, Ctrl+Enter saves, Esc cancels)".into();
            }
            KeyCode::Char('a') => {
                let span = TimeSpan {
                    start: 540,
                    end: 600,
                };
                self.mode = Mode::EditingItem {
                    item_id: None,
                    form: ItemForm::blank(span),
                };
                self.status = "New schedule block".into();
            }
            KeyCode::Char('d') => {
                if let Some(item) = self.selected_schedule_item() {
                    self.mode = Mode::ConfirmDeleteItem {
                        item_id: item.id.clone(),
                    };
                    self.status = "Delete block? (y to confirm, n/Esc to cancel)".into();
                } else {
                    self.status = "No block selected".into();
                }
            }
            KeyCode::Enter => {
                if let Some(item) = self.selected_schedule_item() {
                    self.mode = Mode::EditingItem {
                        item_id: Some(item.id.clone()),
                        form: ItemForm::from_item(&item),
                    };
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_item = self.selected_item.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.draft.schedule.len();
                if len > 0 && self.selected_item + 1 < len {
                    self.selected_item += 1;
                }
            }
            KeyCode::Char('[') => self.shift_day(-1),
            KeyCode::Char(']') => self.shift_day(1),
            KeyCode::PageUp => self.scroll_timeline(-8),
            KeyCode::PageDown => self.scroll_timeline(8),
            _ => {}
        }
        Ok(false)
    }

    fn handle_entry_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::EditingEntry(form) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.prev_field(),
                KeyCode::Left => match form.active_field_mut() {
                    Some(field) => field.move_left(),
                    None => form.cycle_mood(-1),
                },
                KeyCode::Right => match form.active_field_mut() {
                    Some(field) => field.move_right(),
                    None => form.cycle_mood(1),
                },
                KeyCode::Up => {
                    if let Some(field) = form.active_field_mut() {
                        field.move_up();
                    }
                }
                KeyCode::Down => {
                    if let Some(field) = form.active_field_mut() {
                        field.move_down();
                    }
                }
                KeyCode::Enter => {
                    let control = key.modifiers.contains(KeyModifiers::CONTROL);
                    if form.field == EntryField::Content && !control {
                        if let Some(field) = form.active_field_mut() {
                            field.insert_char('\n');
                        }
                    } else {
                        self.draft.title = if form.title.value.trim().is_empty() {
                            None
                        } else {
                            Some(form.title.value.trim().to_string())
                        };
                        self.draft.content = form.content.value.clone();
                        self.draft.tags = parse_tags(&form.tags.value);
                        self.draft.mood = form.mood;
                        self.mark_edited();
                        self.status = "Entry updated".into();
                        close = true;
                    }
                }
                KeyCode::Backspace => {
                    if let Some(field) = form.active_field_mut() {
                        field.backspace();
                    }
                }
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        if let Some(field) = form.active_field_mut() {
                            field.insert_char(c);
                        }
                    }
                }
                _ => {}
            }
        }
        self.mode = if close { Mode::Normal } else { mode };
    }

    fn handle_item_form_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::EditingItem { item_id, form } = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Tab => form.next_field(),
                KeyCode::BackTab => form.prev_field(),
                KeyCode::Left => match form.active_field_mut() {
                    Some(field) => field.move_left(),
                    None => form.cycle_category(-1),
                },
                KeyCode::Right => match form.active_field_mut() {
                    Some(field) => field.move_right(),
                    None => form.cycle_category(1),
                },
                KeyCode::Enter => match self.submit_item_form(item_id.clone(), form) {
                    Ok(()) => close = true,
                    Err(message) => self.status = message,
                },
                KeyCode::Backspace => {
                    if let Some(field) = form.active_field_mut() {
                        field.backspace();
                    }
                }
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        if let Some(field) = form.active_field_mut() {
                            field.insert_char(c);
                        }
                    }
                }
                _ => {}
            }
        }
        self.mode = if close { Mode::Normal } else { mode };
    }

    fn submit_item_form(
        &mut self,
        item_id: Option<String>,
        form: &ItemForm,
    ) -> std::result::Result<(), String> {
        let start = parse_time(form.start.value.trim()).map_err(|e| e.to_string())?;
        let end = parse_time(form.end.value.trim()).map_err(|e| e.to_string())?;
        if end <= start {
            return Err("end must be after start".into());
        }
        let title = form.title.value.trim().to_string();
        if title.is_empty() {
            return Err("title is required".into());
        }
        let description = if form.description.value.trim().is_empty() {
            None
        } else {
            Some(form.description.value.clone())
        };
        match item_id {
            Some(id) => {
                let Some(item) = self.draft.schedule.iter_mut().find(|i| i.id == id) else {
                    return Err("block no longer exists".into());
                };
                item.title = title;
                item.start_time = format_time(start);
                item.end_time = format_time(end);
                item.description = description;
                item.category = form.category;
                self.status = "Block updated".into();
            }
            None => {
                let mut item = new_item(TimeSpan { start, end }, &title, form.category);
                item.description = description;
                self.draft.schedule.push(item);
                self.status = "Block added".into();
            }
        }
        self.mark_edited();
        Ok(())
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let item_id = match &self.mode {
            Mode::ConfirmDeleteItem { item_id } => item_id.clone(),
            _ => return,
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.draft.schedule.retain(|i| i.id != item_id);
                self.selected_item = self
                    .selected_item
                    .min(self.draft.schedule.len().saturating_sub(1));
                self.mark_edited();
                self.status = "Block deleted".into();
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        let mut open: Option<NaiveDate> = None;
        if let Mode::Searching {
            query,
            results,
            selected,
        } = &mut mode
        {
            match key.code {
                KeyCode::Esc => close = true,
                KeyCode::Enter => {
                    if let Some(entry) = results.get(*selected) {
                        open = Some(entry.date);
                        close = true;
                    }
                }
                KeyCode::Up => *selected = selected.saturating_sub(1),
                KeyCode::Down => {
                    if !results.is_empty() && *selected + 1 < results.len() {
                        *selected += 1;
                    }
                }
                KeyCode::Backspace => {
                    query.backspace();
                    *results = self.run_search(&query.value);
                    *selected = 0;
                }
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        query.insert_char(c);
                        *results = self.run_search(&query.value);
                        *selected = 0;
                    }
                }
                _ => {}
            }
        }
        self.mode = if close { Mode::Normal } else { mode };
        if let Some(date) = open {
            self.enter_day(date);
        }
    }

    fn run_search(&mut self, query: &str) -> Vec<DiaryEntry> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match self.diary.store().search(query) {
            Ok(hits) => hits,
            Err(err) => {
                self.status = format!("Search failed: {:#}", err);
                Vec::new()
            }
        }
    }

    fn shift_cursor(&mut self, days: i64) {
        if let Some(date) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.cursor = date;
        }
    }

    fn shift_month(&mut self, months: i32) {
        let mut year = self.cursor.year();
        let mut month = self.cursor.month() as i32 + months;
        while month < 1 {
            month += 12;
            year -= 1;
        }
        while month > 12 {
            month -= 12;
            year += 1;
        }
        let day = self.cursor.day().min(days_in_month(year, month as u32));
        if let Some(date) = NaiveDate::from_ymd_opt(year, month as u32, day) {
            self.cursor = date;
        }
    }

    fn shift_day(&mut self, days: i64) {
        if let Some(date) = self.cursor.checked_add_signed(ChronoDuration::days(days)) {
            self.enter_day(date);
        }
    }

    fn scroll_timeline(&mut self, rows: i32) {
        let viewport = self.timeline_area.height as i32;
        let max = (TIMELINE_ROWS - viewport).max(0);
        self.scroll_rows = (self.scroll_rows + rows).clamp(0, max);
    }

    fn selected_schedule_item(&self) -> Option<ScheduleItem> {
        sorted_by_start(&self.draft.schedule)
            .get(self.selected_item)
            .cloned()
    }

    // -- mouse handling ---------------------------------------------------

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(self.mode, Mode::Normal) {
            return;
        }
        match self.view {
            ViewMode::Day => self.handle_timeline_mouse(mouse),
            ViewMode::Dial => self.handle_dial_mouse(mouse),
            _ => {}
        }
    }

    fn timeline_minutes_at(&self, row: u16) -> f64 {
        let offset = row.saturating_sub(self.timeline_area.y) as i32;
        ((self.scroll_rows + offset) * ROW_MINUTES) as f64
    }

    fn handle_timeline_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_timeline(-4),
            MouseEventKind::ScrollDown => self.scroll_timeline(4),
            MouseEventKind::Down(MouseButton::Left) => {
                if !rect_contains(self.timeline_area, mouse.column, mouse.row) {
                    return;
                }
                let y = self.timeline_minutes_at(mouse.row);
                match self.block_at_minute(y as i32) {
                    Some(item) => {
                        if let Ok(span) = TimeSpan::of(&item) {
                            self.timeline.press_block(&item.id, span, y);
                        }
                    }
                    None => self.timeline.press_background(y),
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if !self.timeline.active() {
                    return;
                }
                let y = self.timeline_minutes_at(mouse.row);
                if let Some(span) = self.timeline.pointer_move(y) {
                    let moving = match self.timeline.state() {
                        crate::gesture::TimelineState::DraggingMove { item, .. } => {
                            Some(item.clone())
                        }
                        _ => None,
                    };
                    self.timeline_preview = Some((moving, span));
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if !self.timeline.active() {
                    return;
                }
                let y = self.timeline_minutes_at(mouse.row);
                if let Some(edit) = self.timeline.release(y) {
                    self.apply_timeline_edit(edit);
                }
                self.timeline_preview = None;
            }
            _ => {}
        }
    }

    /// The block rendered at a minute: overlapping items are permitted, so
    /// the later-starting one (drawn on top) wins the hit.
    fn block_at_minute(&self, minute: i32) -> Option<ScheduleItem> {
        sorted_by_start(&self.draft.schedule)
            .into_iter()
            .rev()
            .find(|item| {
                match (parse_time(&item.start_time), parse_time(&item.end_time)) {
                    (Ok(start), Ok(end)) => start <= minute && minute < end.max(start + 1),
                    _ => false,
                }
            })
    }

    fn apply_timeline_edit(&mut self, edit: TimelineEdit) {
        match edit {
            TimelineEdit::Move { item, span } => {
                if let Some(target) = self.draft.schedule.iter_mut().find(|i| i.id == item) {
                    span.apply_to(target);
                    self.mark_edited();
                    self.status = format!(
                        "Moved to {}-{}",
                        format_time(span.start),
                        format_end_time(span.end)
                    );
                }
            }
            TimelineEdit::Create { span } => {
                self.mode = Mode::EditingItem {
                    item_id: None,
                    form: ItemForm::blank(span),
                };
                self.status = "New schedule block".into();
            }
        }
    }

    fn dial_point(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.dial_area;
        if !rect_contains(area, col, row) || area.width == 0 || area.height == 0 {
            return None;
        }
        let fx = (col - area.x) as f64 + 0.5;
        let fy = (row - area.y) as f64 + 0.5;
        let x = -DIAL_BOUND + fx / area.width as f64 * (2.0 * DIAL_BOUND);
        let y = DIAL_BOUND - fy / area.height as f64 * (2.0 * DIAL_BOUND);
        // the gesture layer thinks in screen coordinates (y down)
        let sy = -y;
        Some((sy.atan2(x), (x * x + sy * sy).sqrt()))
    }

    fn dial_target(&self, angle: f64, radius: f64) -> DialTarget {
        if !(DIAL_INNER - 0.1..=DIAL_OUTER + 0.15).contains(&radius) {
            return DialTarget::Empty;
        }
        let minutes = crate::gesture::angle_to_minutes(angle);
        let split = has_midnight_split(&self.draft.schedule);
        let items = sorted_by_start(&self.draft.schedule);
        for item in items.iter().rev() {
            if !visible_on_dial(item, split) {
                continue;
            }
            let (Ok(start), Ok(end)) = (parse_time(&item.start_time), parse_time(&item.end_time))
            else {
                continue;
            };
            let covered = start as f64 <= minutes && minutes < end as f64;
            if self.dial.hovered() == Some(item.id.as_str()) {
                if (minutes - start as f64).abs() <= HANDLE_MINUTES {
                    return DialTarget::StartHandle(item.id.clone());
                }
                if (minutes - end as f64).abs() <= HANDLE_MINUTES {
                    return DialTarget::EndHandle(item.id.clone());
                }
            }
            if covered {
                return DialTarget::Arc(item.id.clone());
            }
        }
        DialTarget::Empty
    }

    fn handle_dial_mouse(&mut self, mouse: MouseEvent) {
        let point = self.dial_point(mouse.column, mouse.row);
        if let Some((angle, _)) = point {
            self.last_dial_angle = angle;
        }
        match mouse.kind {
            MouseEventKind::Moved => {
                if let Some((angle, radius)) = point {
                    let target = self.dial_target(angle, radius);
                    self.dial.hover(&target);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let Some((angle, radius)) = point else { return };
                let target = self.dial_target(angle, radius);
                if let Some(span) = self.target_span(&target) {
                    self.dial.pointer_down(&target, angle, span);
                }
                self.dial_pressed = Some(target);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let angle = point.map(|(a, _)| a).unwrap_or(self.last_dial_angle);
                if let Some(preview) = self.dial.pointer_move(angle) {
                    self.dial_preview = Some(preview);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let now = Instant::now();
                let angle = point.map(|(a, _)| a).unwrap_or(self.last_dial_angle);
                if let Some(edit) = self.dial.pointer_up(angle, now) {
                    self.apply_dial_edit(edit);
                } else if let Some(target) = self.dial_pressed.take() {
                    if let Some(edit) = self.dial.click(&target, angle, now) {
                        self.apply_dial_edit(edit);
                    }
                }
                self.dial_pressed = None;
                self.dial_preview = None;
            }
            _ => {}
        }
    }

    fn target_span(&self, target: &DialTarget) -> Option<TimeSpan> {
        let id = match target {
            DialTarget::Arc(id) | DialTarget::StartHandle(id) | DialTarget::EndHandle(id) => id,
            DialTarget::Empty => return None,
        };
        self.draft
            .schedule
            .iter()
            .find(|i| &i.id == id)
            .and_then(|i| TimeSpan::of(i).ok())
    }

    fn apply_dial_edit(&mut self, edit: DialEdit) {
        match edit {
            DialEdit::Update { item, span } => {
                if let Some(target) = self.draft.schedule.iter_mut().find(|i| i.id == item) {
                    span.apply_to(target);
                    let status = format!(
                        "{} now {}-{}",
                        target.title,
                        format_time(span.start),
                        format_end_time(span.end)
                    );
                    self.mark_edited();
                    self.status = status;
                }
            }
            DialEdit::AddAt { minutes } => {
                // a new block defaults to one hour, pinned inside the day
                let span = TimeSpan {
                    start: minutes,
                    end: (minutes + 60).min(DAY_MINUTES),
                };
                self.mode = Mode::EditingItem {
                    item_id: None,
                    form: ItemForm::blank(span),
                };
                self.status = format!("New block at {}", format_time(minutes));
            }
            DialEdit::Open { item } => {
                if let Some(found) = self.draft.schedule.iter().find(|i| i.id == item) {
                    self.mode = Mode::EditingItem {
                        item_id: Some(found.id.clone()),
                        form: ItemForm::from_item(found),
                    };
                }
            }
        }
    }

    // -- drawing ----------------------------------------------------------

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Calendar => self.draw_calendar(f, layout[1]),
            ViewMode::Day => self.draw_day(f, layout[1]),
            ViewMode::Dial => self.draw_dial(f, layout[1]),
            ViewMode::Stats => self.draw_stats(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::EditingEntry(form) => self.draw_entry_form(f, form),
            Mode::EditingItem { item_id, form } => {
                let title = if item_id.is_some() {
                    "Edit Block"
                } else {
                    "New Block"
                };
                self.draw_item_form(f, title, form);
            }
            Mode::ConfirmDeleteItem { item_id } => self.draw_confirm(f, item_id),
            Mode::Searching {
                query,
                results,
                selected,
            } => self.draw_search(f, query, results, *selected),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let saved = match (self.dirty, self.last_saved) {
            (true, _) => Span::styled("unsaved edits", Style::default().fg(Color::Yellow)),
            (false, Some(at)) => Span::styled(
                format!("saved {}", format_elapsed(at)),
                Style::default().fg(Color::Green),
            ),
            (false, None) => Span::styled("no edits yet", Style::default().fg(Color::DarkGray)),
        };
        let title = Line::from(vec![
            Span::styled(
                "daybook ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.cursor.format("%Y-%m-%d (%a)").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            saved,
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(
            Paragraph::new(title).alignment(Alignment::Center).block(block),
            area,
        );
    }

    fn draw_calendar(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        let dates = self.month_dates();
        self.draw_month_grid(f, chunks[0], &dates);
        self.draw_review(f, chunks[1]);
    }

    fn draw_month_grid(&self, f: &mut ratatui::Frame<'_>, area: Rect, dates: &HashSet<NaiveDate>) {
        let cursor = self.cursor;
        let month_start =
            NaiveDate::from_ymd_opt(cursor.year(), cursor.month(), 1).unwrap_or(cursor);
        let days = days_in_month(month_start.year(), month_start.month());
        let start_offset = month_start.weekday().num_days_from_sunday();

        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            format!("{} {}", month_start.format("%B"), month_start.year()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let headings = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
        lines.push(Line::from(
            headings
                .iter()
                .map(|h| Span::styled(format!("{:^5}", h), Style::default().fg(Color::Gray)))
                .collect::<Vec<_>>(),
        ));

        let mut day: i32 = 1 - start_offset as i32;
        while day <= days as i32 {
            let mut spans = Vec::new();
            for _ in 0..7 {
                if day < 1 || day > days as i32 {
                    spans.push(Span::raw("     "));
                } else if let Some(date) =
                    NaiveDate::from_ymd_opt(month_start.year(), month_start.month(), day as u32)
                {
                    let marker = if dates.contains(&date) { "•" } else { " " };
                    let text = format!("{:>3}{} ", day, marker);
                    let mut style = Style::default().fg(if dates.contains(&date) {
                        Color::LightCyan
                    } else {
                        Color::Gray
                    });
                    if date == self.today {
                        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                    }
                    if date == cursor {
                        style = style.bg(Color::Cyan).fg(Color::Black);
                    }
                    spans.push(Span::styled(text, style));
                }
                day += 1;
            }
            lines.push(Line::from(spans));
        }

        let block = Block::default()
            .title(Span::styled(
                "Calendar",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(block),
            area,
        );
    }

    fn draw_review(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines = Vec::new();
        if self.review.is_empty() && self.review_random.is_none() {
            lines.push(Line::from("Nothing to look back on yet"));
        }
        if !self.review.is_empty() {
            lines.push(Line::from(Span::styled(
                "On this day",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            for entry in self.review.iter().take(2) {
                let years = self.today.year() - entry.date.year();
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{} years ago  ", years),
                        Style::default().fg(Color::LightBlue),
                    ),
                    Span::styled(
                        entry_summary(entry),
                        Style::default().fg(Color::White),
                    ),
                ]));
                lines.push(Line::from(Span::styled(
                    truncate_text(&entry.content, 60),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
        if let Some(entry) = &self.review_random {
            lines.push(Line::from(Span::styled(
                "From the archive",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}  ", entry.date),
                    Style::default().fg(Color::LightYellow),
                ),
                Span::styled(entry_summary(entry), Style::default().fg(Color::White)),
            ]));
            lines.push(Line::from(Span::styled(
                truncate_text(&entry.content, 60),
                Style::default().fg(Color::Gray),
            )));
        }
        let block = Block::default()
            .title(Span::styled(
                "Look back",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
    }

    fn draw_day(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(30)])
            .split(area);
        self.draw_timeline(f, chunks[0]);
        self.draw_entry_pane(f, chunks[1]);
    }

    fn draw_timeline(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                "Schedule (drag to move, drag empty to add)",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);
        self.timeline_area = inner;
        if inner.width < 8 || inner.height == 0 {
            return;
        }

        let viewport = inner.height as i32;
        let max_scroll = (TIMELINE_ROWS - viewport).max(0);
        self.scroll_rows = self.scroll_rows.clamp(0, max_scroll);

        let items = sorted_by_start(&self.draft.schedule);
        let bar_width = inner.width.saturating_sub(6) as usize;
        let now_row = if self.cursor == self.today {
            Some(self.now_marker.minutes / ROW_MINUTES)
        } else {
            None
        };

        let mut lines = Vec::new();
        for i in 0..viewport {
            let row = self.scroll_rows + i;
            if row >= TIMELINE_ROWS {
                lines.push(Line::from(""));
                continue;
            }
            let minutes = row * ROW_MINUTES;
            let is_now = now_row == Some(row);
            let prefix = if is_now {
                Span::styled("now ▶ ", Style::default().fg(Color::Red))
            } else if minutes % 60 == 0 {
                Span::styled(
                    format!("{:02}:00 ", minutes / 60),
                    Style::default().fg(Color::DarkGray),
                )
            } else {
                Span::styled("    · ", Style::default().fg(Color::Rgb(40, 42, 48)))
            };

            let cell = self.timeline_cell(&items, minutes, bar_width);
            lines.push(Line::from(vec![prefix, cell]));
        }
        f.render_widget(Paragraph::new(lines), inner);
    }

    /// One rendered row of the timeline: the preview ghost wins, then the
    /// later-starting block covering this minute.
    fn timeline_cell(&self, items: &[ScheduleItem], minutes: i32, width: usize) -> Span<'static> {
        if let Some((moving, span)) = &self.timeline_preview {
            if span.start <= minutes && minutes < span.end {
                let label = if minutes == round_down(span.start, ROW_MINUTES) {
                    format!(
                        " {}-{}",
                        format_time(span.start),
                        format_end_time(span.end)
                    )
                } else {
                    String::new()
                };
                let style = match moving {
                    Some(_) => Style::default().bg(Color::Cyan).fg(Color::Black),
                    None => Style::default().bg(Color::DarkGray).fg(Color::White),
                };
                return Span::styled(format!("{:<width$}", label, width = width), style);
            }
            // while moving, hide the block at its old position
            if let Some(id) = moving {
                if let Some(item) = items.iter().find(|i| &i.id == id) {
                    if let (Ok(start), Ok(end)) =
                        (parse_time(&item.start_time), parse_time(&item.end_time))
                    {
                        if start <= minutes && minutes < end {
                            return Span::raw(" ".repeat(width));
                        }
                    }
                }
            }
        }
        let selected_id = self.selected_schedule_item().map(|i| i.id);
        for item in items.iter().rev() {
            let (Ok(start), Ok(end)) = (parse_time(&item.start_time), parse_time(&item.end_time))
            else {
                continue;
            };
            if start <= minutes && minutes < end.max(start + 1) {
                let label = if minutes == round_down(start, ROW_MINUTES) {
                    format!(" {} {}", item.start_time, truncate_text(&item.title, width.saturating_sub(8)))
                } else {
                    String::new()
                };
                let mut style = Style::default()
                    .bg(category_color(item.category))
                    .fg(Color::Black);
                if selected_id.as_deref() == Some(item.id.as_str()) {
                    style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                }
                return Span::styled(format!("{:<width$}", label, width = width), style);
            }
        }
        Span::raw(" ".repeat(width))
    }

    fn draw_entry_pane(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(4), Constraint::Length(8)])
            .split(area);

        // meta: mood + tags
        let mood_spans: Vec<Span> = Mood::ALL
            .iter()
            .flat_map(|m| {
                let style = if *m == self.draft.mood {
                    Style::default().add_modifier(Modifier::BOLD).bg(Color::Rgb(40, 42, 48))
                } else {
                    Style::default().add_modifier(Modifier::DIM)
                };
                [Span::styled(format!(" {} ", m.emoji()), style), Span::raw(" ")]
            })
            .collect();
        let mut meta = vec![Line::from(mood_spans)];
        let tags = if self.draft.tags.is_empty() {
            Line::from(Span::styled("no tags", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(Span::styled(
                format!("#{}", self.draft.tags.join(" #")),
                Style::default().fg(Color::LightMagenta),
            ))
        };
        meta.push(tags);
        let meta_block = Block::default()
            .title(Span::styled(
                match &self.draft.title {
                    Some(title) => format!("{} - {}", self.draft.date, title),
                    None => self.draft.date.to_string(),
                },
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(meta).block(meta_block), chunks[0]);

        // entry text
        let content = if self.draft.content.is_empty() {
            Paragraph::new(Span::styled(
                "How was the day? Press e to write.",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Paragraph::new(self.draft.content.clone())
        };
        let content_block = Block::default()
            .title(Span::styled(
                "Entry",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(content.wrap(Wrap { trim: false }).block(content_block), chunks[1]);

        // schedule item list
        let items = sorted_by_start(&self.draft.schedule);
        let list_items: Vec<ListItem> = if items.is_empty() {
            vec![ListItem::new("No blocks yet (a adds one)")]
        } else {
            items
                .iter()
                .map(|item| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("{}-{} ", item.start_time, item.end_time),
                            Style::default().fg(Color::Gray),
                        ),
                        Span::styled(
                            format!("[{}] ", item.category),
                            Style::default().fg(category_color(item.category)),
                        ),
                        Span::styled(
                            item.title.clone(),
                            Style::default().fg(Color::White),
                        ),
                    ]))
                })
                .collect()
        };
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(self.selected_item.min(items.len() - 1)));
        }
        let list_block = Block::default()
            .title(Span::styled(
                format!("Blocks ({})", items.len()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let list = List::new(list_items).block(list_block).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, chunks[2], &mut state);
    }

    fn draw_dial(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                "24h dial (drag arcs, drag handles near edges, click empty to add)",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);
        self.dial_area = inner;
        if inner.width < 10 || inner.height < 5 {
            return;
        }

        let split = has_midnight_split(&self.draft.schedule);
        let items = sorted_by_start(&self.draft.schedule);
        let hovered = self.dial.hovered().map(str::to_string);
        let preview = self.dial_preview.clone();

        let canvas = Canvas::default()
            .x_bounds([-DIAL_BOUND, DIAL_BOUND])
            .y_bounds([-DIAL_BOUND, DIAL_BOUND])
            .marker(Marker::Braille)
            .paint(move |ctx| {
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: DIAL_OUTER,
                    color: Color::DarkGray,
                });
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: DIAL_INNER,
                    color: Color::Rgb(40, 42, 48),
                });
                for item in &items {
                    if !visible_on_dial(item, split) {
                        continue;
                    }
                    let span = match (&preview, TimeSpan::of(item)) {
                        (Some((id, preview_span)), _) if *id == item.id => *preview_span,
                        (_, Ok(span)) => span,
                        (_, Err(_)) => continue,
                    };
                    let is_hovered = hovered.as_deref() == Some(item.id.as_str());
                    draw_arc(ctx, span, category_color(item.category), is_hovered);
                    let mid = (span.start + span.end) as f64 / 2.0 / DAY_MINUTES as f64;
                    // labels vanish on slivers where they could not be read
                    if (span.end - span.start) as f64 / DAY_MINUTES as f64 > 0.035 {
                        let (x, y) = dial_xy(mid, (DIAL_OUTER + DIAL_INNER) / 2.0);
                        let label = if item.title.is_empty() {
                            item.category.key().to_string()
                        } else {
                            truncate_text(&item.title, 9)
                        };
                        ctx.print(
                            x,
                            y,
                            Line::from(Span::styled(
                                label,
                                Style::default().fg(Color::White),
                            )),
                        );
                    }
                }
                for hour in [0u32, 3, 6, 9, 12, 15, 18, 21] {
                    let (x, y) = dial_xy((hour * 60) as f64 / DAY_MINUTES as f64, 1.15);
                    ctx.print(
                        x,
                        y,
                        Line::from(Span::styled(
                            hour.to_string(),
                            Style::default().fg(Color::Gray),
                        )),
                    );
                }
            });
        f.render_widget(canvas, inner);
    }

    fn draw_stats(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(stats) = self.stats.clone() else {
            f.render_widget(
                Paragraph::new("No entries yet").alignment(Alignment::Center),
                area,
            );
            return;
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(9),
                Constraint::Min(8),
            ])
            .split(area);

        let overview = Line::from(vec![
            Span::styled(
                format!("{} entries", stats.total_entries),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} characters", stats.total_chars),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} day streak", stats.streak),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        f.render_widget(
            Paragraph::new(overview).alignment(Alignment::Center),
            rows[0],
        );

        self.draw_heatmap(f, rows[1], &stats.heatmap);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[2]);
        self.draw_activity_bars(f, columns[0], &stats);
        self.draw_mood_and_tags(f, columns[1], &stats);
    }

    fn draw_heatmap(&self, f: &mut ratatui::Frame<'_>, area: Rect, heatmap: &[HeatCell]) {
        let block = Block::default()
            .title(Span::styled(
                "Activity (last 365 days)",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let weeks = heatmap.chunks(7).collect::<Vec<_>>();
        let visible = (inner.width as usize / 2).min(weeks.len());
        let start = weeks.len() - visible;
        let mut lines = Vec::new();
        for day_of_week in 0..7usize {
            let mut spans = Vec::new();
            for week in &weeks[start..] {
                let span = match week.get(day_of_week) {
                    Some(cell) => Span::styled("■ ", Style::default().fg(heat_color(cell.level))),
                    None => Span::raw("  "),
                };
                spans.push(span);
            }
            lines.push(Line::from(spans));
        }
        f.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_activity_bars(&self, f: &mut ratatui::Frame<'_>, area: Rect, stats: &Stats) {
        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            "Entries per month",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let max_month = stats.monthly.iter().map(|m| m.count).max().unwrap_or(0).max(1);
        for month in &stats.monthly {
            let width = (month.count * 20 / max_month).min(20);
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:>4}-{:02} ", month.year, month.month),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled("█".repeat(width), Style::default().fg(Color::Blue)),
                Span::styled(format!(" {}", month.count), Style::default().fg(Color::Gray)),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "By weekday",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let labels = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        let max_day = stats.weekday_counts.iter().copied().max().unwrap_or(0).max(1);
        for (label, count) in labels.iter().zip(stats.weekday_counts.iter()) {
            let width = (count * 20 / max_day).min(20);
            lines.push(Line::from(vec![
                Span::styled(format!("{:>7} ", label), Style::default().fg(Color::Gray)),
                Span::styled("█".repeat(width), Style::default().fg(Color::LightBlue)),
                Span::styled(format!(" {}", count), Style::default().fg(Color::Gray)),
            ]));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_mood_and_tags(&self, f: &mut ratatui::Frame<'_>, area: Rect, stats: &Stats) {
        let mut lines = Vec::new();
        lines.push(Line::from(Span::styled(
            "Moods",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        for (mood, count) in &stats.mood_counts {
            let percent = *count as f64 / stats.total_entries.max(1) as f64 * 100.0;
            let width = (percent / 5.0).round() as usize;
            lines.push(Line::from(vec![
                Span::raw(format!("{} {:<9} ", mood.emoji(), mood)),
                Span::styled("█".repeat(width), Style::default().fg(Color::Magenta)),
                Span::styled(
                    format!(" {:.0}%", percent),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Happiest tags",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        if stats.tag_mood_ranking.is_empty() {
            lines.push(Line::from(Span::styled(
                "Not enough tagged entries yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (rank, tag) in stats.tag_mood_ranking.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}. ", rank + 1),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("#{} ", tag.tag),
                    Style::default().fg(Color::LightMagenta),
                ),
                Span::styled(
                    format!("{:.1} over {} entries", tag.average, tag.count),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Tags",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        let cloud = stats
            .tag_cloud
            .iter()
            .map(|(tag, count)| format!("#{}({})", tag, count))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(Line::from(Span::styled(
            if cloud.is_empty() { "No tags yet".into() } else { cloud },
            Style::default().fg(Color::LightMagenta),
        )));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(1)])
            .split(area);
        let help = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help, rows[0]);
        f.render_widget(
            Paragraph::new(self.status.clone()).wrap(Wrap { trim: true }),
            rows[1],
        );
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("1", Style::default().fg(Color::LightCyan)),
            Span::raw(" calendar  "),
            Span::styled("2", Style::default().fg(Color::LightCyan)),
            Span::raw(" day  "),
            Span::styled("3", Style::default().fg(Color::LightCyan)),
            Span::raw(" dial  "),
            Span::styled("4", Style::default().fg(Color::LightCyan)),
            Span::raw(" stats  "),
            Span::styled("/", Style::default().fg(Color::LightGreen)),
            Span::raw(" search  "),
        ];
        match self.view {
            ViewMode::Calendar => spans.extend([
                Span::styled("←↑↓→", Style::default().fg(Color::LightCyan)),
                Span::raw(" move  "),
                Span::styled("[/]", Style::default().fg(Color::LightCyan)),
                Span::raw(" month  "),
                Span::styled("t", Style::default().fg(Color::LightYellow)),
                Span::raw(" today  "),
                Span::styled("Enter", Style::default().fg(Color::LightYellow)),
                Span::raw(" open day  "),
            ]),
            ViewMode::Day | ViewMode::Dial => spans.extend([
                Span::styled("e", Style::default().fg(Color::LightYellow)),
                Span::raw(" edit entry  "),
                Span::styled("a", Style::default().fg(Color::LightMagenta)),
                Span::raw(" add block  "),
                Span::styled("d", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
                Span::styled("[/]", Style::default().fg(Color::LightCyan)),
                Span::raw(" prev/next day  "),
            ]),
            ViewMode::Stats => {}
        }
        spans.extend([
            Span::styled("q", Style::default().fg(Color::LightRed)),
            Span::raw(" quit"),
        ]);
        Line::from(spans)
    }

    fn draw_entry_form(&self, f: &mut ratatui::Frame<'_>, form: &EntryForm) {
        let area = centered_rect(70, 70, f.size());
        let mut fields = Vec::new();
        fields.extend(field_lines(
            "Title",
            &form.title,
            form.field == EntryField::Title,
        ));
        fields.extend(field_lines(
            "Entry",
            &form.content,
            form.field == EntryField::Content,
        ));
        fields.extend(field_lines(
            "Tags",
            &form.tags,
            form.field == EntryField::Tags,
        ));
        if form.field == EntryField::Tags {
            if let Some(hint) = self.tag_hint(&form.tags.value) {
                fields.push(Line::from(Span::styled(
                    format!("  suggestions: {}", hint),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        let mood_label = Span::styled(
            "Mood: ",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD | Modifier::DIM),
        );
        let mut mood_spans = vec![mood_label];
        for mood in Mood::ALL {
            let style = if mood == form.mood {
                Style::default()
                    .fg(if form.field == EntryField::Mood {
                        Color::Cyan
                    } else {
                        Color::White
                    })
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            mood_spans.push(Span::styled(format!("{} {}  ", mood.emoji(), mood), style));
        }
        fields.push(Line::from(mood_spans));
        fields.push(Line::from(Span::styled(
            "Ctrl+Enter saves • Esc cancels • Tab moves • Enter adds a newline in Entry • ←→ pick mood",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        format!("Entry for {}", self.draft.date),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn tag_hint(&self, raw: &str) -> Option<String> {
        let prefix = raw.split(|c: char| c.is_whitespace() || c == ',').last()?;
        if prefix.is_empty() {
            return None;
        }
        let candidates = self.diary.tag_suggestions(prefix).ok()?;
        if candidates.is_empty() {
            return None;
        }
        Some(candidates.into_iter().take(5).collect::<Vec<_>>().join(", "))
    }

    fn draw_item_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &ItemForm) {
        let area = centered_rect(60, 55, f.size());
        let mut fields = Vec::new();
        fields.extend(field_lines(
            "Title",
            &form.title,
            form.field == ItemField::Title,
        ));
        fields.extend(field_lines(
            "Start (HH:MM)",
            &form.start,
            form.field == ItemField::Start,
        ));
        fields.extend(field_lines(
            "End (HH:MM)",
            &form.end,
            form.field == ItemField::End,
        ));
        fields.extend(field_lines(
            "Notes",
            &form.description,
            form.field == ItemField::Description,
        ));
        let mut category_spans = vec![Span::styled(
            "Category: ",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD | Modifier::DIM),
        )];
        for category in Category::ALL {
            let style = if category == form.category {
                Style::default()
                    .fg(if form.field == ItemField::Category {
                        Color::Cyan
                    } else {
                        category_color(category)
                    })
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            category_spans.push(Span::styled(format!("{} ", category), style));
        }
        fields.push(Line::from(category_spans));
        fields.push(Line::from(Span::styled(
            "Enter saves • Esc cancels • Tab moves • ←→ pick category",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, item_id: &str) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .draft
            .schedule
            .iter()
            .find(|i| i.id == item_id)
            .map(|i| i.title.clone())
            .unwrap_or_else(|| item_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_search(
        &self,
        f: &mut ratatui::Frame<'_>,
        query: &FieldValue,
        results: &[DiaryEntry],
        selected: usize,
    ) {
        let area = centered_rect(70, 60, f.size());
        let mut lines = vec![Line::from(vec![
            Span::styled(
                "Search: ",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(query.with_caret(), Style::default().fg(Color::Cyan)),
        ])];
        lines.push(Line::from(""));
        if results.is_empty() {
            lines.push(Line::from(Span::styled(
                if query.value.trim().is_empty() {
                    "Type to search content, titles, and tags"
                } else {
                    "No matches"
                },
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (idx, entry) in results.iter().take(12).enumerate() {
            let mut style = Style::default().fg(Color::White);
            if idx == selected {
                style = style.bg(Color::LightCyan).fg(Color::Black);
            }
            lines.push(Line::from(vec![
                Span::styled(format!("{} {} ", entry.date, entry.mood.emoji()), style),
                Span::styled(truncate_text(&entry_summary(entry), 48), style),
            ]));
        }
        let dialog = Paragraph::new(lines).block(
            Block::default()
                .title(Span::styled(
                    "Find an entry",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn rect_contains(area: Rect, col: u16, row: u16) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

fn round_down(value: i32, step: i32) -> i32 {
    value - value.rem_euclid(step)
}

fn dial_xy(fraction: f64, radius: f64) -> (f64, f64) {
    let angle = crate::gesture::fraction_to_angle(fraction);
    // canvas y grows upward while the angle math assumes screen y down
    (radius * angle.cos(), -radius * angle.sin())
}

fn draw_arc(
    ctx: &mut ratatui::widgets::canvas::Context<'_>,
    span: TimeSpan,
    color: Color,
    hovered: bool,
) {
    let start = span.start as f64 / DAY_MINUTES as f64;
    let end = span.end as f64 / DAY_MINUTES as f64;
    let steps = (((end - start) * 144.0).ceil() as usize).max(2);
    let mut previous = dial_xy(start, DIAL_OUTER);
    for step in 1..=steps {
        let fraction = start + (end - start) * step as f64 / steps as f64;
        let point = dial_xy(fraction, DIAL_OUTER);
        ctx.draw(&CanvasLine {
            x1: previous.0,
            y1: previous.1,
            x2: point.0,
            y2: point.1,
            color,
        });
        previous = point;
    }
    for fraction in [start, end] {
        let outer = dial_xy(fraction, DIAL_OUTER);
        let inner = dial_xy(fraction, DIAL_INNER);
        ctx.draw(&CanvasLine {
            x1: inner.0,
            y1: inner.1,
            x2: outer.0,
            y2: outer.1,
            color,
        });
    }
    if hovered {
        // resize handles sit on the span edges at mid radius
        let mid_radius = (DIAL_OUTER + DIAL_INNER) / 2.0;
        for fraction in [start, end] {
            let (x, y) = dial_xy(fraction, mid_radius);
            ctx.print(
                x,
                y,
                Line::from(Span::styled(
                    "◆",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
            );
        }
    }
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Research => Color::Magenta,
        Category::University => Color::LightMagenta,
        Category::Work => Color::Blue,
        Category::Dev => Color::Cyan,
        Category::Study => Color::LightBlue,
        Category::Reading => Color::LightCyan,
        Category::Hobby => Color::Green,
        Category::Routine => Color::Yellow,
        Category::Commute => Color::LightYellow,
        Category::Sleep => Color::DarkGray,
        Category::Other => Color::Gray,
    }
}

fn heat_color(level: u8) -> Color {
    match level {
        0 => Color::Rgb(45, 47, 52),
        1 => Color::Rgb(134, 239, 172),
        2 => Color::Rgb(74, 222, 128),
        3 => Color::Rgb(34, 197, 94),
        _ => Color::Rgb(22, 163, 74),
    }
}

fn entry_summary(entry: &DiaryEntry) -> String {
    entry
        .title
        .clone()
        .unwrap_or_else(|| truncate_text(&entry.content, 40))
}

fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().trim_start_matches('#').to_string())
        .collect()
}

fn field_lines(label: &str, field: &FieldValue, active: bool) -> Vec<Line<'static>> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let prefix = format!("{}: ", label);
    let spacer = " ".repeat(prefix.chars().count());
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    let segments: Vec<&str> = if text.is_empty() {
        vec![""]
    } else {
        text.split('\n').collect()
    };
    segments
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let mut spans = Vec::new();
            spans.push(Span::styled(
                if idx == 0 {
                    prefix.clone()
                } else {
                    spacer.clone()
                },
                label_style,
            ));
            spans.push(Span::styled((*line).to_string(), value_style));
            Line::from(spans)
        })
        .collect()
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.chars().count() >= max.saturating_sub(3) {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    if out.chars().count() > max {
        out.truncate(max);
    }
    out
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn line_state(text: &str, cursor: usize) -> (Vec<usize>, usize, usize) {
    let mut starts = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    let mut line_idx = 0;
    for (i, start) in starts.iter().enumerate() {
        if *start <= cursor {
            line_idx = i;
        } else {
            break;
        }
    }
    let col = text[start_of_line(line_idx, &starts)..cursor]
        .chars()
        .count();
    (starts, line_idx, col)
}

fn start_of_line(line_idx: usize, starts: &[usize]) -> usize {
    *starts.get(line_idx).unwrap_or(&0)
}

fn index_at_col(text: &str, start: usize, target_col: usize) -> usize {
    let slice = &text[start..];
    let limit = slice.find('\n').unwrap_or_else(|| slice.len());
    let mut col = 0;
    for (idx, _) in slice[..limit].char_indices() {
        if col == target_col {
            return start + idx;
        }
        col += 1;
    }
    start + limit
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| Local::now().date_naive());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap_or(first);
    next.pred_opt().map(|d| d.day()).unwrap_or(28)
}
