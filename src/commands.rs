use crate::chart;
use crate::model::{DiaryEntry, Mood};
use crate::service::Diary;
use crate::stats::Stats;
use crate::storage::{EntryStore, FileStore, MemStore};
use crate::ui;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub fn show(data_file: Option<PathBuf>, ephemeral: bool, date: Option<String>) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let date = parse_date(date.as_deref())?;
    match diary.store().get(date)? {
        Some(entry) => print_entry(&entry),
        None => println!("No entry for {}", date),
    }
    Ok(())
}

pub fn write(
    data_file: Option<PathBuf>,
    ephemeral: bool,
    date: Option<String>,
    title: Option<String>,
    content: Option<String>,
    tags: Vec<String>,
    mood: Option<String>,
) -> Result<()> {
    let mut diary = open_diary(data_file, ephemeral)?;
    let date = parse_date(date.as_deref())?;
    let mut draft = diary.load_day(date)?;
    if let Some(t) = title {
        draft.title = if t.trim().is_empty() { None } else { Some(t) };
    }
    if let Some(c) = content {
        draft.content = c;
    }
    if !tags.is_empty() {
        draft.tags = tags;
    }
    if let Some(m) = mood {
        draft.mood = Mood::from_str(&m).map_err(|e| anyhow!(e))?;
    }
    let entry = diary.save_day(draft)?;
    println!("Saved entry for {} ({})", entry.date, entry.mood);
    Ok(())
}

pub fn list(data_file: Option<PathBuf>, ephemeral: bool, month: Option<String>) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let entries = match month {
        Some(m) => {
            let (year, month) = parse_month(&m)?;
            diary.store().list_by_month(year, month)?
        }
        None => diary.store().list()?,
    };
    if entries.is_empty() {
        println!("No entries yet");
        return Ok(());
    }
    for entry in entries {
        print_entry_line(&entry);
    }
    Ok(())
}

pub fn search(data_file: Option<PathBuf>, ephemeral: bool, query: String) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let hits = diary.store().search(&query)?;
    if hits.is_empty() {
        println!("No entries match \"{}\"", query);
        return Ok(());
    }
    for entry in hits {
        print_entry_line(&entry);
    }
    Ok(())
}

pub fn review(data_file: Option<PathBuf>, ephemeral: bool) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let today = Local::now().date_naive();
    let bundle = diary.review(today)?;
    if bundle.on_this_day.is_empty() && bundle.random.is_none() {
        println!("Nothing to look back on yet");
        return Ok(());
    }
    if !bundle.on_this_day.is_empty() {
        println!("On this day:");
        for entry in &bundle.on_this_day {
            print_entry_line(entry);
        }
    }
    if let Some(entry) = bundle.random {
        println!("From the archive:");
        print_entry_line(&entry);
    }
    Ok(())
}

pub fn random(data_file: Option<PathBuf>, ephemeral: bool) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    match diary.store().random_entry()? {
        Some(entry) => print_entry(&entry),
        None => println!("No entries with content yet"),
    }
    Ok(())
}

pub fn stats(data_file: Option<PathBuf>, ephemeral: bool) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let entries = diary.store().list()?;
    let stats = Stats::compute(&entries, Local::now().date_naive());

    println!(
        "{} entries, {} characters, {} day streak",
        stats.total_entries, stats.total_chars, stats.streak
    );
    if !stats.mood_counts.is_empty() {
        println!("Moods:");
        for (mood, count) in &stats.mood_counts {
            let percent = (*count as f64 / stats.total_entries as f64 * 100.0).round();
            println!("  {} {:<9} {:>3} ({:.0}%)", mood.emoji(), mood, count, percent);
        }
    }
    if !stats.tag_cloud.is_empty() {
        println!("Top tags:");
        for (tag, count) in stats.tag_cloud.iter().take(5) {
            println!("  #{} ({})", tag, count);
        }
    }
    if !stats.tag_mood_ranking.is_empty() {
        println!("Happiest tags:");
        for ranked in &stats.tag_mood_ranking {
            println!("  #{} {:.1} across {} entries", ranked.tag, ranked.average, ranked.count);
        }
    }
    println!("This month: {} entries", stats.monthly.last().map(|m| m.count).unwrap_or(0));
    Ok(())
}

pub fn export(
    data_file: Option<PathBuf>,
    ephemeral: bool,
    format: String,
    out: PathBuf,
) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let rendered = match format.as_str() {
        "json" => diary.export_json()?,
        "markdown" | "md" => diary.export_markdown()?,
        other => bail!("unknown export format: {} (use json or markdown)", other),
    };
    fs::write(&out, rendered).with_context(|| format!("writing {:?}", out))?;
    println!("Exported diary to {}", out.display());
    Ok(())
}

pub fn chart(
    data_file: Option<PathBuf>,
    ephemeral: bool,
    date: Option<String>,
    out: PathBuf,
    size: f64,
) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    let date = parse_date(date.as_deref())?;
    let draft = diary.load_day(date)?;
    let svg = chart::render_svg(&draft.schedule, size)?;
    fs::write(&out, svg).with_context(|| format!("writing {:?}", out))?;
    println!("Rendered {} schedule to {}", date, out.display());
    Ok(())
}

pub fn tui(data_file: Option<PathBuf>, ephemeral: bool) -> Result<()> {
    let diary = open_diary(data_file, ephemeral)?;
    ui::run(diary)
}

fn open_diary(data_file: Option<PathBuf>, ephemeral: bool) -> Result<Diary> {
    let store: Box<dyn EntryStore> = if ephemeral {
        Box::new(MemStore::new())
    } else {
        let path = match data_file {
            Some(path) => path,
            None => FileStore::default_path()?,
        };
        Box::new(FileStore::at(path))
    };
    Ok(Diary::new(store))
}

fn parse_date(input: Option<&str>) -> Result<NaiveDate> {
    match input {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw)),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_month(input: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month (use YYYY-MM): {}", input))?;
    Ok((chrono::Datelike::year(&date), chrono::Datelike::month(&date)))
}

fn print_entry(entry: &DiaryEntry) {
    match &entry.title {
        Some(title) => println!("{} - {} {}", entry.date, title, entry.mood.emoji()),
        None => println!("{} {}", entry.date, entry.mood.emoji()),
    }
    if !entry.tags.is_empty() {
        println!("tags: {}", entry.tags.join(", "));
    }
    if !entry.content.is_empty() {
        println!();
        println!("{}", entry.content);
    }
    if !entry.schedule.is_empty() {
        println!();
        println!("schedule:");
        for item in crate::schedule::sorted_by_start(&entry.schedule) {
            println!(
                "  {}-{} [{}] {}",
                item.start_time, item.end_time, item.category, item.title
            );
        }
    }
}

fn print_entry_line(entry: &DiaryEntry) {
    let summary = entry
        .title
        .clone()
        .unwrap_or_else(|| entry.content.chars().take(50).collect());
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        format!("  #{}", entry.tags.join(" #"))
    };
    println!("  {} {} {}{}", entry.date, entry.mood.emoji(), summary, tags);
}
