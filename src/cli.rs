use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "daybook",
    version,
    about = "Terminal personal diary with a day-schedule editor"
)]
pub struct Cli {
    /// Path to the diary data file (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,
    /// Keep the diary in memory only; nothing touches disk
    #[arg(long, global = true)]
    pub ephemeral: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the entry for a date
    Show {
        /// Date in YYYY-MM-DD format (defaults to today)
        date: Option<String>,
    },
    /// Write or update the entry for a date
    Write {
        /// Date in YYYY-MM-DD format (defaults to today)
        date: Option<String>,
        /// Entry title
        #[arg(long)]
        title: Option<String>,
        /// Entry text
        #[arg(long)]
        content: Option<String>,
        /// Tags for the entry (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Mood: excellent, good, normal, bad, or terrible
        #[arg(long)]
        mood: Option<String>,
    },
    /// List entries, oldest first
    List {
        /// Restrict to a month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Search entries by substring across content, title, and tags
    Search {
        query: String,
    },
    /// Anniversaries for today plus a random recall entry
    Review,
    /// A random past entry
    Random,
    /// Statistics over the whole diary
    Stats,
    /// Export every entry to a file
    Export {
        /// Output format: json or markdown
        #[arg(long, default_value = "json")]
        format: String,
        /// File to write
        #[arg(long)]
        out: PathBuf,
    },
    /// Render a day's schedule as a circular SVG chart
    Chart {
        /// Date in YYYY-MM-DD format (defaults to today)
        date: Option<String>,
        /// File to write
        #[arg(long)]
        out: PathBuf,
        /// Chart size in pixels
        #[arg(long, default_value_t = 300.0)]
        size: f64,
    },
    /// Launch the interactive TUI
    Tui,
}
