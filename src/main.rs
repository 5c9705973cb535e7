mod chart;
mod cli;
mod commands;
mod gesture;
mod model;
mod schedule;
mod service;
mod stats;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let data_file = args.data_file;
    let ephemeral = args.ephemeral;
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Show { date } => commands::show(data_file, ephemeral, date),
        cli::Command::Write {
            date,
            title,
            content,
            tags,
            mood,
        } => commands::write(data_file, ephemeral, date, title, content, tags, mood),
        cli::Command::List { month } => commands::list(data_file, ephemeral, month),
        cli::Command::Search { query } => commands::search(data_file, ephemeral, query),
        cli::Command::Review => commands::review(data_file, ephemeral),
        cli::Command::Random => commands::random(data_file, ephemeral),
        cli::Command::Stats => commands::stats(data_file, ephemeral),
        cli::Command::Export { format, out } => {
            commands::export(data_file, ephemeral, format, out)
        }
        cli::Command::Chart { date, out, size } => {
            commands::chart(data_file, ephemeral, date, out, size)
        }
        cli::Command::Tui => commands::tui(data_file, ephemeral),
    }
}
