//! habitsync CLI
//!
//! Command-line habit tracker over the offline-first sync engine.
//!
//! # Commands
//!
//! - `list` - Show habits due on a day
//! - `add` - Create a habit and schedule its reminder
//! - `show` - Display one habit
//! - `complete` - Toggle a habit's completion for a day
//! - `sync` - Pull every habit from the remote into the local store

mod alarm;
mod app;
mod commands;
mod parse;

use app::{App, AppOptions};
use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Offline-first habit tracker.
#[derive(Parser)]
#[command(name = "habitsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local habit snapshot
    #[arg(global = true, short, long, default_value = "habits.json")]
    store: PathBuf,

    /// Base URL of the remote habit service
    #[arg(global = true, short, long)]
    remote: Option<String>,

    /// UTC offset used for day boundaries (e.g. +05:30)
    #[arg(global = true, long, default_value = "+00:00", value_parser = parse::utc_offset, allow_hyphen_values = true)]
    utc_offset: FixedOffset,

    /// Timeout for remote requests, in seconds
    #[arg(global = true, long)]
    timeout_secs: Option<u64>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show habits due on a day
    List {
        /// Day to list (YYYY-MM-DD), today by default
        #[arg(short, long, value_parser = parse::date)]
        date: Option<NaiveDate>,

        /// Include habits not scheduled on that weekday
        #[arg(short, long)]
        all: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create a habit and schedule its reminder
    Add {
        /// Habit name
        #[arg(short, long)]
        name: String,

        /// Reminder days (e.g. mon,wed,fri)
        #[arg(short, long, required = true, value_delimiter = ',', value_parser = parse::weekday)]
        days: Vec<Weekday>,

        /// Reminder time (HH:MM)
        #[arg(short = 't', long, value_parser = parse::reminder)]
        reminder: NaiveTime,

        /// First day of the habit (YYYY-MM-DD), now by default
        #[arg(long, value_parser = parse::date)]
        start: Option<NaiveDate>,
    },

    /// Display one habit
    Show {
        /// Habit id
        id: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Toggle a habit's completion for a day
    Complete {
        /// Habit id
        id: String,

        /// Day to toggle (YYYY-MM-DD), today by default
        #[arg(short, long, value_parser = parse::date)]
        date: Option<NaiveDate>,
    },

    /// Pull every habit from the remote into the local store
    Sync,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = App::open(AppOptions {
        store: cli.store,
        remote: cli.remote,
        offset: cli.utc_offset,
        timeout: cli.timeout_secs.map(Duration::from_secs),
    })
    .await?;

    let result = run(&app, cli.command).await;
    app.settle().await;
    result
}

async fn run(app: &App, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::List { date, all, format } => {
            let reports = commands::list::run(app, date, all).await?;
            commands::print_reports(&reports, &format)?;
        }
        Commands::Add {
            name,
            days,
            reminder,
            start,
        } => {
            let habit = commands::add::run(app, &name, days, reminder, start).await?;
            println!("Added {} ({})", habit.name, habit.id);
        }
        Commands::Show { id, format } => {
            let report = commands::show::run(app, &id).await?;
            commands::print_report(&report, &format)?;
        }
        Commands::Complete { id, date } => {
            let report = commands::complete::run(app, &id, date).await?;
            let state = if report.completed { "done" } else { "not done" };
            println!("{} marked {state} on {}", report.name, report.date);
        }
        Commands::Sync => {
            let outcome = commands::sync::run(app).await?;
            commands::sync::print(outcome);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_day_list() {
        let cli = Cli::try_parse_from([
            "habitsync",
            "--utc-offset",
            "-05:00",
            "add",
            "--name",
            "Run",
            "--days",
            "mon,fri",
            "--reminder",
            "06:45",
        ])
        .unwrap();

        assert_eq!(cli.utc_offset.local_minus_utc(), -5 * 3600);
        assert_eq!(cli.store, PathBuf::from("habits.json"));
        match cli.command {
            Commands::Add { days, reminder, .. } => {
                assert_eq!(days, vec![Weekday::Mon, Weekday::Fri]);
                assert_eq!(reminder, NaiveTime::from_hms_opt(6, 45, 0).unwrap());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn add_requires_days() {
        assert!(Cli::try_parse_from(["habitsync", "add", "--name", "Run", "--reminder", "06:45"]).is_err());
    }
}
