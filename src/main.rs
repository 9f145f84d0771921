use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use clap::{Parser, Subcommand};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use worktime_lib::{
    clock::SystemClock,
    config::AppConfig,
    db::{models::UserId, MemoryStore},
    records::{commands as records, RecordEdit},
    settings::{SettingsStore, UserSettings},
    timer::commands as timer,
    utils::logging,
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "worktime", version, about = "Track working time per user")]
struct Args {
    /// User whose time is tracked
    #[arg(short, long)]
    user: UserId,

    /// Directory holding the database and settings (overrides WORKTIME_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep records in memory only
    #[arg(long)]
    memory: bool,

    /// Verbose logging (same as WORKTIME_DEBUG=1)
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Parser)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Start,
    Pause,
    Resume,
    Stop,
    /// Drop the current session without saving it
    Discard,
    Status,
    List,
    /// Totals for a month, e.g. `report 2025-03` (defaults to the current month)
    Report { month: Option<String> },
    /// Replace start, end and pause of a record
    Edit {
        id: String,
        #[arg(value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        #[arg(value_parser = parse_timestamp)]
        end: DateTime<Utc>,
        pause_minutes: u64,
    },
    Delete { id: String },
    /// Toggle starting a session on sign-in
    Auto {
        #[arg(value_parser = ["on", "off"])]
        mode: String,
    },
    Quit,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("expected RFC 3339 timestamp: {err}"))
}

fn parse_month(value: &str) -> Result<(i32, u32), String> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{value}'"))?;
    let year = year.parse().map_err(|_| format!("invalid year '{year}'"))?;
    let month = month.parse().map_err(|_| format!("invalid month '{month}'"))?;
    Ok((year, month))
}

fn format_ms(ms: u64) -> String {
    let minutes = ms / 60_000;
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("error: {err}"),
    }
}

/// Returns false when the loop should end.
async fn dispatch(state: &AppState, user_id: UserId, command: Command) -> Result<bool, String> {
    match command {
        Command::Start => print_json(&timer::start_tracking(state, user_id).await?),
        Command::Pause => print_json(&timer::pause_tracking(state, user_id).await?),
        Command::Resume => print_json(&timer::resume_tracking(state, user_id).await?),
        Command::Stop => {
            let finished = timer::stop_tracking(state, user_id).await?;
            println!(
                "saved {}: worked {}, paused {}",
                finished.record_id,
                format_ms(finished.working_ms),
                format_ms(finished.pause_ms)
            );
        }
        Command::Discard => {
            timer::discard_tracking(state, user_id).await?;
            println!("session discarded");
        }
        Command::Status => match timer::get_tracking_state(state, user_id).await? {
            Some(snapshot) => print_json(&snapshot),
            None => println!("no session"),
        },
        Command::List => {
            for record in records::list_records(state, user_id).await? {
                println!(
                    "{}  {} - {}  total {}  pause {}",
                    record.id,
                    record.start.to_rfc3339(),
                    record.end.to_rfc3339(),
                    format_ms(record.total_ms),
                    format_ms(record.pause_ms)
                );
            }
        }
        Command::Report { month } => {
            let (year, month) = match month {
                Some(value) => parse_month(&value)?,
                None => {
                    let today = Utc::now();
                    (today.year(), today.month())
                }
            };
            let report = records::get_monthly_report(state, user_id, year, month).await?;
            println!(
                "{year}-{month:02}: {} records, gross {}, pause {}, worked {}",
                report.records.len(),
                format_ms(report.gross_ms),
                format_ms(report.pause_ms),
                format_ms(report.working_ms)
            );
        }
        Command::Edit {
            id,
            start,
            end,
            pause_minutes,
        } => {
            let changes = RecordEdit::new(start, end, pause_minutes.saturating_mul(60_000));
            print_json(&records::edit_record(state, user_id, id, changes).await?);
        }
        Command::Delete { id } => {
            records::delete_record(state, user_id, id).await?;
            println!("deleted");
        }
        Command::Auto { mode } => {
            let settings = UserSettings {
                automatic_time_tracking: mode == "on",
            };
            state
                .settings()
                .update_user(user_id, settings)
                .map_err(|e| e.to_string())?;
            println!("automatic time tracking {mode}");
        }
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    config.debug |= args.debug;

    logging::init(config.debug);
    log::info!("Worktime starting up...");

    let state = if args.memory {
        AppState::new(
            Arc::new(MemoryStore::new()),
            SettingsStore::new(config.settings_path())?,
            Arc::new(SystemClock),
        )
    } else {
        worktime_lib::init(&config)?
    };

    let session = state.sign_in(args.user).await?;
    println!(
        "signed in as user {} (session {:?}); type `help` for commands",
        args.user,
        session.status().await
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                let _ = err.print();
                continue;
            }
        };

        match dispatch(&state, args.user, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => eprintln!("error: {message}"),
        }
    }

    if let Some(controller) = state.sessions().get(args.user).await {
        if controller.snapshot().await.state.is_active() {
            log::warn!("Exiting with an unsaved session for user {}", args.user);
        }
    }

    Ok(())
}
