mod commands;
mod input;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mindlog_core::config::MindLogConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use commands::Session;
use commands::edit::EditArgs;

#[derive(Parser)]
#[command(name = "mindlog")]
#[command(about = "Plan your day, answer a question a night, and export your schedule as .ics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a schedule event (prompts for anything missing when no title is given)
    Add {
        title: Option<String>,

        /// Day of the event (e.g. "2025-03-20", "tomorrow", "fri")
        #[arg(short, long)]
        date: Option<String>,

        /// Start time (e.g. "09:00", "9am"); omit for an all-day event
        #[arg(short, long)]
        start: Option<String>,

        /// End time or duration (e.g. "10:30", "45m")
        #[arg(short, long)]
        end: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Minutes before the start to remind you (1 = at the start)
        #[arg(short, long)]
        remind: Option<u32>,
    },
    /// Answer one of today's questions
    Diary {
        /// Your answer; prompted for when omitted
        text: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        /// Answer this question instead of one of the day's picks
        #[arg(short, long)]
        question: Option<String>,

        /// Mood color for the entry (e.g. "#E89F71")
        #[arg(short, long)]
        mood: Option<String>,
    },
    /// Show events for a day
    List {
        #[arg(short, long)]
        date: Option<String>,

        /// Number of days to show, starting at --date
        #[arg(long, default_value_t = 1)]
        days: u32,

        /// Print events as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an event (prompts for each field when no flags are given)
    Edit {
        /// Event id or a unique prefix of it
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        date: Option<String>,

        /// New start time, or "none" for all-day
        #[arg(short, long)]
        start: Option<String>,

        /// New end time or duration, or "none"
        #[arg(short, long)]
        end: Option<String>,

        /// New description, or "none"
        #[arg(long)]
        description: Option<String>,

        #[arg(short, long)]
        remind: Option<u32>,
    },
    /// Mark an event as done
    Done {
        id: String,

        /// Mark it as not done again
        #[arg(long)]
        undo: bool,
    },
    /// Delete an event and its reminder
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export schedule events to an .ics file
    Export {
        /// Directory to write into (defaults to the configured export_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove earlier exports from the directory first
        #[arg(long)]
        clean: bool,
    },
    /// Show the diary questions for a day
    Questions {
        #[arg(short, long)]
        date: Option<String>,

        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// List every question instead of the day's picks
        #[arg(long)]
        all: bool,
    },
    /// Show pending reminders
    Reminders {
        /// Only reminders whose time has come
        #[arg(long)]
        due: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Add { .. } => "add",
            Commands::Diary { .. } => "diary",
            Commands::List { .. } => "list",
            Commands::Edit { .. } => "edit",
            Commands::Done { .. } => "done",
            Commands::Delete { .. } => "delete",
            Commands::Export { .. } => "export",
            Commands::Questions { .. } => "questions",
            Commands::Reminders { .. } => "reminders",
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("MINDLOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = MindLogConfig::load()?;
    tracing::debug!(data_dir = %config.data_path().display(), "loaded config");
    let mut session = Session::open(config)?;

    tracing::debug!(command = cli.command.name(), "dispatching");

    match cli.command {
        Commands::Add {
            title,
            date,
            start,
            end,
            description,
            remind,
        } => commands::add::run(&mut session, title, date, start, end, description, remind),
        Commands::Diary {
            text,
            date,
            question,
            mood,
        } => commands::diary::run(&mut session, text, date, question, mood),
        Commands::List { date, days, json } => commands::list::run(&session, date, days, json),
        Commands::Edit {
            id,
            title,
            date,
            start,
            end,
            description,
            remind,
        } => commands::edit::run(
            &mut session,
            &id,
            EditArgs {
                title,
                date,
                start,
                end,
                description,
                remind,
            },
        ),
        Commands::Done { id, undo } => commands::done::run(&mut session, &id, undo),
        Commands::Delete { id, yes } => commands::delete::run(&mut session, &id, yes),
        Commands::Export { output, clean } => commands::export::run(&session, output, clean),
        Commands::Questions { date, count, all } => {
            commands::questions::run(&session, date, count, all)
        }
        Commands::Reminders { due } => commands::reminders::run(&session, due),
    }
}
