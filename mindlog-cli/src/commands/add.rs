use anyhow::Result;
use dialoguer::{Input, Select};
use mindlog_core::ics::format::app_date;
use mindlog_core::reminder::REMINDER_OPTIONS;
use mindlog_core::store::NewEvent;
use owo_colors::OwoColorize;

use super::Session;
use crate::input::{self, format_time};

pub fn run(
    session: &mut Session,
    title: Option<String>,
    date: Option<String>,
    start: Option<String>,
    end: Option<String>,
    description: Option<String>,
    remind: Option<u32>,
) -> Result<()> {
    let interactive = title.is_none();

    // --- Title ---
    let title = match title {
        Some(t) => t,
        None => Input::<String>::new()
            .with_prompt("  Title")
            .interact_text()?,
    };

    // --- Date ---
    let date = match date {
        Some(d) => input::parse_date(&d)?,
        None if interactive => input::prompt_with_default("  Date", "today", input::parse_date)?,
        None => chrono::Local::now().date_naive(),
    };

    // --- Start / End ---
    let start_time = match start {
        Some(s) => Some(input::parse_time(&s)?),
        None if interactive => input::prompt_optional("  Start (all-day)", input::parse_time)?,
        None => None,
    };

    let end_time = match (end, start_time) {
        (Some(e), Some(s)) => Some(input::parse_end(&e, s)?),
        (Some(_), None) => anyhow::bail!("--end needs a --start time"),
        (None, Some(s)) if interactive => {
            input::prompt_optional("  End or duration (1 hour)", |e| input::parse_end(e, s))?
        }
        (None, _) => None,
    };

    // --- Reminder ---
    let reminder_minutes = match remind {
        Some(minutes) => minutes,
        None if interactive && start_time.is_some() => prompt_reminder(0)?,
        None => 0,
    };

    let new = NewEvent {
        start_time: start_time.map(format_time),
        end_time: end_time.map(format_time),
        description: description.filter(|d| !d.is_empty()),
        reminder_minutes,
        ..NewEvent::schedule(app_date(date), title)
    };

    let event = session.store.add(new)?;
    session.refresh_reminder(&event.id)?;

    if interactive {
        println!();
    }
    println!("{}", format!("  Added: {}", event.title).green());

    Ok(())
}

/// Choose one of the offered reminder settings.
pub fn prompt_reminder(current: u32) -> Result<u32> {
    let labels: Vec<&str> = REMINDER_OPTIONS.iter().map(|(label, _)| *label).collect();
    let default = REMINDER_OPTIONS
        .iter()
        .position(|(_, minutes)| *minutes == current)
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt("  Reminder")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(REMINDER_OPTIONS[selection].1)
}
