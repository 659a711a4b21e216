use anyhow::Result;
use mindlog_core::ics::format::now_local;
use owo_colors::OwoColorize;

use super::Session;
use crate::render::Render;

pub fn run(session: &Session, due_only: bool) -> Result<()> {
    let now = now_local();
    let mut pending: Vec<_> = if due_only {
        session.reminders.due(now)
    } else {
        session.reminders.pending().iter().collect()
    };
    pending.sort_by_key(|r| r.at);

    if pending.is_empty() {
        println!("{}", "No pending reminders".dimmed());
        return Ok(());
    }

    for reminder in pending {
        let line = reminder.render();
        if reminder.at <= now {
            println!("{} {}", line, "(due)".yellow());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}
