use anyhow::Result;
use dialoguer::Input;
use mindlog_core::ics::format::app_date;
use mindlog_core::store::EventPatch;
use mindlog_core::timeline::EventKind;
use owo_colors::OwoColorize;

use super::Session;
use super::add::prompt_reminder;
use crate::input::{self, format_time};

/// Values given on the command line. `none` clears an optional field.
pub struct EditArgs {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    pub remind: Option<u32>,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.description.is_none()
            && self.remind.is_none()
    }
}

fn clears(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

pub fn run(session: &mut Session, id: &str, args: EditArgs) -> Result<()> {
    let event = session.store.resolve(id)?.clone();

    let patch = if args.is_empty() {
        prompt_patch(&event)?
    } else {
        let start_time = match args.start.as_deref() {
            Some(s) if clears(s) => Some(None),
            Some(s) => Some(Some(format_time(input::parse_time(s)?))),
            None => None,
        };

        // An end is read relative to the start it will end up with.
        let effective_start = match &start_time {
            Some(start) => start.clone(),
            None => event.start_time.clone(),
        };
        let end_time = match args.end.as_deref() {
            Some(e) if clears(e) => Some(None),
            Some(e) => {
                let start = effective_start
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("Cannot set an end on an all-day event"))?;
                let start = input::parse_time(start)?;
                Some(Some(format_time(input::parse_end(e, start)?)))
            }
            // Going all-day drops the end too.
            None if start_time == Some(None) => Some(None),
            None => None,
        };

        EventPatch {
            title: args.title,
            date: args.date.map(|d| input::parse_date(&d).map(app_date)).transpose()?,
            start_time,
            end_time,
            description: args.description.map(|d| (!clears(&d)).then_some(d)),
            reminder_minutes: args.remind,
            ..Default::default()
        }
    };

    let updated = session.store.update(&event.id, patch)?;
    if updated.kind == EventKind::Schedule {
        session.refresh_reminder(&updated.id)?;
    }

    println!("{}", format!("  Updated: {}", updated.title).green());
    Ok(())
}

fn prompt_patch(event: &mindlog_core::TimelineEvent) -> Result<EventPatch> {
    let title: String = Input::new()
        .with_prompt("  Title")
        .default(event.title.clone())
        .interact_text()?;
    let date = input::prompt_with_default("  Date", &event.date, input::parse_date)?;

    if event.kind == EventKind::Diary {
        let content: String = Input::new()
            .with_prompt("  Entry")
            .default(event.diary_content.clone().unwrap_or_default())
            .interact_text()?;
        return Ok(EventPatch {
            title: Some(title),
            date: Some(app_date(date)),
            diary_content: Some(Some(content)),
            ..Default::default()
        });
    }

    let start_hint = event.start_time.as_deref().unwrap_or("all-day");
    let start = input::prompt_optional(&format!("  Start ({})", start_hint), input::parse_time)?
        .or_else(|| {
            event
                .start_time
                .as_deref()
                .and_then(|s| input::parse_time(s).ok())
        });

    let end = match start {
        Some(s) => {
            let end_hint = event.end_time.as_deref().unwrap_or("1 hour");
            input::prompt_optional(&format!("  End or duration ({})", end_hint), |e| {
                input::parse_end(e, s)
            })?
            .or_else(|| {
                event
                    .end_time
                    .as_deref()
                    .and_then(|e| input::parse_time(e).ok())
                    .filter(|e| *e >= s)
            })
        }
        None => None,
    };

    let reminder_minutes = if start.is_some() {
        prompt_reminder(event.reminder_minutes)?
    } else {
        0
    };

    Ok(EventPatch {
        title: Some(title),
        date: Some(app_date(date)),
        start_time: Some(start.map(format_time)),
        end_time: Some(end.map(format_time)),
        reminder_minutes: Some(reminder_minutes),
        ..Default::default()
    })
}
