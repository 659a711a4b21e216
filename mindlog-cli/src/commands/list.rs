use anyhow::Result;
use chrono::{Duration, NaiveDate};
use mindlog_core::ics::format::app_date;
use owo_colors::OwoColorize;

use super::Session;
use crate::input;
use crate::render::{Render, date_label};

pub fn run(session: &Session, date: Option<String>, days: u32, json: bool) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let from = match date {
        Some(d) => input::parse_date(&d)?,
        None => today,
    };
    let dates: Vec<NaiveDate> = (0..days.max(1))
        .map(|offset| from + Duration::days(i64::from(offset)))
        .collect();

    if json {
        let events: Vec<_> = dates
            .iter()
            .flat_map(|d| session.store.events_on(&app_date(*d)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    let mut printed_any = false;
    for date in dates {
        let events = session.store.events_on(&app_date(date));
        if events.is_empty() {
            continue;
        }

        if printed_any {
            println!();
        }
        println!("{}", date_label(date, today).bold());
        for event in events {
            println!("{}", event.render());
        }
        printed_any = true;
    }

    if !printed_any {
        println!("{}", "No events found".dimmed());
    }

    Ok(())
}
