use anyhow::Result;
use owo_colors::OwoColorize;

use super::Session;
use crate::input;
use crate::render::{Render, date_label};

pub fn run(session: &Session, date: Option<String>, count: Option<usize>, all: bool) -> Result<()> {
    let bank = session.config.question_bank()?;

    if all {
        for question in bank.all() {
            println!("{}", question.render());
        }
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let date = match date {
        Some(d) => input::parse_date(&d)?,
        None => today,
    };
    let count = count.unwrap_or(session.config.daily_questions);

    println!("{}", format!("Questions for {}", date_label(date, today)).bold());
    for question in bank.daily(date, count) {
        println!("{}", question.render());
    }
    Ok(())
}
