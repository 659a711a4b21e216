//! Reading dates, times and durations typed by the user.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use dialoguer::Input;
use owo_colors::OwoColorize;

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    lower_words(input)
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| full.to_string())
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lower_words(input: &str) -> impl Iterator<Item = String> + '_ {
    input.split_whitespace().map(str::to_lowercase)
}

/// `2024-12-14`, or anything fuzzydate understands ("tomorrow", "fri").
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }
    let dt = fuzzydate::parse(&expand_abbreviations(input))
        .map_err(|_| anyhow::anyhow!("Could not parse date: \"{}\"", input))?;
    Ok(dt.date())
}

/// `09:00`, or a loose time such as "9am" or "noon".
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    if let Ok(time) = NaiveTime::parse_from_str(input.trim(), "%H:%M") {
        return Ok(time);
    }
    let dt = fuzzydate::parse(&format!("today {}", expand_abbreviations(input)))
        .map_err(|_| anyhow::anyhow!("Could not parse time: \"{}\"", input))?;
    Ok(dt.time())
}

/// An end given either as a time or as a duration after `start` ("45m").
/// The end has to fall on the same day.
pub fn parse_end(input: &str, start: NaiveTime) -> Result<NaiveTime> {
    let end = match try_apply_duration(start, input) {
        Ok(end) => end,
        Err(_) => {
            let cleaned = input
                .strip_prefix("until ")
                .or_else(|| input.strip_prefix("to "))
                .unwrap_or(input);
            parse_time(cleaned)?
        }
    };

    if end < start {
        anyhow::bail!("End time {} is before the start {}", format_time(end), format_time(start));
    }
    Ok(end)
}

fn try_apply_duration(start: NaiveTime, input: &str) -> Result<NaiveTime> {
    let std_dur = humantime::parse_duration(input).map_err(|e| anyhow::anyhow!("{}", e))?;
    let chrono_dur = Duration::from_std(std_dur).context("Duration too large")?;

    let (end, wrapped) = start.overflowing_add_signed(chrono_dur);
    if wrapped != 0 {
        anyhow::bail!("\"{}\" runs past midnight", input);
    }
    Ok(end)
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Prompt until the answer parses. An empty answer yields `None`.
pub fn prompt_optional<T, F>(prompt: &str, parse: F) -> Result<Option<T>>
where
    F: Fn(&str) -> Result<T>,
{
    loop {
        let input: String = Input::new()
            .with_prompt(prompt)
            .default(String::new())
            .show_default(false)
            .interact_text()?;
        if input.trim().is_empty() {
            return Ok(None);
        }
        match parse(&input) {
            Ok(result) => return Ok(Some(result)),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}

/// Prompt with a default until the answer parses.
pub fn prompt_with_default<T, F>(prompt: &str, default: &str, parse: F) -> Result<T>
where
    F: Fn(&str) -> Result<T>,
{
    loop {
        let input: String = Input::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .interact_text()?;
        match parse(&input) {
            Ok(result) => return Ok(result),
            Err(e) => eprintln!("  {}", e.to_string().red()),
        }
    }
}
