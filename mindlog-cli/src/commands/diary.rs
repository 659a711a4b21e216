use anyhow::Result;
use dialoguer::{Input, Select};
use mindlog_core::ics::format::app_date;
use mindlog_core::store::NewEvent;
use owo_colors::OwoColorize;

use super::Session;
use crate::input;

pub fn run(
    session: &mut Session,
    text: Option<String>,
    date: Option<String>,
    question_id: Option<String>,
    mood: Option<String>,
) -> Result<()> {
    let date = match date {
        Some(d) => input::parse_date(&d)?,
        None => chrono::Local::now().date_naive(),
    };
    let bank = session.config.question_bank()?;

    // --- Question ---
    let question = match question_id {
        Some(id) => bank
            .by_id(&id)
            .ok_or_else(|| anyhow::anyhow!("No question with id '{}'", id))?,
        None => {
            let choices = bank.daily(date, session.config.daily_questions.max(1));
            let first = *choices
                .first()
                .ok_or_else(|| anyhow::anyhow!("The question set is empty"))?;
            if text.is_some() || choices.len() == 1 {
                first
            } else {
                let items: Vec<&str> = choices.iter().map(|q| q.text.as_str()).collect();
                let selection = Select::new()
                    .with_prompt("  Today's question")
                    .items(&items)
                    .default(0)
                    .interact()?;
                choices[selection]
            }
        }
    };

    // --- Answer ---
    let content = match text {
        Some(t) => t,
        None => {
            println!("  {}", question.text.bold());
            Input::<String>::new()
                .with_prompt("  Your answer")
                .interact_text()?
        }
    };

    if let Some(color) = &mood {
        if !is_hex_color(color) {
            anyhow::bail!("Mood color must look like #E89F71, got \"{}\"", color);
        }
    }

    let new = NewEvent {
        mood_color: mood,
        ..NewEvent::diary(app_date(date), question, content)
    };
    let entry = session.store.add(new)?;

    println!("{}", format!("  Saved diary entry for {}", entry.date).green());
    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#E89F71"));
        assert!(is_hex_color("#fff"));
        assert!(!is_hex_color("E89F71"));
        assert!(!is_hex_color("#E89F7"));
        assert!(!is_hex_color("#GGGGGG"));
    }
}
