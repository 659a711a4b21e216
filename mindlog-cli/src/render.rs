//! Terminal rendering for MindLog types.
//!
//! Extension traits that add colored output to mindlog-core types using
//! owo_colors.

use chrono::NaiveDate;
use mindlog_core::export::ExportResult;
use mindlog_core::question::{Question, QuestionCategory};
use mindlog_core::reminder::PendingReminder;
use mindlog_core::timeline::{EventKind, TimelineEvent};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

/// The first block of a UUID is enough to address an event from the CLI.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn time_range(event: &TimelineEvent) -> String {
    match (&event.start_time, &event.end_time) {
        (Some(start), Some(end)) => format!("{}-{}", start, end),
        (Some(start), None) => start.clone(),
        _ => "all-day".to_string(),
    }
}

impl Render for TimelineEvent {
    fn render(&self) -> String {
        let time = format!("{:>11}", time_range(self));
        let id = format!("[{}]", short_id(&self.id));

        match self.kind {
            EventKind::Diary => {
                let mut out = format!(
                    "  {} {} {} {}",
                    "      diary".magenta(),
                    "✎".magenta(),
                    self.title,
                    id.dimmed()
                );
                if let Some(content) = &self.diary_content {
                    for line in content.lines() {
                        out.push_str(&format!("\n                {}", line.italic()));
                    }
                }
                out
            }
            EventKind::Schedule if self.is_completed => format!(
                "  {} {} {} {}",
                time.dimmed(),
                "✓".green(),
                self.title.strikethrough().dimmed(),
                id.dimmed()
            ),
            EventKind::Schedule => {
                let bell = if self.reminder_minutes > 0 { " ⏰" } else { "" };
                format!("  {} • {}{} {}", time, self.title.bold(), bell, id.dimmed())
            }
        }
    }
}

impl Render for QuestionCategory {
    fn render(&self) -> String {
        let label = format!("[{}]", self);
        match self {
            QuestionCategory::SelfReflection => label.cyan().to_string(),
            QuestionCategory::Past => label.yellow().to_string(),
            QuestionCategory::Imagination => label.magenta().to_string(),
        }
    }
}

impl Render for Question {
    fn render(&self) -> String {
        format!("  {} {} {}", self.id.dimmed(), self.category.render(), self.text)
    }
}

impl Render for PendingReminder {
    fn render(&self) -> String {
        format!(
            "  {} {} {}",
            self.at.format("%a %b %-d %H:%M").to_string().bold(),
            self.title,
            self.body.dimmed()
        )
    }
}

impl Render for ExportResult {
    fn render(&self) -> String {
        match (&self.file_path, self.success) {
            (Some(path), true) => format!(
                "{}\n  {}",
                format!("  {}", self.message).green(),
                path.display().to_string().dimmed()
            ),
            _ => format!("  {}", self.message).red().to_string(),
        }
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}
