//! Reminder scheduling.
//!
//! Delivering notifications is somebody else's job; this module decides when
//! a reminder fires and talks to a [`ReminderScheduler`] that hands back an
//! opaque handle. The alarm encoder in [`crate::ics`] and the trigger
//! computation here share [`effective_offset_minutes`], so an exported
//! `TRIGGER` and a locally scheduled reminder always agree.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::AT_EVENT_TIME;
use crate::error::MindLogResult;
use crate::ics::format::{parse_date, parse_time};
use crate::timeline::TimelineEvent;

/// Reminder choices offered when creating or editing an event.
pub const REMINDER_OPTIONS: [(&str, u32); 6] = [
    ("None", 0),
    ("At event time", AT_EVENT_TIME),
    ("5 minutes before", 5),
    ("10 minutes before", 10),
    ("30 minutes before", 30),
    ("1 hour before", 60),
];

/// Minutes before the start that a reminder value actually means.
/// The "at event time" value maps to 0.
pub fn effective_offset_minutes(reminder_minutes: u32) -> u32 {
    if reminder_minutes == AT_EVENT_TIME {
        0
    } else {
        reminder_minutes
    }
}

/// The moment a reminder for an event at `date` `time` should fire.
pub fn reminder_trigger(date: &str, time: &str, reminder_minutes: u32) -> MindLogResult<NaiveDateTime> {
    let start = parse_date(date)?.and_time(parse_time(time)?);
    let offset = effective_offset_minutes(reminder_minutes);
    Ok(start - Duration::minutes(i64::from(offset)))
}

/// Opaque handle to a scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(String);

impl ReminderHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ReminderHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ReminderHandle> for String {
    fn from(handle: ReminderHandle) -> Self {
        handle.0
    }
}

/// Something that can fire a reminder at a point in time.
pub trait ReminderScheduler {
    fn schedule(
        &mut self,
        title: &str,
        body: &str,
        at: NaiveDateTime,
    ) -> MindLogResult<Option<ReminderHandle>>;

    /// Cancelling an unknown handle is not an error.
    fn cancel(&mut self, handle: &ReminderHandle) -> MindLogResult<()>;
}

/// Schedule the reminder an event asks for, if any.
///
/// Returns `None` for events without a reminder, all-day events, and
/// reminders whose trigger is not after `now`.
pub fn schedule_for(
    scheduler: &mut dyn ReminderScheduler,
    event: &TimelineEvent,
    now: NaiveDateTime,
) -> MindLogResult<Option<ReminderHandle>> {
    let Some(start) = event.start_time.as_deref() else {
        return Ok(None);
    };
    if event.reminder_minutes == 0 {
        return Ok(None);
    }

    let at = reminder_trigger(&event.date, start, event.reminder_minutes)?;
    if at <= now {
        tracing::warn!(event = %event.id, %at, "reminder time already passed, not scheduling");
        return Ok(None);
    }

    let body = match &event.description {
        Some(description) => description.clone(),
        None => format!("Starts at {}", start),
    };
    scheduler.schedule(&event.title, &body, at)
}

/// A reminder waiting to fire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub handle: ReminderHandle,
    pub title: String,
    pub body: String,
    pub at: NaiveDateTime,
}

/// Scheduler that records pending reminders in a JSON file.
#[derive(Debug)]
pub struct FileReminderScheduler {
    path: PathBuf,
    pending: Vec<PendingReminder>,
}

impl FileReminderScheduler {
    pub fn open(path: &Path) -> MindLogResult<Self> {
        let pending = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        } else {
            Vec::new()
        };

        Ok(FileReminderScheduler {
            path: path.to_path_buf(),
            pending,
        })
    }

    pub fn pending(&self) -> &[PendingReminder] {
        &self.pending
    }

    /// Reminders whose time has come.
    pub fn due(&self, now: NaiveDateTime) -> Vec<&PendingReminder> {
        self.pending.iter().filter(|r| r.at <= now).collect()
    }

    fn save(&self) -> MindLogResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.pending)?)?;
        Ok(())
    }
}

impl ReminderScheduler for FileReminderScheduler {
    fn schedule(
        &mut self,
        title: &str,
        body: &str,
        at: NaiveDateTime,
    ) -> MindLogResult<Option<ReminderHandle>> {
        let handle = ReminderHandle::new(uuid::Uuid::new_v4().to_string());
        self.pending.push(PendingReminder {
            handle: handle.clone(),
            title: title.to_string(),
            body: body.to_string(),
            at,
        });
        self.save()?;
        tracing::debug!(handle = handle.as_str(), %at, "scheduled reminder");
        Ok(Some(handle))
    }

    fn cancel(&mut self, handle: &ReminderHandle) -> MindLogResult<()> {
        let before = self.pending.len();
        self.pending.retain(|r| &r.handle != handle);
        if self.pending.len() != before {
            self.save()?;
            tracing::debug!(handle = handle.as_str(), "cancelled reminder");
        }
        Ok(())
    }
}
