pub mod add;
pub mod delete;
pub mod diary;
pub mod done;
pub mod edit;
pub mod export;
pub mod list;
pub mod questions;
pub mod reminders;

use anyhow::Result;
use mindlog_core::config::MindLogConfig;
use mindlog_core::ics::format::now_local;
use mindlog_core::reminder::FileReminderScheduler;
use mindlog_core::store::EventStore;
use owo_colors::OwoColorize;

/// Everything a command works on, opened from the configured data directory.
pub struct Session {
    pub config: MindLogConfig,
    pub store: EventStore,
    pub reminders: FileReminderScheduler,
}

impl Session {
    pub fn open(config: MindLogConfig) -> Result<Self> {
        let store = EventStore::open(&config.storage_path())?;
        let reminders = FileReminderScheduler::open(&config.reminders_path())?;
        Ok(Session {
            config,
            store,
            reminders,
        })
    }

    /// Reschedule the event's reminder and tell the user when it could not be set.
    pub fn refresh_reminder(&mut self, id: &str) -> Result<()> {
        let handle = self
            .store
            .refresh_reminder(id, &mut self.reminders, now_local())?;

        let wants_reminder = self
            .store
            .get(id)
            .is_some_and(|e| e.reminder_minutes > 0 && e.start_time.is_some() && !e.is_completed);
        if wants_reminder && handle.is_none() {
            println!("{}", "  Reminder time has already passed, no reminder set".dimmed());
        }
        Ok(())
    }
}
