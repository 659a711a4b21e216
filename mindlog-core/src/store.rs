//! Event storage.
//!
//! All events live in one JSON file, `{ "events": [...] }`. The store is
//! owned by its caller and passed where needed; nothing here is global.
//! Every mutation is written through to disk before it returns.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{MindLogError, MindLogResult};
use crate::question::{Question, QuestionCategory};
use crate::reminder::{ReminderHandle, ReminderScheduler, schedule_for};
use crate::timeline::{EventKind, TimelineEvent};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageFile {
    #[serde(default)]
    events: Vec<TimelineEvent>,
}

/// Fields for a new event. The store assigns the id.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub kind: EventKind,
    pub date: String,
    pub title: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub reminder_minutes: u32,
    pub question_id: Option<String>,
    pub question_text: Option<String>,
    pub question_category: Option<QuestionCategory>,
    pub diary_content: Option<String>,
    pub mood_color: Option<String>,
}

impl NewEvent {
    pub fn schedule(date: impl Into<String>, title: impl Into<String>) -> Self {
        NewEvent {
            kind: EventKind::Schedule,
            date: date.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// A diary entry answering `question`.
    pub fn diary(date: impl Into<String>, question: &Question, content: impl Into<String>) -> Self {
        NewEvent {
            kind: EventKind::Diary,
            date: date.into(),
            title: question.text.clone(),
            question_id: Some(question.id.clone()),
            question_text: Some(question.text.clone()),
            question_category: Some(question.category),
            diary_content: Some(content.into()),
            ..Default::default()
        }
    }

    fn into_event(self, id: String) -> TimelineEvent {
        let mut event = TimelineEvent::new(id, self.kind, self.date, self.title);
        event.start_time = self.start_time;
        event.end_time = self.end_time;
        event.description = self.description;
        event.reminder_minutes = self.reminder_minutes;
        event.question_id = self.question_id;
        event.question_text = self.question_text;
        event.question_category = self.question_category;
        event.diary_content = self.diary_content;
        event.mood_color = self.mood_color;
        event
    }
}

/// Changes to an existing event. `None` leaves a field alone; for optional
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub date: Option<String>,
    pub title: Option<String>,
    pub start_time: Option<Option<String>>,
    pub end_time: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub reminder_minutes: Option<u32>,
    pub diary_content: Option<Option<String>>,
    pub mood_color: Option<Option<String>>,
}

impl EventPatch {
    fn apply(self, event: &mut TimelineEvent) {
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(is_completed) = self.is_completed {
            event.is_completed = is_completed;
        }
        if let Some(reminder_minutes) = self.reminder_minutes {
            event.reminder_minutes = reminder_minutes;
        }
        if let Some(diary_content) = self.diary_content {
            event.diary_content = diary_content;
        }
        if let Some(mood_color) = self.mood_color {
            event.mood_color = mood_color;
        }
    }
}

#[derive(Debug)]
pub struct EventStore {
    path: PathBuf,
    events: Vec<TimelineEvent>,
}

impl EventStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> MindLogResult<Self> {
        let file = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        } else {
            StorageFile::default()
        };

        tracing::debug!(path = %path.display(), events = file.events.len(), "opened event store");
        Ok(EventStore {
            path: path.to_path_buf(),
            events: file.events,
        })
    }

    pub fn save(&self) -> MindLogResult<()> {
        self.write(&self.events)
    }

    /// Write `events` to disk and only then make them the store's contents,
    /// so a failed write leaves memory matching the file.
    fn commit(&mut self, events: Vec<TimelineEvent>) -> MindLogResult<()> {
        self.write(&events)?;
        self.events = events;
        Ok(())
    }

    fn write(&self, events: &[TimelineEvent]) -> MindLogResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        #[derive(Serialize)]
        struct StorageRef<'a> {
            events: &'a [TimelineEvent],
        }

        let contents = serde_json::to_string_pretty(&StorageRef { events })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Validate and store a new event under a fresh id.
    pub fn add(&mut self, new: NewEvent) -> MindLogResult<TimelineEvent> {
        let event = new.into_event(uuid::Uuid::new_v4().to_string());
        event.validate()?;

        let mut events = self.events.clone();
        events.push(event.clone());
        self.commit(events)?;
        tracing::info!(id = %event.id, kind = %event.kind, date = %event.date, "added event");
        Ok(event)
    }

    pub fn get(&self, id: &str) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Look an event up by its id or a unique prefix of it.
    pub fn resolve(&self, id_or_prefix: &str) -> MindLogResult<&TimelineEvent> {
        if let Some(event) = self.get(id_or_prefix) {
            return Ok(event);
        }
        if id_or_prefix.is_empty() {
            return Err(MindLogError::EventNotFound(String::new()));
        }

        let mut matches = self.events.iter().filter(|e| e.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(event), None) => Ok(event),
            (Some(_), Some(_)) => Err(MindLogError::InvalidEvent(format!(
                "'{}' matches more than one event",
                id_or_prefix
            ))),
            (None, _) => Err(MindLogError::EventNotFound(id_or_prefix.to_string())),
        }
    }

    /// Apply `patch`. A change to the date or times raises the sequence
    /// number. The patched event must still validate.
    pub fn update(&mut self, id: &str, patch: EventPatch) -> MindLogResult<TimelineEvent> {
        let index = self.index_of(id)?;
        let current = &self.events[index];

        let mut updated = current.clone();
        patch.apply(&mut updated);
        updated.validate()?;

        if updated.date != current.date
            || updated.start_time != current.start_time
            || updated.end_time != current.end_time
        {
            updated.sequence += 1;
        }

        let mut events = self.events.clone();
        events[index] = updated.clone();
        self.commit(events)?;
        tracing::info!(id = %updated.id, sequence = updated.sequence, "updated event");
        Ok(updated)
    }

    /// Replace the event's reminder: cancel the old one, then schedule a new
    /// one unless the event is completed or has no reminder.
    pub fn refresh_reminder(
        &mut self,
        id: &str,
        scheduler: &mut dyn ReminderScheduler,
        now: NaiveDateTime,
    ) -> MindLogResult<Option<ReminderHandle>> {
        let index = self.index_of(id)?;
        let mut events = self.events.clone();

        if let Some(old) = events[index].notification_id.take() {
            scheduler.cancel(&ReminderHandle::new(old))?;
        }

        let handle = if events[index].is_completed {
            None
        } else {
            schedule_for(scheduler, &events[index], now)?
        };

        events[index].notification_id = handle.clone().map(String::from);
        self.commit(events)?;
        Ok(handle)
    }

    /// Remove an event, cancelling its reminder first.
    pub fn delete(
        &mut self,
        id: &str,
        scheduler: &mut dyn ReminderScheduler,
    ) -> MindLogResult<TimelineEvent> {
        let index = self.index_of(id)?;

        if let Some(handle) = &self.events[index].notification_id {
            scheduler.cancel(&ReminderHandle::new(handle.clone()))?;
        }

        let mut events = self.events.clone();
        let removed = events.remove(index);
        self.commit(events)?;
        tracing::info!(id = %removed.id, "deleted event");
        Ok(removed)
    }

    /// Events on `date` (`YYYY-MM-DD`): all-day entries first, then by start time.
    pub fn events_on(&self, date: &str) -> Vec<&TimelineEvent> {
        let mut events: Vec<&TimelineEvent> =
            self.events.iter().filter(|e| e.date == date).collect();
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        events
    }

    /// Every stored event, as an immutable snapshot for export.
    pub fn snapshot(&self) -> &[TimelineEvent] {
        &self.events
    }

    fn index_of(&self, id: &str) -> MindLogResult<usize> {
        self.events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| MindLogError::EventNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Default)]
    struct RecordingScheduler {
        scheduled: Vec<NaiveDateTime>,
        cancelled: Vec<ReminderHandle>,
    }

    impl ReminderScheduler for RecordingScheduler {
        fn schedule(
            &mut self,
            _title: &str,
            _body: &str,
            at: NaiveDateTime,
        ) -> MindLogResult<Option<ReminderHandle>> {
            self.scheduled.push(at);
            Ok(Some(ReminderHandle::new(format!("r{}", self.scheduled.len()))))
        }

        fn cancel(&mut self, handle: &ReminderHandle) -> MindLogResult<()> {
            self.cancelled.push(handle.clone());
            Ok(())
        }
    }

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 14)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn review() -> NewEvent {
        NewEvent {
            start_time: Some("09:00".into()),
            end_time: Some("10:00".into()),
            reminder_minutes: 10,
            ..NewEvent::schedule("2024-12-14", "Morning Review")
        }
    }

    fn store() -> (tempfile::TempDir, EventStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(&dir.path().join("mindlog-storage.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn add_persists_and_assigns_id() {
        let (dir, mut store) = store();
        let event = store.add(review()).unwrap();
        assert!(!event.id.is_empty());

        let reopened = EventStore::open(&dir.path().join("mindlog-storage.json")).unwrap();
        assert_eq!(reopened.get(&event.id), Some(&event));

        let raw = std::fs::read_to_string(dir.path().join("mindlog-storage.json")).unwrap();
        assert!(raw.contains("\"events\""));
        assert!(raw.contains("\"startTime\": \"09:00\""));
    }

    #[test]
    fn add_rejects_invalid_events() {
        let (_dir, mut store) = store();
        let err = store
            .add(NewEvent {
                start_time: Some("9am".into()),
                ..NewEvent::schedule("2024-12-14", "Broken")
            })
            .unwrap_err();
        assert!(matches!(err, MindLogError::Format(_)));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn rescheduling_bumps_sequence() {
        let (_dir, mut store) = store();
        let id = store.add(review()).unwrap().id;

        let renamed = store
            .update(&id, EventPatch { title: Some("Review".into()), ..Default::default() })
            .unwrap();
        assert_eq!(renamed.sequence, 0);

        let moved = store
            .update(&id, EventPatch { start_time: Some(Some("09:30".into())), ..Default::default() })
            .unwrap();
        assert_eq!(moved.sequence, 1);
    }

    #[test]
    fn invalid_patch_leaves_event_untouched() {
        let (_dir, mut store) = store();
        let event = store.add(review()).unwrap();

        let result = store.update(
            &event.id,
            EventPatch { start_time: Some(None), ..Default::default() },
        );
        assert!(matches!(result, Err(MindLogError::InvalidEvent(_))));
        assert_eq!(store.get(&event.id), Some(&event));
    }

    #[test]
    fn delete_cancels_reminder_first() {
        let (_dir, mut store) = store();
        let mut scheduler = RecordingScheduler::default();
        let id = store.add(review()).unwrap().id;

        let handle = store.refresh_reminder(&id, &mut scheduler, morning()).unwrap();
        assert_eq!(handle, Some(ReminderHandle::new("r1")));

        store.delete(&id, &mut scheduler).unwrap();
        assert_eq!(scheduler.cancelled, vec![ReminderHandle::new("r1")]);
        assert!(store.get(&id).is_none());
        assert!(matches!(
            store.delete(&id, &mut scheduler),
            Err(MindLogError::EventNotFound(_))
        ));
    }

    #[test]
    fn completing_an_event_drops_its_reminder() {
        let (_dir, mut store) = store();
        let mut scheduler = RecordingScheduler::default();
        let id = store.add(review()).unwrap().id;
        store.refresh_reminder(&id, &mut scheduler, morning()).unwrap();

        store
            .update(&id, EventPatch { is_completed: Some(true), ..Default::default() })
            .unwrap();
        let handle = store.refresh_reminder(&id, &mut scheduler, morning()).unwrap();

        assert_eq!(handle, None);
        assert_eq!(scheduler.cancelled.len(), 1);
        assert_eq!(store.get(&id).unwrap().notification_id, None);
    }

    #[test]
    fn events_on_sorts_all_day_first() {
        let (_dir, mut store) = store();
        store.add(review()).unwrap();
        store.add(NewEvent::schedule("2024-12-14", "Holiday")).unwrap();
        store
            .add(NewEvent {
                start_time: Some("07:15".into()),
                ..NewEvent::schedule("2024-12-14", "Run")
            })
            .unwrap();
        store.add(NewEvent::schedule("2024-12-15", "Tomorrow")).unwrap();

        let titles: Vec<_> = store
            .events_on("2024-12-14")
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Holiday", "Run", "Morning Review"]);
    }

    #[test]
    fn resolve_accepts_unique_prefix() {
        let (_dir, mut store) = store();
        let event = store.add(review()).unwrap();
        assert_eq!(store.resolve(&event.id[..8]).unwrap().id, event.id);
        assert!(matches!(
            store.resolve("zzzz"),
            Err(MindLogError::EventNotFound(_))
        ));
    }

    #[test]
    fn diary_entries_carry_their_question() {
        let (_dir, mut store) = store();
        let question = Question {
            id: "q001".into(),
            text: "What made you smile today?".into(),
            category: QuestionCategory::SelfReflection,
        };

        let entry = store
            .add(NewEvent::diary("2024-12-14", &question, "The dog"))
            .unwrap();
        assert_eq!(entry.kind, EventKind::Diary);
        assert_eq!(entry.question_id.as_deref(), Some("q001"));
        assert_eq!(entry.title, "What made you smile today?");
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut store = EventStore::open(&blocker.join("mindlog-storage.json")).unwrap();
        assert!(store.add(review()).is_err());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn failed_update_and_delete_keep_the_stored_event() {
        let (dir, mut store) = store();
        let event = store.add(review()).unwrap();

        // A directory where the file should be makes the final rename fail.
        let path = dir.path().join("mindlog-storage.json");
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let patch = EventPatch {
            title: Some("Evening Review".into()),
            ..EventPatch::default()
        };
        assert!(store.update(&event.id, patch).is_err());
        assert_eq!(store.get(&event.id), Some(&event));

        let mut scheduler = RecordingScheduler::default();
        assert!(store.delete(&event.id, &mut scheduler).is_err());
        assert_eq!(store.snapshot().len(), 1);
    }
}
