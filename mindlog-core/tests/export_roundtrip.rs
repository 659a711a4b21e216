use chrono::NaiveDate;
use mindlog_core::export::{DirectorySink, cleanup_exported_files, export_events};
use mindlog_core::ics::parse_calendar;
use mindlog_core::question::QuestionBank;
use mindlog_core::reminder::FileReminderScheduler;
use mindlog_core::store::{EventStore, NewEvent};
use mindlog_core::{EventKind, TimelineEvent};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 14).unwrap()
}

fn seeded_store(dir: &std::path::Path) -> EventStore {
    let mut store = EventStore::open(&dir.join("mindlog-storage.json")).unwrap();

    store
        .add(NewEvent {
            start_time: Some("09:00".into()),
            end_time: Some("10:00".into()),
            reminder_minutes: 10,
            ..NewEvent::schedule("2024-12-14", "Morning Review")
        })
        .unwrap();
    store
        .add(NewEvent {
            start_time: Some("23:30".into()),
            description: Some("Stars, if the sky is clear; bring tea".into()),
            reminder_minutes: 1,
            ..NewEvent::schedule("2024-12-14", "Night walk")
        })
        .unwrap();

    let bank = QuestionBank::builtin();
    let question = bank.daily(today(), 1)[0];
    store
        .add(NewEvent::diary("2024-12-14", question, "A slow, good day"))
        .unwrap();

    store
}

#[test]
fn store_snapshot_exports_schedule_and_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path());
    let sink = DirectorySink::new(dir.path().join("exports"));

    let result = export_events(store.snapshot(), &sink, today());
    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Exported 2 events");

    let path = result.file_path.unwrap();
    assert_eq!(path.file_name().unwrap(), "MindLog_Schedule_2024-12-14.ics");

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("DTEND:20241214T003000\r\n"));
    assert!(contents.contains("TRIGGER:-PT0M\r\n"));
    assert!(contents.contains("TRIGGER:-PT10M\r\n"));
    assert!(!contents.contains("X-MINDLOG-TYPE:DIARY"));

    let calendar = parse_calendar(&contents).unwrap();
    let mut parsed: Vec<TimelineEvent> = calendar
        .events
        .iter()
        .map(|e| TimelineEvent::from_ivevent(e).unwrap())
        .collect();
    parsed.sort_by(|a, b| a.start_time.cmp(&b.start_time));

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].title, "Morning Review");
    assert_eq!(parsed[0].reminder_minutes, 10);
    assert_eq!(parsed[1].title, "Night walk");
    assert_eq!(
        parsed[1].description.as_deref(),
        Some("Stars, if the sky is clear; bring tea")
    );
    assert_eq!(parsed[1].reminder_minutes, 1);
    assert!(parsed.iter().all(|e| e.kind == EventKind::Schedule));

    // Stored ids come back once the UID domain is stripped.
    for event in &parsed {
        assert!(store.get(&event.id).is_some());
    }
}

#[test]
fn diary_only_store_has_nothing_to_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = EventStore::open(&dir.path().join("mindlog-storage.json")).unwrap();
    let bank = QuestionBank::builtin();
    store
        .add(NewEvent::diary("2024-12-14", &bank.all()[0], "Only words today"))
        .unwrap();

    let exports = dir.path().join("exports");
    let result = export_events(store.snapshot(), &DirectorySink::new(&exports), today());

    assert!(!result.success);
    assert_eq!(result.message, "Nothing to export");
    assert!(!exports.exists());
}

#[test]
fn cleanup_clears_previous_exports() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(dir.path());
    let exports = dir.path().join("exports");
    let sink = DirectorySink::new(&exports);

    export_events(store.snapshot(), &sink, today());
    export_events(store.snapshot(), &sink, today().succ_opt().unwrap());

    assert_eq!(cleanup_exported_files(&exports).unwrap(), 2);
    assert_eq!(std::fs::read_dir(&exports).unwrap().count(), 0);
}

#[test]
fn deleting_an_event_cancels_its_file_reminder() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = seeded_store(dir.path());
    let mut reminders = FileReminderScheduler::open(&dir.path().join("reminders.json")).unwrap();
    let early = today().and_hms_opt(6, 0, 0).unwrap();

    let ids: Vec<String> = store
        .snapshot()
        .iter()
        .filter(|e| e.kind == EventKind::Schedule)
        .map(|e| e.id.clone())
        .collect();
    for id in &ids {
        store.refresh_reminder(id, &mut reminders, early).unwrap();
    }
    assert_eq!(reminders.pending().len(), 2);

    store.delete(&ids[0], &mut reminders).unwrap();
    assert_eq!(reminders.pending().len(), 1);

    let reopened = FileReminderScheduler::open(&dir.path().join("reminders.json")).unwrap();
    assert_eq!(reopened.pending().len(), 1);
}
