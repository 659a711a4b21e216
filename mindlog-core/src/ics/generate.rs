//! ICS file generation.
//!
//! Output is written line by line rather than through a component builder
//! because consumers rely on the exact property order and on the
//! non-standard `STATUS:COMPLETED`. Every content line is folded at 75
//! octets and terminated with CRLF.

use chrono::NaiveDateTime;

use super::format::{
    add_minutes_wrapping, derive_uid, format_date_only, format_date_time,
    format_duration_minutes, format_timestamp, now_local,
};
use super::text::{escape_text, fold_line};
use crate::constants::{CALENDAR_NAME, DEFAULT_EVENT_MINUTES, PRODUCT_ID};
use crate::error::{MindLogError, MindLogResult};
use crate::event::{AlarmAction, EventEnd, EventTime, IVAlarm, IVCalendar, IVEvent, Transparency, Trigger};
use crate::extension::{Extension, Payload, verbatim_value};
use crate::reminder::effective_offset_minutes;
use crate::timeline::{EventKind, TimelineEvent};

/// Extension properties written for each kind of application event, in order.
const SCHEDULE_EXTENSIONS: &[Extension] = &[Extension::Kind];
const DIARY_EXTENSIONS: &[Extension] = &[
    Extension::Kind,
    Extension::QuestionId,
    Extension::DiaryContent,
    Extension::QuestionText,
    Extension::QuestionCategory,
    Extension::MoodColor,
    Extension::LunarDate,
    Extension::LunarFestival,
    Extension::ConflictOf,
];

/// Accumulates folded content lines.
#[derive(Default)]
struct ContentLines {
    lines: Vec<String>,
}

impl ContentLines {
    /// A property whose value is written as-is.
    fn push(&mut self, name: &str, value: &str) -> MindLogResult<()> {
        let value = verbatim_value(value)?;
        self.lines.push(fold_line(&format!("{}:{}", name, value)));
        Ok(())
    }

    /// A TEXT property, escaped before folding.
    fn push_text(&mut self, name: &str, text: &str) -> MindLogResult<()> {
        self.lines
            .push(fold_line(&format!("{}:{}", name, escape_text(text)?)));
        Ok(())
    }

    fn push_time(&mut self, name: &str, time: &EventTime) -> MindLogResult<()> {
        match time {
            EventTime::Date(_) => self.push(&format!("{};VALUE=DATE", name), &time.to_ics_value()),
            _ => self.push(name, &time.to_ics_value()),
        }
    }

    fn push_extension(&mut self, ext: Extension, value: &str) -> MindLogResult<()> {
        match ext.payload() {
            Payload::EscapedText => self.push_text(ext.key(), value),
            Payload::Category | Payload::Text | Payload::Color | Payload::UidRef => {
                self.push(ext.key(), value)
            }
        }
    }

    fn begin(&mut self, component: &str) {
        self.lines.push(format!("BEGIN:{}", component));
    }

    fn end(&mut self, component: &str) {
        self.lines.push(format!("END:{}", component));
    }

    fn append(&mut self, other: ContentLines) {
        self.lines.extend(other.lines);
    }

    fn finish(self) -> String {
        let mut output = String::with_capacity(self.lines.iter().map(|l| l.len() + 2).sum());
        for line in self.lines {
            output.push_str(&line);
            output.push_str("\r\n");
        }
        output
    }
}

/// Generate a calendar document from application events, stamped now.
///
/// Only `schedule` events are written; diary entries are not blocks of
/// time. Callers should treat an input with no schedule events as "nothing
/// to export" rather than publishing an empty calendar.
pub fn generate_ics(events: &[TimelineEvent]) -> MindLogResult<String> {
    generate_ics_at(events, now_local())
}

/// [`generate_ics`] with a fixed DTSTAMP shared by every event in the run.
pub fn generate_ics_at(events: &[TimelineEvent], dt_stamp: NaiveDateTime) -> MindLogResult<String> {
    let mut out = ContentLines::default();
    write_calendar_header(&mut out, PRODUCT_ID, Some("GREGORIAN"), Some("PUBLISH"), Some(CALENDAR_NAME))?;

    let mut written = 0;
    for event in events.iter().filter(|e| e.kind == EventKind::Schedule) {
        out.append(vevent_lines(event, dt_stamp)?);
        written += 1;
    }

    out.end("VCALENDAR");
    tracing::debug!(events = written, skipped = events.len() - written, "generated calendar");
    Ok(out.finish())
}

/// A single VEVENT block for an application event, of either kind.
pub fn generate_vevent(event: &TimelineEvent, dt_stamp: NaiveDateTime) -> MindLogResult<String> {
    Ok(vevent_lines(event, dt_stamp)?.finish())
}

fn write_calendar_header(
    out: &mut ContentLines,
    prod_id: &str,
    cal_scale: Option<&str>,
    method: Option<&str>,
    name: Option<&str>,
) -> MindLogResult<()> {
    out.begin("VCALENDAR");
    out.push("VERSION", IVCalendar::VERSION)?;
    out.push("PRODID", prod_id)?;
    if let Some(cal_scale) = cal_scale {
        out.push("CALSCALE", cal_scale)?;
    }
    if let Some(method) = method {
        out.push("METHOD", method)?;
    }
    if let Some(name) = name {
        out.push_text("X-WR-CALNAME", name)?;
    }
    Ok(())
}

fn vevent_lines(event: &TimelineEvent, dt_stamp: NaiveDateTime) -> MindLogResult<ContentLines> {
    event.validate()?;
    let mut out = ContentLines::default();

    out.begin("VEVENT");
    out.push("UID", &derive_uid(&event.id))?;
    out.push("DTSTAMP", &format_timestamp(dt_stamp))?;

    match &event.start_time {
        Some(start) => out.push("DTSTART", &format_date_time(&event.date, start)?)?,
        None => out.push("DTSTART;VALUE=DATE", &format_date_only(&event.date)?)?,
    }

    // A missing end defaults to one hour later on the same date, even when
    // that wraps past midnight (23:30 ends at 00:30 of the start date).
    match (&event.end_time, &event.start_time) {
        (Some(end), _) => out.push("DTEND", &format_date_time(&event.date, end)?)?,
        (None, Some(start)) => {
            let end = add_minutes_wrapping(start, DEFAULT_EVENT_MINUTES)?;
            out.push("DTEND", &format_date_time(&event.date, &end)?)?;
        }
        (None, None) => {}
    }

    out.push_text("SUMMARY", &event.title)?;
    if let Some(description) = non_empty(&event.description) {
        out.push_text("DESCRIPTION", description)?;
    }
    out.push(
        "STATUS",
        if event.is_completed { "COMPLETED" } else { "CONFIRMED" },
    )?;

    let extensions = match event.kind {
        EventKind::Schedule => SCHEDULE_EXTENSIONS,
        EventKind::Diary => DIARY_EXTENSIONS,
    };
    for &ext in extensions {
        if let Some(value) = event.extension_value(ext).filter(|v| !v.is_empty()) {
            out.push_extension(ext, &value)?;
        }
    }
    for (key, value) in event.extra_props.iter().filter(|(_, v)| !v.is_empty()) {
        if !is_x_name(key) {
            return Err(MindLogError::Encoding(format!(
                "{:?} is not an extension property name",
                key
            )));
        }
        out.push(key, value)?;
    }

    if event.reminder_minutes > 0 {
        out.begin("VALARM");
        out.push("ACTION", "DISPLAY")?;
        out.push_text("DESCRIPTION", &event.title)?;
        out.push(
            "TRIGGER",
            &format!("-PT{}M", effective_offset_minutes(event.reminder_minutes)),
        )?;
        out.end("VALARM");
    }

    out.end("VEVENT");
    Ok(out)
}

/// `X-` followed by letters, digits and dashes.
fn is_x_name(key: &str) -> bool {
    key.len() > 2
        && key[..2].eq_ignore_ascii_case("X-")
        && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Write a strict calendar model, including every alarm and extension
/// property, so parsed calendars can be written back out.
pub fn generate_calendar(calendar: &IVCalendar) -> MindLogResult<String> {
    let mut out = ContentLines::default();
    write_calendar_header(
        &mut out,
        &calendar.prod_id,
        calendar.cal_scale.as_deref(),
        calendar.method.map(|m| m.as_ics_str()),
        calendar.name.as_deref(),
    )?;

    for event in &calendar.events {
        write_ivevent(&mut out, event)?;
    }

    out.end("VCALENDAR");
    Ok(out.finish())
}

fn write_ivevent(out: &mut ContentLines, event: &IVEvent) -> MindLogResult<()> {
    out.begin("VEVENT");
    out.push("UID", event.uid())?;
    out.push("DTSTAMP", &format_timestamp(event.dt_stamp))?;
    if let Some(last_modified) = event.last_modified {
        out.push("LAST-MODIFIED", &format_timestamp(last_modified))?;
    }
    out.push("SEQUENCE", &event.sequence().to_string())?;

    out.push_time("DTSTART", &event.dt_start)?;
    match &event.end {
        Some(EventEnd::At(end)) => out.push_time("DTEND", end)?,
        Some(EventEnd::Duration { minutes }) => {
            out.push("DURATION", &format_duration_minutes(*minutes))?
        }
        None => {}
    }

    if let Some(rrule) = &event.rrule {
        out.push("RRULE", rrule)?;
    }
    for exdate in &event.ex_dates {
        out.push_time("EXDATE", exdate)?;
    }
    if let Some(status) = event.status {
        out.push("STATUS", status.as_ics_str())?;
    }
    if event.transp == Transparency::Transparent {
        out.push("TRANSP", event.transp.as_ics_str())?;
    }

    out.push_text("SUMMARY", &event.summary)?;
    if let Some(description) = &event.description {
        out.push_text("DESCRIPTION", description)?;
    }
    if let Some(location) = &event.location {
        out.push_text("LOCATION", location)?;
    }
    if !event.categories.is_empty() {
        let escaped = event
            .categories
            .iter()
            .map(|c| escape_text(c))
            .collect::<MindLogResult<Vec<_>>>()?;
        out.push("CATEGORIES", &escaped.join(","))?;
    }

    for (key, value) in &event.x_props {
        match Extension::from_key(key) {
            Some(ext) => out.push_extension(ext, value)?,
            None => out.push(key, value)?,
        }
    }

    for alarm in &event.alarms {
        write_alarm(out, alarm, &event.summary)?;
    }

    out.end("VEVENT");
    Ok(())
}

fn write_alarm(out: &mut ContentLines, alarm: &IVAlarm, summary: &str) -> MindLogResult<()> {
    out.begin("VALARM");
    out.push("ACTION", alarm.action.as_ics_str())?;
    match &alarm.trigger {
        Trigger::Relative { minutes } => out.push("TRIGGER", &format_duration_minutes(*minutes))?,
        Trigger::Absolute(at) => out.push(
            "TRIGGER;VALUE=DATE-TIME",
            &at.format("%Y%m%dT%H%M%SZ").to_string(),
        )?,
    }
    // DISPLAY alarms require a DESCRIPTION; fall back to the event summary.
    match (&alarm.description, alarm.action) {
        (Some(description), _) => out.push_text("DESCRIPTION", description)?,
        (None, AlarmAction::Display) => out.push_text("DESCRIPTION", summary)?,
        (None, _) => {}
    }
    if let (Some(repeat), Some(minutes)) = (alarm.repeat, alarm.duration_minutes) {
        out.push("DURATION", &format_duration_minutes(minutes))?;
        out.push("REPEAT", &repeat.to_string())?;
    }
    out.end("VALARM");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse_calendar;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(8, 30, 15)
            .unwrap()
    }

    fn schedule(id: &str, start: Option<&str>, end: Option<&str>) -> TimelineEvent {
        let mut event = TimelineEvent::new(id, EventKind::Schedule, "2024-12-14", "Morning Review");
        event.start_time = start.map(String::from);
        event.end_time = end.map(String::from);
        event
    }

    fn lines(ics: &str) -> Vec<&str> {
        ics.split("\r\n").filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn morning_review_scenario() {
        let mut event = schedule("e1", Some("09:00"), Some("10:00"));
        event.reminder_minutes = 10;

        let ics = generate_ics_at(&[event], stamp()).unwrap();

        assert_eq!(
            lines(&ics),
            vec![
                "BEGIN:VCALENDAR",
                "VERSION:2.0",
                "PRODID:-//MindLog//MindLog Calendar//EN",
                "CALSCALE:GREGORIAN",
                "METHOD:PUBLISH",
                "X-WR-CALNAME:MindLog Schedule",
                "BEGIN:VEVENT",
                "UID:e1@mindlog.app",
                "DTSTAMP:20241201T083015",
                "DTSTART:20241214T090000",
                "DTEND:20241214T100000",
                "SUMMARY:Morning Review",
                "STATUS:CONFIRMED",
                "X-MINDLOG-TYPE:SCHEDULE",
                "BEGIN:VALARM",
                "ACTION:DISPLAY",
                "DESCRIPTION:Morning Review",
                "TRIGGER:-PT10M",
                "END:VALARM",
                "END:VEVENT",
                "END:VCALENDAR",
            ]
        );
    }

    #[test]
    fn every_line_ends_with_crlf() {
        let ics = generate_ics_at(&[schedule("e1", Some("09:00"), None)], stamp()).unwrap();
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(!ics.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn missing_end_defaults_to_one_hour() {
        let ics = generate_ics_at(&[schedule("e1", Some("14:45"), None)], stamp()).unwrap();
        assert!(ics.contains("DTEND:20241214T154500\r\n"));
    }

    #[test]
    fn default_end_wraps_midnight_on_same_date() {
        let ics = generate_ics_at(&[schedule("e1", Some("23:30"), None)], stamp()).unwrap();
        assert!(ics.contains("DTSTART:20241214T233000\r\n"));
        assert!(ics.contains("DTEND:20241214T003000\r\n"));
    }

    #[test]
    fn all_day_event_uses_date_value_and_no_end() {
        let ics = generate_ics_at(&[schedule("e1", None, None)], stamp()).unwrap();
        assert!(ics.contains("DTSTART;VALUE=DATE:20241214\r\n"));
        assert!(!ics.contains("DTEND"));
    }

    #[test]
    fn reminder_encoding() {
        let encode = |minutes: u32| {
            let mut event = schedule("e1", Some("09:00"), None);
            event.reminder_minutes = minutes;
            generate_ics_at(&[event], stamp()).unwrap()
        };

        assert!(!encode(0).contains("BEGIN:VALARM"));
        assert!(encode(1).contains("TRIGGER:-PT0M\r\n"));
        assert!(encode(5).contains("TRIGGER:-PT5M\r\n"));
        assert!(encode(60).contains("TRIGGER:-PT60M\r\n"));
    }

    #[test]
    fn completed_events_use_completed_status() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.is_completed = true;
        let ics = generate_ics_at(&[event], stamp()).unwrap();
        assert!(ics.contains("STATUS:COMPLETED\r\n"));
        assert!(!ics.contains("STATUS:CONFIRMED"));
    }

    #[test]
    fn text_fields_are_escaped() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.title = "Lunch, then; plan\nnext".into();
        event.description = Some("C:\\notes".into());
        event.reminder_minutes = 5;

        let ics = generate_ics_at(&[event], stamp()).unwrap();
        assert!(ics.contains("SUMMARY:Lunch\\, then\\; plan\\nnext\r\n"));
        assert!(ics.contains("DESCRIPTION:C:\\\\notes\r\n"));
        // The alarm description carries the escaped title too.
        assert!(ics.contains("DESCRIPTION:Lunch\\, then\\; plan\\nnext\r\n"));
    }

    #[test]
    fn empty_description_is_omitted() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.description = Some(String::new());
        let ics = generate_ics_at(&[event], stamp()).unwrap();
        assert!(!ics.contains("DESCRIPTION"));
    }

    #[test]
    fn long_title_is_folded() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.title = "Quarterly planning session with the whole team and every stakeholder involved".into();

        let ics = generate_ics_at(&[event], stamp()).unwrap();
        let summary_start = ics.find("SUMMARY:").unwrap();
        let summary = &ics[summary_start..];
        let first = summary.split("\r\n").next().unwrap();
        let second = summary.split("\r\n").nth(1).unwrap();

        assert_eq!(first.len(), 75);
        assert!(second.starts_with(' ') && !second.starts_with("  "));
        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line too long: {line}");
        }
    }

    #[test]
    fn diary_events_are_skipped_in_documents() {
        let mut diary = TimelineEvent::new("d1", EventKind::Diary, "2024-12-14", "Evening");
        diary.diary_content = Some("Quiet day".into());
        let events = vec![schedule("e1", Some("09:00"), None), diary];

        let ics = generate_ics_at(&events, stamp()).unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert!(!ics.contains("d1@mindlog.app"));
        assert!(!ics.contains("X-MINDLOG-TYPE:DIARY"));
    }

    #[test]
    fn diary_vevent_carries_diary_fields() {
        let mut diary = TimelineEvent::new("d1", EventKind::Diary, "2024-12-14", "Evening");
        diary.question_id = Some("q007".into());
        diary.diary_content = Some("Called mum, cooked; tired".into());
        diary.mood_color = Some("#E89F71".into());

        let block = generate_vevent(&diary, stamp()).unwrap();
        let block_lines = lines(&block);
        let type_at = block_lines.iter().position(|l| *l == "X-MINDLOG-TYPE:DIARY").unwrap();
        assert_eq!(block_lines[type_at + 1], "X-MINDLOG-QUESTION-ID:q007");
        assert_eq!(
            block_lines[type_at + 2],
            "X-MINDLOG-DIARY-CONTENT:Called mum\\, cooked\\; tired"
        );
        assert!(block.contains("X-MINDLOG-MOOD-COLOR:#E89F71\r\n"));
    }

    #[test]
    fn schedule_vevent_carries_only_type_tag() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.mood_color = Some("#000000".into());
        let block = generate_vevent(&event, stamp()).unwrap();
        assert_eq!(block.matches("X-MINDLOG-").count(), 1);
    }

    #[test]
    fn foreign_properties_survive_export_and_reimport() {
        let mut event = schedule("e1", Some("09:00"), None);
        event
            .extra_props
            .insert("X-OTHERAPP-COLOR".into(), "teal".into());

        let block = generate_vevent(&event, stamp()).unwrap();
        assert!(block.contains("X-MINDLOG-TYPE:SCHEDULE\r\nX-OTHERAPP-COLOR:teal\r\n"));

        let calendar = parse_calendar(&generate_ics_at(&[event], stamp()).unwrap()).unwrap();
        let back = TimelineEvent::from_ivevent(&calendar.events[0]).unwrap();
        assert_eq!(back.extra_props.get("X-OTHERAPP-COLOR").map(String::as_str), Some("teal"));
    }

    #[test]
    fn foreign_property_with_bad_name_or_value_aborts() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.extra_props.insert("SUMMARY".into(), "x".into());
        assert!(matches!(generate_vevent(&event, stamp()), Err(MindLogError::Encoding(_))));

        let mut event = schedule("e1", Some("09:00"), None);
        event.extra_props.insert("X-OTHERAPP-NOTE".into(), "two\nlines".into());
        assert!(matches!(generate_vevent(&event, stamp()), Err(MindLogError::Encoding(_))));
    }

    #[test]
    fn end_without_start_is_rejected() {
        let event = schedule("e1", None, Some("10:00"));
        assert!(matches!(
            generate_ics_at(&[event], stamp()),
            Err(MindLogError::InvalidEvent(_))
        ));
    }

    #[test]
    fn malformed_date_aborts_whole_document() {
        let good = schedule("e1", Some("09:00"), None);
        let mut bad = schedule("e2", Some("9:00"), None);
        bad.date = "14/12/2024".into();

        let err = generate_ics_at(&[good, bad], stamp()).unwrap_err();
        assert!(matches!(err, MindLogError::Format(_)));
    }

    #[test]
    fn unrepresentable_text_aborts() {
        let mut event = schedule("e1", Some("09:00"), None);
        event.title = "bad\rtitle".into();
        assert!(matches!(
            generate_ics_at(&[event], stamp()),
            Err(MindLogError::Encoding(_))
        ));
    }

    #[test]
    fn empty_input_still_produces_a_calendar() {
        let ics = generate_ics_at(&[], stamp()).unwrap();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }

    #[test]
    fn generate_calendar_writes_strict_model() {
        let mut event = schedule("e1", Some("09:00"), Some("09:30"))
            .to_ivevent(stamp())
            .unwrap();
        event.location = Some("Room 4, floor 2".into());
        event.categories = vec!["work".into(), "review".into()];
        event.transp = Transparency::Transparent;
        event.rrule = Some("FREQ=WEEKLY;BYDAY=SA".into());
        event.x_props.insert("X-OTHERAPP-FLAG".into(), "1".into());

        let ics = generate_calendar(&IVCalendar::new(vec![event])).unwrap();
        assert!(ics.contains("SEQUENCE:0\r\n"));
        assert!(ics.contains("DTEND:20241214T093000\r\n"));
        assert!(ics.contains("LOCATION:Room 4\\, floor 2\r\n"));
        assert!(ics.contains("CATEGORIES:work,review\r\n"));
        assert!(ics.contains("TRANSP:TRANSPARENT\r\n"));
        assert!(ics.contains("RRULE:FREQ=WEEKLY;BYDAY=SA\r\n"));
        assert!(ics.contains("X-OTHERAPP-FLAG:1\r\n"));
        assert!(ics.contains("STATUS:CONFIRMED\r\n"));
    }
}
