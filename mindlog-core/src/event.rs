//! RFC 5545 event model.
//!
//! These types mirror VEVENT/VALARM/VCALENDAR closely and carry no UI
//! concerns. The application works with [`crate::timeline::TimelineEvent`],
//! a flattened projection of [`IVEvent`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{CALENDAR_NAME, PRODUCT_ID};

/// A VEVENT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IVEvent {
    uid: String,
    /// Timestamp of the revision this value describes (DTSTAMP)
    pub dt_stamp: NaiveDateTime,
    pub last_modified: Option<NaiveDateTime>,
    sequence: u32,

    pub dt_start: EventTime,
    /// DTEND or DURATION; `None` means the event has no defined end
    pub end: Option<EventEnd>,
    pub rrule: Option<String>,
    #[serde(default)]
    pub ex_dates: Vec<EventTime>,
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub transp: Transparency,

    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default)]
    pub alarms: Vec<IVAlarm>,

    /// Extension properties by name. Foreign entries are kept verbatim.
    #[serde(default)]
    pub x_props: BTreeMap<String, String>,
}

impl IVEvent {
    pub fn new(
        uid: impl Into<String>,
        summary: impl Into<String>,
        dt_start: EventTime,
        dt_stamp: NaiveDateTime,
    ) -> Self {
        IVEvent {
            uid: uid.into(),
            dt_stamp,
            last_modified: None,
            sequence: 0,
            dt_start,
            end: None,
            rrule: None,
            ex_dates: Vec::new(),
            status: None,
            transp: Transparency::Opaque,
            summary: summary.into(),
            description: None,
            location: None,
            categories: Vec::new(),
            alarms: Vec::new(),
            x_props: BTreeMap::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Raise SEQUENCE to at least `sequence`. Never lowers it.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = self.sequence.max(sequence);
        self
    }

    pub fn bump_sequence(&mut self) {
        self.sequence += 1;
    }

    /// Move the event. SEQUENCE is bumped only if start or end actually changed.
    pub fn reschedule(&mut self, dt_start: EventTime, end: Option<EventEnd>) {
        if self.dt_start != dt_start || self.end != end {
            self.dt_start = dt_start;
            self.end = end;
            self.bump_sequence();
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.dt_start.is_all_day()
    }

    /// The alarm the application treats as "the" reminder: the first DISPLAY
    /// alarm with a relative trigger, else the first relative alarm of any kind.
    pub fn primary_alarm(&self) -> Option<&IVAlarm> {
        let relative = |a: &&IVAlarm| matches!(a.trigger, Trigger::Relative { .. });
        self.alarms
            .iter()
            .filter(relative)
            .find(|a| a.action == AlarmAction::Display)
            .or_else(|| self.alarms.iter().find(relative))
    }
}

impl fmt::Display for IVEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// DTSTART/DTEND/EXDATE value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    /// VALUE=DATE, an all-day event
    Date(NaiveDate),
    /// Date-time with no zone, read in whatever zone the consumer is in
    Floating(NaiveDateTime),
    Utc(DateTime<Utc>),
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            EventTime::Floating(dt) => dt.date(),
            EventTime::Utc(dt) => dt.date_naive(),
        }
    }

    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            EventTime::Date(_) => None,
            EventTime::Floating(dt) => Some(dt.time()),
            EventTime::Utc(dt) => Some(dt.time()),
        }
    }

    /// Wall-clock reading of a timed value (UTC values are taken as-is).
    pub fn naive(&self) -> Option<NaiveDateTime> {
        match self {
            EventTime::Date(_) => None,
            EventTime::Floating(dt) => Some(*dt),
            EventTime::Utc(dt) => Some(dt.naive_utc()),
        }
    }

    /// The value as written after the property name's colon.
    pub fn to_ics_value(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
            EventTime::Floating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EventTime::Utc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::Floating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::Utc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

/// The authoritative end of an event: DTEND or DURATION, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventEnd {
    At(EventTime),
    Duration { minutes: i64 },
}

/// STATUS.
///
/// `Completed` is not a VEVENT status in RFC 5545. MindLog writes it
/// literally for finished schedule items and other consumers depend on the
/// string, so it is kept as a deliberate extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Tentative,
    Confirmed,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_ics_str(self) -> &'static str {
        match self {
            EventStatus::Tentative => "TENTATIVE",
            EventStatus::Confirmed => "CONFIRMED",
            EventStatus::Cancelled => "CANCELLED",
            EventStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TENTATIVE" => Some(EventStatus::Tentative),
            "CONFIRMED" => Some(EventStatus::Confirmed),
            "CANCELLED" => Some(EventStatus::Cancelled),
            "COMPLETED" => Some(EventStatus::Completed),
            _ => None,
        }
    }
}

/// Event transparency (busy/free status)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Transparency {
    /// Event blocks time on calendar (default)
    #[default]
    Opaque,
    /// Event does not block time (shows as free)
    Transparent,
}

impl Transparency {
    pub fn as_ics_str(self) -> &'static str {
        match self {
            Transparency::Opaque => "OPAQUE",
            Transparency::Transparent => "TRANSPARENT",
        }
    }
}

/// A VALARM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IVAlarm {
    pub action: AlarmAction,
    pub trigger: Trigger,
    pub description: Option<String>,
    /// Repeat interval, only meaningful together with `repeat`
    pub duration_minutes: Option<i64>,
    pub repeat: Option<u32>,
}

impl IVAlarm {
    /// A DISPLAY alarm `minutes_before` minutes ahead of the start.
    pub fn display(description: impl Into<String>, minutes_before: u32) -> Self {
        IVAlarm {
            action: AlarmAction::Display,
            trigger: Trigger::Relative {
                minutes: -i64::from(minutes_before),
            },
            description: Some(description.into()),
            duration_minutes: None,
            repeat: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmAction {
    Audio,
    Display,
    Email,
}

impl AlarmAction {
    pub fn as_ics_str(self) -> &'static str {
        match self {
            AlarmAction::Audio => "AUDIO",
            AlarmAction::Display => "DISPLAY",
            AlarmAction::Email => "EMAIL",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AUDIO" => Some(AlarmAction::Audio),
            "DISPLAY" => Some(AlarmAction::Display),
            "EMAIL" => Some(AlarmAction::Email),
            _ => None,
        }
    }
}

/// TRIGGER.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// Offset from the start; negative is before
    Relative { minutes: i64 },
    Absolute(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Publish,
    Request,
}

impl Method {
    pub fn as_ics_str(self) -> &'static str {
        match self {
            Method::Publish => "PUBLISH",
            Method::Request => "REQUEST",
        }
    }
}

/// A VCALENDAR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IVCalendar {
    pub prod_id: String,
    pub cal_scale: Option<String>,
    pub method: Option<Method>,
    /// Display name (X-WR-CALNAME)
    pub name: Option<String>,
    pub events: Vec<IVEvent>,
}

impl IVCalendar {
    pub const VERSION: &'static str = "2.0";

    pub fn new(events: Vec<IVEvent>) -> Self {
        IVCalendar {
            prod_id: PRODUCT_ID.to_string(),
            cal_scale: Some("GREGORIAN".to_string()),
            method: Some(Method::Publish),
            name: Some(CALENDAR_NAME.to_string()),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn floating(h: u32, m: u32) -> EventTime {
        EventTime::Floating(
            NaiveDate::from_ymd_opt(2024, 12, 14)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
        )
    }

    #[test]
    fn new_event_starts_at_sequence_zero() {
        let event = IVEvent::new("e1@mindlog.app", "Review", floating(9, 0), stamp());
        assert_eq!(event.sequence(), 0);
        assert_eq!(event.uid(), "e1@mindlog.app");
        assert!(!event.is_all_day());
    }

    #[test]
    fn reschedule_bumps_sequence_only_on_change() {
        let mut event = IVEvent::new("e1", "Review", floating(9, 0), stamp());

        event.reschedule(floating(9, 0), None);
        assert_eq!(event.sequence(), 0);

        event.reschedule(floating(10, 0), None);
        assert_eq!(event.sequence(), 1);

        event.reschedule(floating(10, 0), Some(EventEnd::Duration { minutes: 30 }));
        assert_eq!(event.sequence(), 2);
    }

    #[test]
    fn with_sequence_never_lowers() {
        let event = IVEvent::new("e1", "Review", floating(9, 0), stamp()).with_sequence(4);
        assert_eq!(event.with_sequence(2).sequence(), 4);
    }

    #[test]
    fn primary_alarm_prefers_relative_display() {
        let mut event = IVEvent::new("e1", "Review", floating(9, 0), stamp());
        event.alarms = vec![
            IVAlarm {
                action: AlarmAction::Audio,
                trigger: Trigger::Relative { minutes: -5 },
                description: None,
                duration_minutes: None,
                repeat: None,
            },
            IVAlarm {
                action: AlarmAction::Display,
                trigger: Trigger::Absolute(stamp().and_utc()),
                description: None,
                duration_minutes: None,
                repeat: None,
            },
            IVAlarm::display("Review", 30),
        ];

        let alarm = event.primary_alarm().unwrap();
        assert_eq!(alarm.trigger, Trigger::Relative { minutes: -30 });

        event.alarms.remove(2);
        let alarm = event.primary_alarm().unwrap();
        assert_eq!(alarm.action, AlarmAction::Audio);
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            EventStatus::Tentative,
            EventStatus::Confirmed,
            EventStatus::Cancelled,
            EventStatus::Completed,
        ] {
            assert_eq!(EventStatus::from_ics_str(status.as_ics_str()), Some(status));
        }
        assert_eq!(EventStatus::from_ics_str("NEEDS-ACTION"), None);
    }

    #[test]
    fn event_time_values() {
        let date = EventTime::Date(NaiveDate::from_ymd_opt(2024, 12, 14).unwrap());
        assert_eq!(date.to_ics_value(), "20241214");
        assert!(date.is_all_day());
        assert_eq!(date.time(), None);
        assert_eq!(floating(9, 30).to_ics_value(), "20241214T093000");
        assert_eq!(
            EventTime::Utc(stamp().and_utc()).to_ics_value(),
            "20241201T080000Z"
        );
    }
}
