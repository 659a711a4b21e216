//! The application's view of an event.
//!
//! [`TimelineEvent`] is what the store persists and what the export path
//! serializes: flat, with `YYYY-MM-DD` / `HH:mm` strings and the extension
//! properties lifted into typed fields. It converts to and from the strict
//! [`IVEvent`] model; extension properties travel through one mapping table
//! ([`TimelineEvent::extension_value`] / [`TimelineEvent::set_extension`]) and
//! foreign ones are kept in `extra_props`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::constants::{AT_EVENT_TIME, UID_DOMAIN};
use crate::error::{MindLogError, MindLogResult};
use crate::event::{EventEnd, EventStatus, EventTime, IVAlarm, IVEvent, Trigger};
use crate::extension::Extension;
use crate::ics::format::{app_date, derive_uid, parse_date, parse_time};
use crate::question::QuestionCategory;
use crate::reminder::effective_offset_minutes;

/// What an entry is: a block of scheduled time or a diary page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Schedule,
    Diary,
}

impl EventKind {
    /// Value of the `X-MINDLOG-TYPE` property.
    pub fn as_tag(self) -> &'static str {
        match self {
            EventKind::Schedule => "SCHEDULE",
            EventKind::Diary => "DIARY",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "SCHEDULE" => Some(EventKind::Schedule),
            "DIARY" => Some(EventKind::Diary),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventKind::Schedule => write!(f, "schedule"),
            EventKind::Diary => write!(f, "diary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm`; absent for all-day entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    /// Minutes before start; 0 = no reminder, 1 = at event time
    #[serde(default)]
    pub reminder_minutes: u32,
    /// Handle of the scheduled local reminder, owned by the reminder scheduler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,

    // Diary fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_category: Option<QuestionCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diary_content: Option<String>,

    // Display metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunar_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunar_festival: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_of: Option<String>,

    #[serde(default)]
    pub sequence: u32,
    /// Extension properties MindLog does not understand
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_props: BTreeMap<String, String>,
}

impl TimelineEvent {
    pub fn new(
        id: impl Into<String>,
        kind: EventKind,
        date: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        TimelineEvent {
            id: id.into(),
            kind,
            date: date.into(),
            start_time: None,
            end_time: None,
            title: title.into(),
            description: None,
            is_completed: false,
            reminder_minutes: 0,
            notification_id: None,
            question_id: None,
            question_text: None,
            question_category: None,
            diary_content: None,
            mood_color: None,
            lunar_date: None,
            lunar_festival: None,
            conflict_of: None,
            sequence: 0,
            extra_props: BTreeMap::new(),
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.start_time.is_none()
    }

    /// Check the fields every formatter relies on.
    pub fn validate(&self) -> MindLogResult<()> {
        if self.id.trim().is_empty() {
            return Err(MindLogError::InvalidEvent("event id is empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(MindLogError::InvalidEvent(format!(
                "event '{}' has no title",
                self.id
            )));
        }
        parse_date(&self.date)?;
        if let Some(start) = &self.start_time {
            parse_time(start)?;
        }
        match (&self.start_time, &self.end_time) {
            (Some(_), Some(end)) => {
                parse_time(end)?;
            }
            (None, Some(_)) => {
                return Err(MindLogError::InvalidEvent(format!(
                    "event '{}' has an end time but no start time",
                    self.id
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Current value of a known extension field, as written on the wire.
    pub fn extension_value(&self, ext: Extension) -> Option<String> {
        match ext {
            Extension::Kind => Some(self.kind.as_tag().to_string()),
            Extension::QuestionId => self.question_id.clone(),
            Extension::QuestionText => self.question_text.clone(),
            Extension::QuestionCategory => self.question_category.map(|c| c.as_str().to_string()),
            Extension::DiaryContent => self.diary_content.clone(),
            Extension::LunarDate => self.lunar_date.clone(),
            Extension::LunarFestival => self.lunar_festival.clone(),
            Extension::MoodColor => self.mood_color.clone(),
            Extension::ConflictOf => self.conflict_of.clone(),
        }
    }

    /// Set a known extension field from its wire value.
    pub fn set_extension(&mut self, ext: Extension, value: &str) -> MindLogResult<()> {
        let text = Some(value.to_string());
        match ext {
            Extension::Kind => {
                self.kind = EventKind::from_tag(value).ok_or_else(|| {
                    MindLogError::InvalidEvent(format!("unknown event type '{}'", value))
                })?;
            }
            Extension::QuestionId => self.question_id = text,
            Extension::QuestionText => self.question_text = text,
            Extension::QuestionCategory => self.question_category = Some(value.parse()?),
            Extension::DiaryContent => self.diary_content = text,
            Extension::LunarDate => self.lunar_date = text,
            Extension::LunarFestival => self.lunar_festival = text,
            Extension::MoodColor => self.mood_color = text,
            Extension::ConflictOf => self.conflict_of = text,
        }
        Ok(())
    }

    /// Every extension property this event carries: known fields first, in
    /// registry order, then the foreign ones.
    pub fn encode_extensions(&self) -> Vec<(String, String)> {
        let known = Extension::ALL
            .into_iter()
            .filter_map(|ext| self.extension_value(ext).map(|v| (ext.key().to_string(), v)));
        let foreign = self
            .extra_props
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()));
        known.chain(foreign).collect()
    }

    /// Absorb extension properties. Known keys fill typed fields; unknown keys,
    /// and known keys whose value does not parse, are kept in `extra_props`.
    pub fn decode_extensions<'a>(&mut self, props: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (key, value) in props {
            let applied = match Extension::from_key(key) {
                Some(ext) => match self.set_extension(ext, value) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(event = %self.id, key = %key, "keeping unparsable extension: {e}");
                        false
                    }
                },
                None => false,
            };
            if !applied {
                self.extra_props.insert(key.clone(), value.clone());
            }
        }
    }

    /// Project a strict event into the application model.
    pub fn from_ivevent(event: &IVEvent) -> MindLogResult<Self> {
        let id = event
            .uid()
            .strip_suffix(&format!("@{}", UID_DOMAIN))
            .unwrap_or(event.uid());

        let mut timeline = TimelineEvent::new(
            id,
            EventKind::Schedule,
            app_date(event.dt_start.date()),
            event.summary.clone(),
        );

        timeline.start_time = event.dt_start.time().map(|t| t.format("%H:%M").to_string());
        timeline.end_time = match (&event.end, event.dt_start.naive()) {
            (Some(EventEnd::At(end)), Some(_)) => end.time().map(|t| t.format("%H:%M").to_string()),
            (Some(EventEnd::Duration { minutes }), Some(start)) => {
                let end = start + Duration::minutes(*minutes);
                Some(end.time().format("%H:%M").to_string())
            }
            _ => None,
        };
        timeline.description = event.description.clone();
        timeline.is_completed = event.status == Some(EventStatus::Completed);
        timeline.reminder_minutes = reminder_minutes_of(event);
        timeline.sequence = event.sequence();
        timeline.decode_extensions(&event.x_props);

        Ok(timeline)
    }

    /// Lift back into the strict model, stamped with `dt_stamp`.
    ///
    /// The end is only set when `end_time` is; the one-hour default end is
    /// an export concern, not part of the stored event.
    pub fn to_ivevent(&self, dt_stamp: NaiveDateTime) -> MindLogResult<IVEvent> {
        self.validate()?;

        let date = parse_date(&self.date)?;
        let dt_start = match &self.start_time {
            Some(start) => EventTime::Floating(date.and_time(parse_time(start)?)),
            None => EventTime::Date(date),
        };

        let mut event = IVEvent::new(derive_uid(&self.id), self.title.clone(), dt_start, dt_stamp)
            .with_sequence(self.sequence);

        if let Some(end) = &self.end_time {
            event.end = Some(EventEnd::At(EventTime::Floating(
                date.and_time(parse_time(end)?),
            )));
        }
        event.description = self.description.clone();
        event.status = Some(if self.is_completed {
            EventStatus::Completed
        } else {
            EventStatus::Confirmed
        });
        if self.reminder_minutes > 0 {
            event.alarms.push(IVAlarm::display(
                self.title.clone(),
                effective_offset_minutes(self.reminder_minutes),
            ));
        }
        event.x_props = self.encode_extensions().into_iter().collect();

        Ok(event)
    }
}

impl fmt::Display for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Minutes-before of the primary alarm. An alarm exactly at the start maps to
/// the "at event time" value; triggers after the start are not reminders.
fn reminder_minutes_of(event: &IVEvent) -> u32 {
    match event.primary_alarm().map(|a| &a.trigger) {
        Some(Trigger::Relative { minutes: 0 }) => AT_EVENT_TIME,
        Some(Trigger::Relative { minutes }) if *minutes < 0 => {
            u32::try_from(minutes.unsigned_abs()).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}
