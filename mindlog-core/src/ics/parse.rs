//! ICS file parsing using the icalendar crate's parser.

use chrono::NaiveDateTime;
use icalendar::parser::{Component, Property, read_calendar, unfold};

use super::format::{parse_compact_date, parse_compact_date_time, parse_duration_minutes};
use super::text::unescape_text;
use crate::error::{MindLogError, MindLogResult};
use crate::event::{
    AlarmAction, EventEnd, EventStatus, EventTime, IVAlarm, IVCalendar, IVEvent, Method,
    Transparency, Trigger,
};
use crate::extension::{Extension, Payload, is_extension_key};

/// Parse a whole VCALENDAR document.
///
/// Events missing a UID or DTSTART are skipped with a warning; anything
/// that is not a calendar at all is an error.
pub fn parse_calendar(content: &str) -> MindLogResult<IVCalendar> {
    let unfolded = unfold(content);
    if !unfolded
        .lines()
        .any(|l| l.trim_end().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(MindLogError::IcsParse("missing BEGIN:VCALENDAR".into()));
    }

    let parsed = read_calendar(&unfolded).map_err(|e| MindLogError::IcsParse(e.to_string()))?;

    // Depending on the input the parser may or may not unwrap the VCALENDAR
    // root; accept both shapes.
    let components: &[Component] = match parsed.components.iter().find(|c| is_named(c, "VCALENDAR")) {
        Some(root) => &root.components,
        None => &parsed.components,
    };

    let mut calendar = IVCalendar {
        prod_id: String::new(),
        cal_scale: None,
        method: None,
        name: None,
        events: Vec::new(),
    };
    for (name, value) in calendar_properties(&unfolded) {
        match name.as_str() {
            "PRODID" => calendar.prod_id = value,
            "CALSCALE" => calendar.cal_scale = Some(value),
            "METHOD" => {
                calendar.method = match value.to_ascii_uppercase().as_str() {
                    "PUBLISH" => Some(Method::Publish),
                    "REQUEST" => Some(Method::Request),
                    _ => None,
                }
            }
            "X-WR-CALNAME" => calendar.name = Some(unescape_text(&value)),
            _ => {}
        }
    }

    for component in components.iter().filter(|c| is_named(c, "VEVENT")) {
        match parse_vevent(component) {
            Ok(event) => calendar.events.push(event),
            Err(e) => tracing::warn!("skipping event: {e}"),
        }
    }

    tracing::debug!(events = calendar.events.len(), "parsed calendar");
    Ok(calendar)
}

/// Properties that sit directly on the VCALENDAR, as `(NAME, raw value)`.
fn calendar_properties(unfolded: &str) -> Vec<(String, String)> {
    let mut depth = 0usize;
    let mut properties = Vec::new();

    for line in unfolded.lines().map(str::trim_end) {
        let Some((head, value)) = line.split_once(':') else {
            continue;
        };
        let name = head.split(';').next().unwrap_or(head).to_ascii_uppercase();
        match name.as_str() {
            "BEGIN" => depth += 1,
            "END" => depth = depth.saturating_sub(1),
            _ if depth == 1 => properties.push((name, value.to_string())),
            _ => {}
        }
    }

    properties
}

fn is_named(component: &Component, name: &str) -> bool {
    component.name.as_ref().eq_ignore_ascii_case(name)
}

fn find<'a>(component: &'a Component, name: &str) -> Option<&'a Property<'a>> {
    component
        .properties
        .iter()
        .find(|p| p.name.as_ref().eq_ignore_ascii_case(name))
}

fn text(component: &Component, name: &str) -> Option<String> {
    find(component, name).map(|p| unescape_text(p.val.as_ref()))
}

fn param<'a>(prop: &'a Property, key: &str) -> Option<&'a str> {
    prop.params
        .iter()
        .find(|p| p.key.as_ref().eq_ignore_ascii_case(key))
        .and_then(|p| p.val.as_ref().map(|v| v.as_ref()))
}

fn parse_vevent(vevent: &Component) -> MindLogResult<IVEvent> {
    let uid = find(vevent, "UID")
        .map(|p| p.val.as_ref().to_string())
        .ok_or_else(|| MindLogError::IcsParse("VEVENT without UID".into()))?;
    let dt_start = find(vevent, "DTSTART")
        .ok_or_else(|| MindLogError::IcsParse(format!("event {} has no DTSTART", uid)))
        .and_then(parse_time_property)?;
    let dt_stamp = match find(vevent, "DTSTAMP") {
        Some(p) => parse_compact_date_time(p.val.as_ref())?,
        None => NaiveDateTime::default(),
    };
    let summary = text(vevent, "SUMMARY").unwrap_or_default();
    let sequence = find(vevent, "SEQUENCE")
        .and_then(|p| p.val.as_ref().trim().parse().ok())
        .unwrap_or(0);

    let mut event = IVEvent::new(uid, summary, dt_start, dt_stamp).with_sequence(sequence);

    event.last_modified = find(vevent, "LAST-MODIFIED")
        .and_then(|p| parse_compact_date_time(p.val.as_ref()).ok());
    event.end = match (find(vevent, "DTEND"), find(vevent, "DURATION")) {
        (Some(end), _) => Some(EventEnd::At(parse_time_property(end)?)),
        (None, Some(duration)) => Some(EventEnd::Duration {
            minutes: parse_duration_minutes(duration.val.as_ref())?,
        }),
        (None, None) => None,
    };
    event.rrule = find(vevent, "RRULE").map(|p| p.val.as_ref().to_string());
    event.ex_dates = vevent
        .properties
        .iter()
        .filter(|p| p.name.as_ref().eq_ignore_ascii_case("EXDATE"))
        .map(parse_exdate_property)
        .collect::<MindLogResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();
    event.status = find(vevent, "STATUS").and_then(|p| EventStatus::from_ics_str(p.val.as_ref()));
    event.transp = match find(vevent, "TRANSP") {
        Some(p) if p.val.as_ref().eq_ignore_ascii_case("TRANSPARENT") => Transparency::Transparent,
        _ => Transparency::Opaque,
    };
    event.description = text(vevent, "DESCRIPTION");
    event.location = text(vevent, "LOCATION");
    event.categories = vevent
        .properties
        .iter()
        .filter(|p| p.name.as_ref().eq_ignore_ascii_case("CATEGORIES"))
        .flat_map(|p| split_escaped_list(p.val.as_ref()))
        .collect();

    // Extension properties. Known ones with escaped payloads are unescaped;
    // everything else is kept exactly as written.
    for prop in vevent.properties.iter().filter(|p| is_extension_key(p.name.as_ref())) {
        let key = prop.name.as_ref();
        let value = match Extension::from_key(key) {
            Some(ext) if ext.payload() == Payload::EscapedText => unescape_text(prop.val.as_ref()),
            _ => prop.val.as_ref().to_string(),
        };
        let key = Extension::from_key(key)
            .map(|ext| ext.key().to_string())
            .unwrap_or_else(|| key.to_string());
        event.x_props.insert(key, value);
    }

    event.alarms = vevent
        .components
        .iter()
        .filter(|c| is_named(c, "VALARM"))
        .filter_map(|alarm| match parse_valarm(alarm) {
            Ok(alarm) => Some(alarm),
            Err(e) => {
                tracing::warn!(event = event.uid(), "skipping alarm: {e}");
                None
            }
        })
        .collect();

    Ok(event)
}

/// DTSTART/DTEND: `VALUE=DATE`, UTC (`Z`) or floating. A TZID is read as
/// floating wall-clock time.
fn parse_time_property(prop: &Property) -> MindLogResult<EventTime> {
    parse_time_value(prop.val.as_ref(), is_date_valued(prop))
}

fn is_date_valued(prop: &Property) -> bool {
    param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
}

fn parse_time_value(value: &str, is_date: bool) -> MindLogResult<EventTime> {
    let value = value.trim();
    if is_date || value.len() == 8 {
        return Ok(EventTime::Date(parse_compact_date(value)?));
    }
    let naive = parse_compact_date_time(value)?;
    if value.ends_with('Z') {
        Ok(EventTime::Utc(naive.and_utc()))
    } else {
        Ok(EventTime::Floating(naive))
    }
}

/// EXDATE may carry several comma-separated values.
fn parse_exdate_property(prop: &Property) -> MindLogResult<Vec<EventTime>> {
    let is_date = is_date_valued(prop);
    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_time_value(s, is_date))
        .collect()
}

fn parse_valarm(alarm: &Component) -> MindLogResult<IVAlarm> {
    let action = find(alarm, "ACTION")
        .and_then(|p| AlarmAction::from_ics_str(p.val.as_ref()))
        .unwrap_or(AlarmAction::Display);

    let trigger_prop = find(alarm, "TRIGGER")
        .ok_or_else(|| MindLogError::IcsParse("VALARM without TRIGGER".into()))?;
    let trigger = if param(trigger_prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE-TIME")) {
        Trigger::Absolute(parse_compact_date_time(trigger_prop.val.as_ref())?.and_utc())
    } else {
        Trigger::Relative {
            minutes: parse_duration_minutes(trigger_prop.val.as_ref())?,
        }
    };

    Ok(IVAlarm {
        action,
        trigger,
        description: text(alarm, "DESCRIPTION"),
        duration_minutes: find(alarm, "DURATION")
            .map(|p| parse_duration_minutes(p.val.as_ref()))
            .transpose()?,
        repeat: find(alarm, "REPEAT").and_then(|p| p.val.as_ref().trim().parse().ok()),
    })
}

/// Split a comma-separated TEXT list, honouring `\,` escapes.
fn split_escaped_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => items.push(unescape_text(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(unescape_text(&current));
    }

    items
}
