//! Conversions between application date/time strings and RFC 5545 values.
//!
//! Application events carry `YYYY-MM-DD` dates and `HH:mm` wall-clock times.
//! On the wire they become floating `YYYYMMDDTHHMMSS` date-times or
//! `YYYYMMDD` dates. Anything else is a caller error and yields
//! [`MindLogError::Format`].

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::constants::UID_DOMAIN;
use crate::error::{MindLogError, MindLogResult};

const COMPACT_DATE_TIME: &str = "%Y%m%dT%H%M%S";
const COMPACT_DATE: &str = "%Y%m%d";
const APP_DATE: &str = "%Y-%m-%d";
const APP_TIME: &str = "%H:%M";

/// True when `value` has exactly the shape of `pattern`, where `9` stands
/// for any ASCII digit and every other byte must match literally.
/// chrono tolerates padding inside numeric fields, so the shape is checked first.
fn has_shape(value: &str, pattern: &str) -> bool {
    value.len() == pattern.len()
        && value.bytes().zip(pattern.bytes()).all(|(v, p)| match p {
            b'9' => v.is_ascii_digit(),
            _ => v == p,
        })
}

/// Parse an application date (`YYYY-MM-DD`).
pub fn parse_date(date: &str) -> MindLogResult<NaiveDate> {
    let invalid = || MindLogError::Format(format!("expected YYYY-MM-DD, got {:?}", date));
    if !has_shape(date, "9999-99-99") {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(date, APP_DATE).map_err(|_| invalid())
}

/// Parse an application wall-clock time (`HH:mm`, 24-hour).
pub fn parse_time(time: &str) -> MindLogResult<NaiveTime> {
    let invalid = || MindLogError::Format(format!("expected HH:mm, got {:?}", time));
    if !has_shape(time, "99:99") {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(time, APP_TIME).map_err(|_| invalid())
}

/// `2024-12-14` + `09:00` → `20241214T090000` (floating, no `Z`).
pub fn format_date_time(date: &str, time: &str) -> MindLogResult<String> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(format_timestamp(date.and_time(time)))
}

/// `2024-12-14` → `20241214`, used for all-day events.
pub fn format_date_only(date: &str) -> MindLogResult<String> {
    Ok(parse_date(date)?.format(COMPACT_DATE).to_string())
}

/// Format a naive date-time in the compact form.
pub fn format_timestamp(moment: NaiveDateTime) -> String {
    moment.format(COMPACT_DATE_TIME).to_string()
}

/// Local wall-clock time, no zone.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// The current local time in compact form. Read from the clock on every call.
pub fn current_timestamp() -> String {
    format_timestamp(now_local())
}

/// Map an internal event id to a globally namespaced UID.
pub fn derive_uid(event_id: &str) -> String {
    format!("{}@{}", event_id, UID_DOMAIN)
}

/// Add minutes to an `HH:mm` time, wrapping past midnight.
///
/// Only the time moves: `23:30` + 60 gives `00:30` and the caller keeps the
/// original date. Late-night events therefore end "before" they start.
pub fn add_minutes_wrapping(time: &str, minutes: u32) -> MindLogResult<String> {
    let start = parse_time(time)?;
    let (end, _wrapped_secs) = start.overflowing_add_signed(Duration::minutes(i64::from(minutes)));
    Ok(end.format(APP_TIME).to_string())
}

/// Parse `YYYYMMDDTHHMMSS`, tolerating a trailing `Z`.
pub fn parse_compact_date_time(value: &str) -> MindLogResult<NaiveDateTime> {
    let trimmed = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, COMPACT_DATE_TIME)
        .map_err(|_| MindLogError::Format(format!("expected YYYYMMDDTHHMMSS, got {:?}", value)))
}

/// Parse `YYYYMMDD`.
pub fn parse_compact_date(value: &str) -> MindLogResult<NaiveDate> {
    NaiveDate::parse_from_str(value, COMPACT_DATE)
        .map_err(|_| MindLogError::Format(format!("expected YYYYMMDD, got {:?}", value)))
}

/// Render a signed minute offset as an RFC 5545 duration (`-PT15M`, `PT1H30M`
/// is written as `PT90M`).
pub fn format_duration_minutes(minutes: i64) -> String {
    if minutes < 0 {
        format!("-PT{}M", minutes.unsigned_abs())
    } else {
        format!("PT{}M", minutes)
    }
}

/// Parse an RFC 5545 duration (`-PT15M`, `P1D`, `+PT1H`) into signed minutes.
pub fn parse_duration_minutes(value: &str) -> MindLogResult<i64> {
    let negative = value.starts_with('-');
    let unsigned = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(unsigned)
        .map_err(|e| MindLogError::Format(format!("invalid duration {:?}: {}", value, e)))?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = (std_duration.as_secs() / 60) as i64;

    Ok(if negative { -minutes } else { minutes })
}

/// Render a compact date-time back into the application's (`YYYY-MM-DD`, `HH:mm`) pair.
pub fn split_app_date_time(moment: NaiveDateTime) -> (String, String) {
    (
        moment.date().format(APP_DATE).to_string(),
        moment.time().format(APP_TIME).to_string(),
    )
}

/// Render a date in application form.
pub fn app_date(date: NaiveDate) -> String {
    date.format(APP_DATE).to_string()
}
