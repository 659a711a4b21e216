//! Fixed strings written into every exported calendar.

pub const PRODUCT_ID: &str = "-//MindLog//MindLog Calendar//EN";

pub const CALENDAR_NAME: &str = "MindLog Schedule";

/// Appended to internal event ids to form globally unique UIDs.
pub const UID_DOMAIN: &str = "mindlog.app";

/// Vendor prefix shared by every extension property.
pub const EXT_PREFIX: &str = "X-MINDLOG";

/// Reminder value the UI uses for "at event time".
pub const AT_EVENT_TIME: u32 = 1;

/// Length of the synthesized end when an event has a start but no end.
pub const DEFAULT_EVENT_MINUTES: u32 = 60;
