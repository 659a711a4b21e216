//! Core of the MindLog diary.
//!
//! - [`event`]: the RFC 5545 model (`IVEvent`, `IVAlarm`, `IVCalendar`)
//! - [`timeline`]: the application's flat event and its projection to and from the model
//! - [`ics`]: writing and reading .ics documents
//! - [`store`], [`reminder`], [`export`], [`question`], [`config`]: what the CLI builds on

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod export;
pub mod extension;
pub mod ics;
pub mod question;
pub mod reminder;
pub mod store;
pub mod timeline;

pub use error::{MindLogError, MindLogResult};
pub use event::{IVAlarm, IVCalendar, IVEvent};
pub use timeline::{EventKind, TimelineEvent};
