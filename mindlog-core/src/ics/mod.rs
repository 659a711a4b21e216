//! ICS file generation and parsing.
//!
//! This module handles reading and writing .ics files according to RFC 5545.

pub mod format;
mod generate;
mod parse;
pub mod text;

pub use generate::{generate_calendar, generate_ics, generate_ics_at, generate_vevent};
pub use parse::parse_calendar;
