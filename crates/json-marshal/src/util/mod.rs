//! Utility modules.

pub mod datetime;

pub use datetime::{DateTimeParseError, format_iso_millis, parse_iso_millis};
