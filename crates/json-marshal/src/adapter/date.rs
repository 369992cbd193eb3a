//! Dates, encoded as milliseconds since the Unix epoch.
//!
//! Wire form: `[100, ms]`. An invalid date has NaN milliseconds and encodes
//! as `[100,[2]]`.

use std::any::Any;

use crate::adapter::{Adapter, Packed};
use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::tag::builtin;
use crate::model::{HostObject, Tag, Value};
use crate::util::datetime::{DateTimeParseError, format_iso_millis, parse_iso_millis};

/// Largest distance from the epoch a valid date may have, in milliseconds.
const MAX_TIME_MS: f64 = 8.64e15;

/// A point in time with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Date {
    millis: f64,
}

impl Date {
    /// Creates a date. Non-finite or out-of-range input gives an invalid date;
    /// fractional milliseconds are truncated.
    pub fn from_millis(millis: f64) -> Self {
        if !millis.is_finite() || millis.abs() > MAX_TIME_MS {
            return Self::invalid();
        }
        // `+ 0.0` turns -0 into +0
        Date {
            millis: millis.trunc() + 0.0,
        }
    }

    pub fn invalid() -> Self {
        Date { millis: f64::NAN }
    }

    /// Parses an ISO 8601 date or date-time.
    pub fn parse_iso(text: &str) -> Result<Self, DateTimeParseError> {
        let date = Self::from_millis(parse_iso_millis(text)? as f64);
        if date.is_valid() {
            Ok(date)
        } else {
            Err(DateTimeParseError {
                message: format!("Date out of range: {}", text),
            })
        }
    }

    /// Milliseconds since the epoch; NaN for an invalid date.
    pub fn millis(&self) -> f64 {
        self.millis
    }

    pub fn is_valid(&self) -> bool {
        !self.millis.is_nan()
    }

    /// Formats as `YYYY-MM-DDTHH:MM:SS.mmmZ`, or `None` for an invalid date.
    pub fn to_iso_string(&self) -> Option<String> {
        self.is_valid().then(|| format_iso_millis(self.millis as i64))
    }
}

impl HostObject for Date {
    fn type_name(&self) -> &str {
        "Date"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter for [`Date`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateAdapter;

impl Adapter for DateAdapter {
    fn name(&self) -> &str {
        "date"
    }

    fn tags(&self) -> &[Tag] {
        &[builtin::DATE]
    }

    fn detect(&self, value: &Value, _options: &Options) -> Option<Tag> {
        value.downcast_host::<Date>().map(|_| builtin::DATE)
    }

    fn pack(&self, _tag: Tag, value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
        Ok(match value.downcast_host::<Date>() {
            Some(date) => Packed::Payload(Value::Number(date.millis())),
            None => Packed::Unchanged,
        })
    }

    fn unpack(
        &self,
        _tag: Tag,
        payload: &serde_json::Value,
        _options: &Options,
    ) -> Result<Value, DecodeError> {
        let date = match payload {
            serde_json::Value::Number(n) => Date::from_millis(n.as_f64().unwrap_or(f64::NAN)),
            // NaN and the infinities arrive as their markers
            serde_json::Value::Array(marker) if marker.len() == 1 => Date::invalid(),
            _ => return Err(DecodeError::invalid_payload(self.name(), "expected a number")),
        };
        Ok(Value::host(date))
    }
}
