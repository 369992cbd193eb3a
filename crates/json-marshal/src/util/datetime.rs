//! ISO 8601 date/time parsing and formatting utilities.
//!
//! Converts between ISO 8601 strings and milliseconds since the Unix epoch,
//! the representation used by [`Date`](crate::adapter::Date):
//! - Formatting always produces `YYYY-MM-DDTHH:MM:SS.mmmZ` (UTC). Years
//!   outside `0..=9999` use the expanded `±YYYYYY` form.
//! - Parsing accepts `YYYY-MM-DD` and `YYYY-MM-DDTHH:MM[:SS[.fff]]` with an
//!   optional `Z` or `±HH:MM` offset. A missing offset means UTC.

const MILLISECONDS_PER_SECOND: i64 = 1_000;
const MILLISECONDS_PER_MINUTE: i64 = 60 * MILLISECONDS_PER_SECOND;
const MILLISECONDS_PER_HOUR: i64 = 60 * MILLISECONDS_PER_MINUTE;
const MILLISECONDS_PER_DAY: i64 = 24 * MILLISECONDS_PER_HOUR;

/// Error type for ISO 8601 parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeParseError {
    pub message: String,
}

impl std::fmt::Display for DateTimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DateTimeParseError {}

impl DateTimeParseError {
    fn new(what: &str, input: &str) -> Self {
        DateTimeParseError {
            message: format!("Invalid {} in date: {}", what, input),
        }
    }
}

/// Parses a fixed-width run of ASCII digits.
fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parses a timezone offset string (Z, +HH:MM, -HH:MM) and returns offset in minutes.
fn parse_timezone_offset(offset: &str, input: &str) -> Result<i64, DateTimeParseError> {
    if offset == "Z" || offset == "z" {
        return Ok(0);
    }

    let bytes = offset.as_bytes();
    if bytes.len() != 6 || bytes[3] != b':' {
        return Err(DateTimeParseError::new("timezone offset", input));
    }

    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(DateTimeParseError::new("timezone offset", input)),
    };

    let hours = parse_digits(&offset[1..3]).ok_or_else(|| DateTimeParseError::new("timezone offset", input))?;
    let minutes = parse_digits(&offset[4..6]).ok_or_else(|| DateTimeParseError::new("timezone offset", input))?;

    if hours > 23 || minutes > 59 {
        return Err(DateTimeParseError::new("timezone offset", input));
    }

    Ok(sign * (hours as i64 * 60 + minutes as i64))
}

/// Returns true if the given year is a leap year.
fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Returns the number of days in a given month (1-indexed).
fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since the Unix epoch for a proleptic Gregorian date (Howard Hinnant).
fn date_to_days(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let m = if month <= 2 { month + 9 } else { month - 3 } as i64;

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // year of era
    let doy = (153 * m + 2) / 5 + day as i64 - 1; // day of year
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // day of era

    era * 146_097 + doe - 719_468
}

/// Converts days since the Unix epoch to (year, month, day).
fn days_to_date(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097; // day of era
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // year of era
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153; // month index
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;

    (if m <= 2 { y + 1 } else { y }, m, d)
}

/// Splits the year off the front of `input`: four digits, or a sign and six.
fn split_year(input: &str) -> Option<(i64, &str)> {
    match input.as_bytes().first()? {
        b'+' | b'-' => {
            let digits = input.get(1..7)?;
            let magnitude = parse_digits(digits)? as i64;
            let year = if input.starts_with('-') { -magnitude } else { magnitude };
            Some((year, &input[7..]))
        }
        _ => Some((parse_digits(input.get(..4)?)? as i64, &input[4..])),
    }
}

/// Parses `HH:MM[:SS[.fff]]` into milliseconds since midnight.
fn parse_time_of_day(time: &str, input: &str) -> Result<i64, DateTimeParseError> {
    let bytes = time.as_bytes();
    if bytes.len() < 5 || bytes[2] != b':' {
        return Err(DateTimeParseError::new("time", input));
    }

    let hours = parse_digits(&time[..2]).ok_or_else(|| DateTimeParseError::new("hours", input))?;
    let minutes = parse_digits(&time[3..5]).ok_or_else(|| DateTimeParseError::new("minutes", input))?;
    if hours > 23 {
        return Err(DateTimeParseError::new("hours", input));
    }
    if minutes > 59 {
        return Err(DateTimeParseError::new("minutes", input));
    }

    let mut seconds = 0;
    let mut millis = 0;
    let rest = &time[5..];
    if !rest.is_empty() {
        if rest.len() < 3 || !rest.starts_with(':') {
            return Err(DateTimeParseError::new("seconds", input));
        }
        seconds = parse_digits(&rest[1..3]).ok_or_else(|| DateTimeParseError::new("seconds", input))?;
        if seconds > 59 {
            return Err(DateTimeParseError::new("seconds", input));
        }

        let fraction = &rest[3..];
        if !fraction.is_empty() {
            let digits = fraction
                .strip_prefix('.')
                .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
                .ok_or_else(|| DateTimeParseError::new("fractional seconds", input))?;
            // Pad or truncate to 3 digits (milliseconds)
            let mut padded: String = digits.chars().take(3).collect();
            while padded.len() < 3 {
                padded.push('0');
            }
            millis = parse_digits(&padded).unwrap_or(0);
        }
    }

    Ok(hours as i64 * MILLISECONDS_PER_HOUR
        + minutes as i64 * MILLISECONDS_PER_MINUTE
        + seconds as i64 * MILLISECONDS_PER_SECOND
        + millis as i64)
}

/// Parses an ISO 8601 date or date-time string into milliseconds since the
/// Unix epoch.
pub fn parse_iso_millis(input: &str) -> Result<i64, DateTimeParseError> {
    if !input.is_ascii() {
        return Err(DateTimeParseError::new("characters", input));
    }

    let (year, rest) = split_year(input).ok_or_else(|| DateTimeParseError::new("year", input))?;

    // -MM-DD
    let bytes = rest.as_bytes();
    if bytes.len() < 6 || bytes[0] != b'-' || bytes[3] != b'-' {
        return Err(DateTimeParseError::new("format", input));
    }
    let month = parse_digits(&rest[1..3]).ok_or_else(|| DateTimeParseError::new("month", input))?;
    let day = parse_digits(&rest[4..6]).ok_or_else(|| DateTimeParseError::new("day", input))?;
    if !(1..=12).contains(&month) {
        return Err(DateTimeParseError::new("month", input));
    }
    if day < 1 || day > days_in_month(year, month) {
        return Err(DateTimeParseError::new("day", input));
    }

    let days = date_to_days(year, month, day);
    let rest = &rest[6..];
    if rest.is_empty() {
        return Ok(days * MILLISECONDS_PER_DAY);
    }

    let Some(time) = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' ')) else {
        return Err(DateTimeParseError::new("date/time separator", input));
    };

    let (time, offset) = match time.find(['Z', 'z', '+', '-']) {
        Some(at) => (&time[..at], Some(&time[at..])),
        None => (time, None),
    };

    let ms_of_day = parse_time_of_day(time, input)?;
    let offset_min = match offset {
        Some(s) => parse_timezone_offset(s, input)?,
        None => 0,
    };

    // local time = UTC + offset, so UTC = local - offset
    Ok(days * MILLISECONDS_PER_DAY + ms_of_day - offset_min * MILLISECONDS_PER_MINUTE)
}

/// Formats milliseconds since the Unix epoch as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_iso_millis(epoch_ms: i64) -> String {
    let days = epoch_ms.div_euclid(MILLISECONDS_PER_DAY);
    let time_ms = epoch_ms.rem_euclid(MILLISECONDS_PER_DAY);

    let (year, month, day) = days_to_date(days);

    let hours = time_ms / MILLISECONDS_PER_HOUR;
    let minutes = time_ms % MILLISECONDS_PER_HOUR / MILLISECONDS_PER_MINUTE;
    let seconds = time_ms % MILLISECONDS_PER_MINUTE / MILLISECONDS_PER_SECOND;
    let millis = time_ms % MILLISECONDS_PER_SECOND;

    let year = if (0..=9999).contains(&year) {
        format!("{:04}", year)
    } else if year < 0 {
        format!("-{:06}", -year)
    } else {
        format!("+{:06}", year)
    };

    format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hours, minutes, seconds, millis
    )
}
