//! Argument parsers for clap.

use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};

/// Parses a UTC offset such as `+05:30`, `-08:00` or `Z`.
pub fn utc_offset(text: &str) -> Result<FixedOffset, String> {
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }

    let (sign, rest) = match text.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(format!("offset `{text}` must start with + or -")),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| format!("offset `{text}` must look like +HH:MM"))?;
    let hours: i32 = hours
        .parse()
        .map_err(|_| format!("invalid hours in offset `{text}`"))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| format!("invalid minutes in offset `{text}`"))?;
    if !(0..60).contains(&minutes) {
        return Err(format!("invalid minutes in offset `{text}`"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset `{text}` is out of range"))
}

/// Parses one weekday such as `mon` or `Friday`.
pub fn weekday(text: &str) -> Result<Weekday, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("unknown weekday `{text}`"))
}

/// Parses a reminder time as `HH:MM` or `HH:MM:SS`.
pub fn reminder(text: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .map_err(|_| format!("reminder `{text}` must look like HH:MM"))
}

/// Parses a calendar date as `YYYY-MM-DD`.
pub fn date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("date `{text}` must look like YYYY-MM-DD"))
}
