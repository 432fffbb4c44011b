//! Calendar-day query keys.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one calendar day without DST transitions.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Start of a calendar day, in epoch milliseconds, for a fixed reference offset.
///
/// Two instants that fall on the same calendar day in the reference offset
/// produce equal keys, which makes `DateKey` usable as the "habits on day D"
/// query key. Keys are only comparable when built with the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(i64);

impl DateKey {
    /// Wraps a raw start-of-day timestamp.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Truncates `instant` to the start of its calendar day in `offset`.
    pub fn from_datetime<Tz: TimeZone>(instant: &DateTime<Tz>, offset: FixedOffset) -> Self {
        let local_day = instant.with_timezone(&offset).date_naive();
        Self::from_date(local_day, offset)
    }

    /// Returns the key of midnight of `date` in `offset`.
    pub fn from_date(date: NaiveDate, offset: FixedOffset) -> Self {
        let naive_millis = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        Self(naive_millis - i64::from(offset.local_minus_utc()) * 1000)
    }

    /// Returns the raw epoch milliseconds.
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Returns the calendar date this key denotes in `offset`.
    pub fn to_date(self, offset: FixedOffset) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.0).map(|utc| utc.with_timezone(&offset).date_naive())
    }

    /// Returns the key of the following day.
    pub fn next_day(self) -> Self {
        Self(self.0 + MILLIS_PER_DAY)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn utc_midnight_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let key = DateKey::from_date(date, offset(0));
        assert_eq!(key.millis(), 1_709_251_200_000);
    }

    #[test]
    fn same_day_instants_share_a_key() {
        let tz = offset(2);
        let morning = tz.with_ymd_and_hms(2024, 3, 1, 0, 0, 1).unwrap();
        let night = tz.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap();
        assert_eq!(
            DateKey::from_datetime(&morning, tz),
            DateKey::from_datetime(&night, tz)
        );
    }

    #[test]
    fn reference_offset_decides_the_day() {
        // 23:30 UTC on Mar 1 is already Mar 2 in UTC+2.
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let in_utc = DateKey::from_datetime(&instant, offset(0));
        let in_plus_two = DateKey::from_datetime(&instant, offset(2));

        assert_eq!(
            in_utc.to_date(offset(0)),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            in_plus_two.to_date(offset(2)),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn next_day_advances_by_one_day() {
        let tz = offset(-5);
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let key = DateKey::from_date(date, tz);
        assert_eq!(key.next_day().to_date(tz), NaiveDate::from_ymd_opt(2025, 1, 1));
    }
}
