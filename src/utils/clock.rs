//! Timestamp helpers
//!
//! Wire timestamps are ISO-8601 UTC with seconds precision and a trailing `Z`.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use serde::Serializer;

const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";
const RECORDED_AT: &str = "%Y-%m-%d %I:%M %p";

pub fn format_iso(ts: DateTime<Utc>) -> String {
    ts.format(ISO_SECONDS).to_string()
}

pub fn now_iso() -> String {
    format_iso(Utc::now())
}

/// serde `serialize_with` adapter for `DateTime<Utc>`
pub fn serialize_iso<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_iso(*ts))
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Local wall-clock stamp used on health entries (`2026-02-08 08:30 AM`)
pub fn recorded_at_now() -> String {
    Local::now().format(RECORDED_AT).to_string()
}

/// Completed years between `dob` and `today`
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    if dob > today {
        return None;
    }
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Date of birth for someone who is `age` years old today
pub fn birth_date_for_age(age: u32, today: NaiveDate) -> NaiveDate {
    today
        .with_year(today.year() - age as i32)
        // Feb 29 on a non-leap target year
        .or_else(|| NaiveDate::from_ymd_opt(today.year() - age as i32, 2, 28))
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_format() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 8, 8, 30, 5).unwrap();
        assert_eq!(format_iso(ts), "2026-02-08T08:30:05Z");
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let dob = NaiveDate::from_ymd_opt(1968, 6, 15).unwrap();
        let before = NaiveDate::from_ymd_opt(2026, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        assert_eq!(age_on(dob, before), Some(57));
        assert_eq!(age_on(dob, on), Some(58));
    }

    #[test]
    fn test_future_birth_date_has_no_age() {
        let dob = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(age_on(dob, today), None);
    }

    #[test]
    fn test_birth_date_round_trips_age() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let dob = birth_date_for_age(58, today);
        assert_eq!(age_on(dob, today), Some(58));
    }
}
