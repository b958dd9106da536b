// Black Friday calendar alignment.
//
// Every date is expressed as a signed day offset from its year's Black
// Friday so that the same "shopping day" lines up across years. Offsets are
// negative before the anchor, positive after, and zero on the day itself.
use crate::error::{ReportError, Result};
use chrono::{Datelike, Duration, NaiveDate};

/// Black Friday for `year`: the day after the fourth Thursday of November.
pub fn anchor_date(year: i32) -> Result<NaiveDate> {
    let nov1 = NaiveDate::from_ymd_opt(year, 11, 1).ok_or(ReportError::InvalidYear(year))?;
    // Monday = 0, so Thursday = 3.
    let days_until_thursday = (3 - nov1.weekday().num_days_from_monday() as i64).rem_euclid(7);
    let first_thursday = nov1 + Duration::days(days_until_thursday);
    let thanksgiving = first_thursday + Duration::weeks(3);
    Ok(thanksgiving + Duration::days(1))
}

/// Signed number of days from `year`'s anchor to `date`.
///
/// The date's own year is deliberately not checked against `year`.
pub fn to_offset(date: NaiveDate, year: i32) -> Result<i64> {
    let anchor = anchor_date(year)?;
    Ok((date - anchor).num_days())
}

/// Inverse of [`to_offset`]: the calendar date `offset` days from `year`'s anchor.
pub fn from_offset(year: i32, offset: i64) -> Result<NaiveDate> {
    let anchor = anchor_date(year)?;
    Duration::try_days(offset)
        .and_then(|d| anchor.checked_add_signed(d))
        .ok_or(ReportError::DateOutOfRange { year, offset })
}

/// Week index relative to the anchor: `ceil((day_offset - 1) / 7)`.
///
/// Weeks run Sunday to Saturday. Bucket 0 is Thanksgiving week (ending on the
/// Saturday after Black Friday) and bucket 1 is Cyber Week.
pub fn week_bucket(day_offset: i64) -> i64 {
    ceil_div(day_offset - 1, 7)
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -((-a).div_euclid(b))
}

/// Wording used in report headers for an offset's position relative to the anchor.
pub fn relation_to_anchor(day_offset: i64) -> &'static str {
    match day_offset {
        o if o > 0 => "after",
        o if o < 0 => "before",
        _ => "from",
    }
}
