use chrono::{DateTime, NaiveDate, Utc};

/// Whether an event spanning `begin..=end` shows up on `day`.
///
/// All three timestamps are truncated to their UTC calendar date before the
/// comparison, so time-of-day never matters and both ends are inclusive.
pub fn is_visible_on(day: DateTime<Utc>, begin: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    is_day_within(day.date_naive(), begin, end)
}

/// Same check as [`is_visible_on`] for a caller that already holds a calendar day.
pub fn is_day_within(day: NaiveDate, begin: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    begin.date_naive() <= day && day <= end.date_naive()
}
