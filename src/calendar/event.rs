use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A time-bounded calendar entry owned by the server.
///
/// The client only ever holds a cached copy; the whole collection is replaced
/// on every successful fetch and instances are never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub owner_name: String,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
}

impl Event {
    /// Whether the event shows up on the given UTC calendar day.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        crate::calendar::is_day_within(day, self.begin, self.end)
    }
}
