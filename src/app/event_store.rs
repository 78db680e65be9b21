use crate::calendar::Event;
use crate::sync::{ActionOutcome, ListOutcome};

/// Client-local cache of events plus the refresh flag.
///
/// The cache is only ever replaced wholesale from a fetch; mutations reach it
/// by setting `needs_refresh` and fetching again.
#[derive(Debug, Clone, PartialEq)]
pub struct EventStore {
    events: Vec<Event>,
    needs_refresh: bool,
    last_action: Option<ActionOutcome>,
}

impl EventStore {
    /// A fresh store starts stale so the first sync fetches.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            needs_refresh: true,
            last_action: None,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn last_action(&self) -> Option<&ActionOutcome> {
        self.last_action.as_ref()
    }

    pub fn mark_stale(&mut self) {
        self.needs_refresh = true;
    }

    /// Applies a list result. The flag is cleared either way; a failed fetch
    /// keeps the previous cache and is not retried on its own.
    pub fn apply_list(&mut self, outcome: ListOutcome) {
        match outcome {
            ListOutcome::Fetched { events, .. } => {
                self.events = events;
            }
            ListOutcome::Failed(outcome) => {
                self.last_action = Some(outcome);
            }
        }
        self.needs_refresh = false;
    }

    /// Records a mutation result; only a success schedules a refetch.
    pub fn record_mutation(&mut self, outcome: ActionOutcome) {
        if outcome.succeeded() {
            self.needs_refresh = true;
        }
        self.last_action = Some(outcome);
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
