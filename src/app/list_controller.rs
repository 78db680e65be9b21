use chrono::NaiveDate;

use crate::app::event_store::EventStore;
use crate::calendar::Event;
use crate::sync::{ActionOutcome, Credentials, EventApi, EventUpdate, ListOutcome};

/// Answers "which events show on the selected day" and drives the
/// refresh-after-mutation protocol.
pub struct EventListController {
    store: EventStore,
    selected_day: NaiveDate,
}

impl EventListController {
    pub fn new(selected_day: NaiveDate) -> Self {
        Self {
            store: EventStore::new(),
            selected_day,
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn selected_day(&self) -> NaiveDate {
        self.selected_day
    }

    pub fn select_day(&mut self, day: NaiveDate) {
        self.selected_day = day;
    }

    pub fn last_action(&self) -> Option<&ActionOutcome> {
        self.store.last_action()
    }

    /// Whether the latest outcome means the session must log in again.
    pub fn requires_login(&self) -> bool {
        self.store
            .last_action()
            .is_some_and(ActionOutcome::requires_login)
    }

    /// One-way signal from other components that the server state changed.
    pub fn request_refresh(&mut self) {
        self.store.mark_stale();
    }

    /// Fetches the event list if the cache is stale. Returns the outcome of
    /// the fetch, or `None` when no fetch was needed.
    pub async fn refresh_if_needed(
        &mut self,
        api: &dyn EventApi,
        credentials: &Credentials,
    ) -> Option<ActionOutcome> {
        if !self.store.needs_refresh() {
            return None;
        }

        let fetched = api.list(credentials).await;
        let outcome = fetched.outcome();
        match &fetched {
            ListOutcome::Fetched { skipped, .. } if *skipped > 0 => {
                tracing::warn!("{} events could not be read and were left out", skipped);
            }
            ListOutcome::Failed(failure) => {
                tracing::warn!("Event list fetch failed: {}", failure.message);
            }
            ListOutcome::Fetched { .. } => {}
        }
        self.store.apply_list(fetched);
        Some(outcome)
    }

    pub async fn delete(
        &mut self,
        api: &dyn EventApi,
        credentials: &Credentials,
        event_id: &str,
    ) -> ActionOutcome {
        let outcome = api.delete(credentials, event_id).await;
        self.store.record_mutation(outcome.clone());
        outcome
    }

    pub async fn update(
        &mut self,
        api: &dyn EventApi,
        credentials: &Credentials,
        update: &EventUpdate,
    ) -> ActionOutcome {
        let outcome = api.update(credentials, update).await;
        self.store.record_mutation(outcome.clone());
        outcome
    }

    /// Cached events active on the selected day, newest first.
    pub fn visible_events(&self) -> Vec<&Event> {
        self.store
            .events()
            .iter()
            .rev()
            .filter(|event| event.occurs_on(self.selected_day))
            .collect()
    }

    pub fn find_event(&self, event_id: &str) -> Option<&Event> {
        self.store.events().iter().find(|event| event.id == event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::event_api::MockEventApi;
    use crate::sync::FailureKind;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, day, hour, 0, 0).unwrap()
    }

    fn event(id: &str, begin: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            owner_name: "alice".to_string(),
            begin,
            end,
            description: format!("Event {}", id),
        }
    }

    fn sample_events() -> Vec<Event> {
        vec![
            event("first", at(1, 9), at(1, 10)),
            event("overnight", at(1, 23), at(2, 1)),
            event("later", at(2, 14), at(2, 15)),
            event("other-day", at(4, 9), at(4, 10)),
        ]
    }

    fn may(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 5, day).unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::new("token")
    }

    fn ids(events: Vec<&Event>) -> Vec<&str> {
        events.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn mount_fetches_once_and_filters_newest_first() {
        let mut api = MockEventApi::new();
        api.expect_list()
            .times(1)
            .returning(|_| ListOutcome::Fetched { events: sample_events(), skipped: 0 });
        let mut controller = EventListController::new(may(1));

        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_some());
        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_none());

        assert_eq!(ids(controller.visible_events()), vec!["overnight", "first"]);

        controller.select_day(may(2));
        assert_eq!(ids(controller.visible_events()), vec!["later", "overnight"]);

        controller.select_day(may(3));
        assert!(controller.visible_events().is_empty());
    }

    #[tokio::test]
    async fn repeated_fetch_without_mutation_yields_same_visible_set() {
        let mut api = MockEventApi::new();
        api.expect_list()
            .times(2)
            .returning(|_| ListOutcome::Fetched { events: sample_events(), skipped: 0 });
        let mut controller = EventListController::new(may(2));

        controller.refresh_if_needed(&api, &credentials()).await;
        let first: Vec<Event> = controller.visible_events().into_iter().cloned().collect();

        controller.request_refresh();
        controller.refresh_if_needed(&api, &credentials()).await;
        let second: Vec<Event> = controller.visible_events().into_iter().cloned().collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_retried_automatically() {
        let mut api = MockEventApi::new();
        api.expect_list()
            .times(1)
            .returning(|_| ListOutcome::Failed(ActionOutcome::authentication_failed()));
        let mut controller = EventListController::new(may(1));

        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_some());
        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_none());

        assert!(controller.requires_login());
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_untouched() {
        let mut api = MockEventApi::new();
        api.expect_list()
            .times(1)
            .returning(|_| ListOutcome::Fetched { events: sample_events(), skipped: 0 });
        api.expect_delete().times(1).returning(|_, id| {
            assert_eq!(id, "first");
            ActionOutcome::failure(FailureKind::NotFoundOrForbidden, "event not found or no permission")
        });
        let mut controller = EventListController::new(may(1));
        controller.refresh_if_needed(&api, &credentials()).await;

        let outcome = controller.delete(&api, &credentials(), "first").await;

        assert!(!outcome.succeeded());
        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_none());
        assert_eq!(controller.store().events(), sample_events().as_slice());
        assert_eq!(controller.last_action(), Some(&outcome));
    }

    #[tokio::test]
    async fn successful_delete_triggers_exactly_one_refetch() {
        let mut api = MockEventApi::new();
        let mut fetches = 0;
        api.expect_list().times(2).returning(move |_| {
            fetches += 1;
            let events = if fetches == 1 {
                sample_events()
            } else {
                sample_events().into_iter().filter(|e| e.id != "first").collect()
            };
            ListOutcome::Fetched { events, skipped: 0 }
        });
        api.expect_delete()
            .times(1)
            .returning(|_, _| ActionOutcome::success("event deleted"));
        let mut controller = EventListController::new(may(1));
        controller.refresh_if_needed(&api, &credentials()).await;

        controller.delete(&api, &credentials(), "first").await;

        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_some());
        assert!(controller.refresh_if_needed(&api, &credentials()).await.is_none());
        assert_eq!(ids(controller.visible_events()), vec!["overnight"]);
    }

    #[tokio::test]
    async fn update_records_outcome_and_refreshes_on_success() {
        let mut api = MockEventApi::new();
        api.expect_update()
            .times(1)
            .returning(|_, update| {
                assert_eq!(update.id, "first");
                ActionOutcome::success("event updated")
            });
        let mut controller = EventListController::new(may(1));
        controller.store.apply_list(ListOutcome::Fetched { events: sample_events(), skipped: 0 });
        let update = EventUpdate {
            id: "first".to_string(),
            begin: at(1, 9),
            end: at(1, 11),
            description: "Longer".to_string(),
        };

        let outcome = controller.update(&api, &credentials(), &update).await;

        assert!(outcome.succeeded());
        assert!(controller.store().needs_refresh());
        assert_eq!(controller.last_action().unwrap().message, "event updated");
    }

    #[test]
    fn fresh_cache_skips_the_network() {
        let api = MockEventApi::new();
        let mut controller = EventListController::new(may(1));
        controller.store.apply_list(ListOutcome::Fetched { events: sample_events(), skipped: 0 });

        let outcome = tokio_test::block_on(controller.refresh_if_needed(&api, &credentials()));

        assert!(outcome.is_none());
        assert_eq!(ids(controller.visible_events()), vec!["overnight", "first"]);
    }

    #[test]
    fn find_event_looks_up_cache_by_id() {
        let mut controller = EventListController::new(may(1));
        controller.store.apply_list(ListOutcome::Fetched { events: sample_events(), skipped: 0 });

        assert_eq!(controller.find_event("later").map(|e| e.begin), Some(at(2, 14)));
        assert!(controller.find_event("missing").is_none());
    }
}
