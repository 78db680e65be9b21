use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{format_for_wire, parse_timestamp, Event, TimestampParseError};
use crate::storage::config::ServerConfig;
use crate::sync::credentials::Credentials;
use crate::sync::http::{build_client, normalize_base_url, timeout_of, ClientError};
use crate::sync::outcome::{ActionOutcome, FailureKind, ListOutcome};

pub const EVENT_CREATED: &str = "event created";
pub const EVENT_UPDATED: &str = "event updated";
pub const EVENT_DELETED: &str = "event deleted";
pub const EVENT_CONFLICT: &str = "event conflicts with an existing event";
pub const INVALID_EVENT_DATA: &str = "invalid event data";
pub const EVENT_NOT_FOUND: &str = "event not found or no permission";
pub const UNKNOWN_ERROR: &str = "unknown error";
pub const UNEXPECTED_LIST_ERROR: &str = "unexpected error fetching events";
pub const UNKNOWN_LIST_ERROR: &str = "unknown error fetching events";

/// Fields of an event the user submits; the server assigns id and owner.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPayload {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventUpdate {
    pub id: String,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
}

impl EventUpdate {
    pub fn new(id: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: id.into(),
            begin: payload.begin,
            end: payload.end,
            description: payload.description,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventWire {
    id: String,
    creator_username: String,
    begin: String,
    end: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    events: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct CreateEventBody<'a> {
    begin: String,
    end: String,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateEventBody<'a> {
    id: &'a str,
    begin: String,
    end: String,
    description: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteEventBody<'a> {
    event_id: &'a str,
}

#[derive(Debug, Error)]
enum ConversionError {
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid begin: {0}")]
    InvalidBegin(TimestampParseError),
    #[error("Invalid end: {0}")]
    InvalidEnd(TimestampParseError),
}

/// The four remote event operations. Every response is classified into an
/// outcome; none of them return an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventApi: Send + Sync {
    async fn list(&self, credentials: &Credentials) -> ListOutcome;

    async fn create(&self, credentials: &Credentials, event: &EventPayload) -> ActionOutcome;

    async fn update(&self, credentials: &Credentials, event: &EventUpdate) -> ActionOutcome;

    async fn delete(&self, credentials: &Credentials, event_id: &str) -> ActionOutcome;
}

pub struct HttpEventClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEventClient {
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(&config.base_url),
            client: build_client(timeout_of(config))?,
        })
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }
}

#[async_trait]
impl EventApi for HttpEventClient {
    async fn list(&self, credentials: &Credentials) -> ListOutcome {
        let url = self.events_url();
        tracing::info!("Fetching events from {}", url);

        let response = match self
            .client
            .get(&url)
            .bearer_auth(credentials.bearer_token())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ListOutcome::Failed(ActionOutcome::from_transport_error(&e)),
        };

        let status = response.status().as_u16();
        tracing::info!("Fetch events response status: {}", status);

        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            if matches!(status, 401 | 404) {
                tracing::error!("Authentication failed when fetching events");
            } else {
                tracing::error!("Failed to fetch events. Status: {}, Body: {}", status, body);
            }
            return ListOutcome::Failed(list_failure(status));
        }

        let event_list: EventListResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_decode() => {
                tracing::error!("Could not decode event list: {}", e);
                return ListOutcome::Failed(ActionOutcome::failure(
                    FailureKind::UnknownServer,
                    UNEXPECTED_LIST_ERROR,
                ));
            }
            Err(e) => return ListOutcome::Failed(ActionOutcome::from_transport_error(&e)),
        };

        let Some(raw_events) = event_list.events else {
            tracing::error!("Events not found in response body");
            return ListOutcome::Failed(ActionOutcome::failure(
                FailureKind::UnknownServer,
                UNEXPECTED_LIST_ERROR,
            ));
        };

        let (events, skipped) = convert_events(raw_events);
        tracing::info!("Fetched {} events successfully ({} skipped)", events.len(), skipped);
        ListOutcome::Fetched { events, skipped }
    }

    async fn create(&self, credentials: &Credentials, event: &EventPayload) -> ActionOutcome {
        let url = self.events_url();
        let body = CreateEventBody {
            begin: format_for_wire(event.begin),
            end: format_for_wire(event.end),
            description: &event.description,
        };

        tracing::info!("Creating event on {}", event.begin);
        tracing::debug!("POST {} with payload: {:?}", url, body);

        let response = match self
            .client
            .post(&url)
            .bearer_auth(credentials.bearer_token())
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ActionOutcome::from_transport_error(&e),
        };

        let status = response.status().as_u16();
        tracing::info!("Create event response status: {}", status);

        match status {
            201 => {}
            400 => {
                let detail = response.text().await.unwrap_or_default();
                tracing::warn!("Event rejected by server validation: {}", detail);
            }
            401 | 404 => tracing::error!("Authentication failed when creating event"),
            _ => {
                let detail = response.text().await.unwrap_or_default();
                tracing::error!("Failed to create event. Status: {}, Body: {}", status, detail);
            }
        }

        create_outcome(status)
    }

    async fn update(&self, credentials: &Credentials, event: &EventUpdate) -> ActionOutcome {
        let url = self.events_url();
        let body = UpdateEventBody {
            id: &event.id,
            begin: format_for_wire(event.begin),
            end: format_for_wire(event.end),
            description: &event.description,
        };

        tracing::info!("Updating event {}", event.id);
        tracing::debug!("PUT {} with payload: {:?}", url, body);

        let response = match self
            .client
            .put(&url)
            .bearer_auth(credentials.bearer_token())
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ActionOutcome::from_transport_error(&e),
        };

        let status = response.status().as_u16();
        tracing::info!("Update event response status: {}", status);

        if !matches!(status, 201 | 400 | 404) {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("Failed to update event {}. Status: {}, Body: {}", event.id, status, detail);
        }

        update_outcome(status)
    }

    async fn delete(&self, credentials: &Credentials, event_id: &str) -> ActionOutcome {
        let url = self.events_url();

        tracing::info!("Deleting event {}", event_id);

        let response = match self
            .client
            .delete(&url)
            .bearer_auth(credentials.bearer_token())
            .json(&DeleteEventBody { event_id })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ActionOutcome::from_transport_error(&e),
        };

        let status = response.status().as_u16();
        tracing::info!("Delete event response status: {}", status);

        match status {
            200 => {}
            401 => tracing::error!("Authentication failed when deleting event {}", event_id),
            404 => tracing::warn!("Event {} not found or not owned by caller", event_id),
            _ => {
                let detail = response.text().await.unwrap_or_default();
                tracing::error!("Failed to delete event {}. Status: {}, Body: {}", event_id, status, detail);
            }
        }

        delete_outcome(status)
    }
}

fn list_failure(status: u16) -> ActionOutcome {
    match status {
        401 | 404 => ActionOutcome::authentication_failed(),
        _ => ActionOutcome::failure(FailureKind::UnknownServer, UNKNOWN_LIST_ERROR),
    }
}

fn create_outcome(status: u16) -> ActionOutcome {
    match status {
        201 => ActionOutcome::success(EVENT_CREATED),
        401 | 404 => ActionOutcome::authentication_failed(),
        409 => ActionOutcome::failure(FailureKind::Conflict, EVENT_CONFLICT),
        400 => ActionOutcome::failure(FailureKind::Validation, INVALID_EVENT_DATA),
        _ => ActionOutcome::failure(FailureKind::UnknownServer, UNKNOWN_ERROR),
    }
}

// 400 maps to the authentication message here, unlike create. Kept as the
// server contract reports it until product review decides otherwise.
fn update_outcome(status: u16) -> ActionOutcome {
    match status {
        201 => ActionOutcome::success(EVENT_UPDATED),
        400 => ActionOutcome::authentication_failed(),
        404 => ActionOutcome::failure(FailureKind::NotFoundOrForbidden, EVENT_NOT_FOUND),
        _ => ActionOutcome::failure(FailureKind::UnknownServer, UNKNOWN_ERROR),
    }
}

fn delete_outcome(status: u16) -> ActionOutcome {
    match status {
        200 => ActionOutcome::success(EVENT_DELETED),
        401 => ActionOutcome::authentication_failed(),
        404 => ActionOutcome::failure(FailureKind::NotFoundOrForbidden, EVENT_NOT_FOUND),
        _ => ActionOutcome::failure(FailureKind::UnknownServer, UNKNOWN_ERROR),
    }
}

fn convert_from_wire(value: serde_json::Value) -> Result<Event, ConversionError> {
    let wire: EventWire = serde_json::from_value(value)?;
    let begin = parse_timestamp(&wire.begin).map_err(ConversionError::InvalidBegin)?;
    let end = parse_timestamp(&wire.end).map_err(ConversionError::InvalidEnd)?;

    Ok(Event {
        id: wire.id,
        owner_name: wire.creator_username,
        begin,
        end,
        description: wire.description,
    })
}

/// Converts a raw `events` array, dropping entries that fail conversion.
fn convert_events(raw: Vec<serde_json::Value>) -> (Vec<Event>, usize) {
    let total = raw.len();
    let events: Vec<Event> = raw
        .into_iter()
        .filter_map(|value| match convert_from_wire(value) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Dropping event from list response: {}", e);
                None
            }
        })
        .collect();
    let skipped = total - events.len();
    (events, skipped)
}
