use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use evsync::app::{
    EditMode, EventEditSession, EventListController, NewEventSession, NewEventState, SubmissionStatus,
};
use evsync::storage::ServerConfig;
use evsync::sync::{Credentials, FailureKind, HttpEventClient};

fn client_for(server: &MockServer) -> HttpEventClient {
    let config = ServerConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    };
    HttpEventClient::new(&config).unwrap()
}

fn credentials() -> Credentials {
    Credentials::new("test-token")
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, day).unwrap()
}

fn wire_event(id: &str, begin: &str, end: &str) -> serde_json::Value {
    json!({
        "id": id,
        "creatorUsername": "alice",
        "begin": begin,
        "end": end,
        "description": format!("Event {}", id)
    })
}

fn two_events() -> serde_json::Value {
    json!({
        "events": [
            wire_event("standup", "2023-05-01T09:00:00.000Z", "2023-05-01T09:15:00.000Z"),
            wire_event("overnight", "2023-05-01T23:00:00.000Z", "2023-05-02T01:00:00.000Z"),
        ]
    })
}

fn ids(list: &EventListController) -> Vec<String> {
    list.visible_events().into_iter().map(|e| e.id.clone()).collect()
}

#[tokio::test]
async fn failed_delete_keeps_cache_and_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_events()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let api = client_for(&server);
    let mut list = EventListController::new(may(1));
    list.refresh_if_needed(&api, &credentials()).await;

    let outcome = list.delete(&api, &credentials(), "standup").await;
    let refetched = list.refresh_if_needed(&api, &credentials()).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFoundOrForbidden));
    assert!(refetched.is_none());
    assert_eq!(ids(&list), vec!["overnight", "standup"]);
}

#[tokio::test]
async fn successful_delete_refetches_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_events()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                wire_event("overnight", "2023-05-01T23:00:00.000Z", "2023-05-02T01:00:00.000Z"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/events"))
        .and(body_json(json!({ "eventId": "standup" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let api = client_for(&server);
    let mut list = EventListController::new(may(1));
    list.refresh_if_needed(&api, &credentials()).await;

    let outcome = list.delete(&api, &credentials(), "standup").await;

    assert!(outcome.succeeded());
    assert!(list.refresh_if_needed(&api, &credentials()).await.is_some());
    assert!(list.refresh_if_needed(&api, &credentials()).await.is_none());
    assert_eq!(ids(&list), vec!["overnight"]);
}

#[tokio::test]
async fn created_event_appears_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "events": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                wire_event("new", "2023-05-01T23:00:00.000Z", "2023-05-02T01:00:00.000Z"),
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let api = client_for(&server);
    let mut list = EventListController::new(may(2));
    list.refresh_if_needed(&api, &credentials()).await;
    assert!(list.visible_events().is_empty());

    let mut session = NewEventSession::new();
    session.toggle();
    let form = session.form_mut();
    form.begin = "2023-05-01T23:00".to_string();
    form.end = "2023-05-02T01:00".to_string();
    form.description = "Release party".to_string();
    let outcome = session.submit(&mut list, &api, &credentials()).await.unwrap();

    assert!(outcome.succeeded());
    assert!(list.refresh_if_needed(&api, &credentials()).await.is_some());
    assert_eq!(ids(&list), vec!["new"]);
}

#[tokio::test]
async fn abandoned_create_does_not_block_the_next_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    let api = client_for(&server);
    let mut list = EventListController::new(may(1));
    let mut session = NewEventSession::new();
    session.toggle();
    let form = session.form_mut();
    form.begin = "2023-05-01T10:00".to_string();
    form.end = "2023-05-01T11:00".to_string();
    form.description = "Planning".to_string();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(500),
        session.submit(&mut list, &api, &credentials()),
    )
    .await;

    assert!(abandoned.is_err());
    assert!(!session.is_pending());
    assert_eq!(session.state(), &NewEventState::Expanded(None));

    let outcome = session.submit(&mut list, &api, &credentials()).await.unwrap();

    assert!(outcome.succeeded());
    assert_eq!(
        session.state(),
        &NewEventState::Expanded(Some(SubmissionStatus::Succeeded(outcome)))
    );
}

#[tokio::test]
async fn rejected_edit_stays_open_without_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_events()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let api = client_for(&server);
    let mut list = EventListController::new(may(1));
    list.refresh_if_needed(&api, &credentials()).await;
    let event = list.find_event("standup").cloned().unwrap();

    let mut session = EventEditSession::new(&event.id);
    session.edit(&event);
    session.form_mut().unwrap().description = "Retro".to_string();
    let outcome = session.submit(&mut list, &api, &credentials()).await.unwrap();

    assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFoundOrForbidden));
    assert!(matches!(session.mode(), EditMode::Editing(form) if form.description == "Retro"));
    assert!(list.refresh_if_needed(&api, &credentials()).await.is_none());
}

#[tokio::test]
async fn expired_session_is_reported_for_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let api = client_for(&server);
    let mut list = EventListController::new(may(1));

    let outcome = list.refresh_if_needed(&api, &credentials()).await.unwrap();

    assert!(outcome.requires_login());
    assert!(list.requires_login());
    assert!(list.visible_events().is_empty());
}
