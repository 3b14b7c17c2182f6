//! End-to-end pagination against a mocked listing endpoint.
//!
//! Each test starts its own wiremock server and drives a `FeedController`
//! backed by the real `RedditSource`, checking both the resulting state and
//! the requests the server actually saw.

use pretty_assertions::assert_eq;
use scrollfeed::feed::{
    Cursor, ErrorKind, FeedController, IntersectionTrigger, Item, RedditSource, project,
};
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller_for(server: &MockServer) -> FeedController<RedditSource> {
    let base = Url::parse(&server.uri()).unwrap();
    let source = RedditSource::new(reqwest::Client::new(), &base, "jewelry", None).unwrap();
    FeedController::new(Arc::new(source), 10)
}

async fn mount_page(server: &MockServer, after_param: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/r/jewelry.json"))
        .and(query_param("limit", "10"))
        .and(query_param("after", after_param))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("Content-Type", "application/json"),
        )
        .mount(server)
        .await;
}

fn record_errors(controller: &mut FeedController<RedditSource>) -> Arc<Mutex<Vec<ErrorKind>>> {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    controller.on_error(move |kind, _| sink.lock().unwrap().push(kind));
    errors
}

#[tokio::test]
async fn test_pages_until_null_after() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "",
        r#"{"data":{"children":[{"data":{"title":"A","selftext":"","url":"u1"}}],"after":"c2"}}"#,
    )
    .await;
    mount_page(&server, "c2", r#"{"data":{"children":[],"after":null}}"#).await;

    let mut controller = controller_for(&server);

    assert!(controller.advance());
    controller.settle().await;

    let expected = vec![Item {
        title: "A".into(),
        description: "No description available.".into(),
        url: "u1".into(),
    }];
    {
        let state = controller.current_state();
        assert_eq!(state.items, expected);
        assert_eq!(state.cursor, Cursor::After("c2".into()));
        assert!(state.has_more);
    }

    assert!(controller.advance());
    controller.settle().await;

    let state = controller.current_state();
    assert_eq!(state.items, expected);
    assert!(!state.has_more);
    assert!(!controller.advance());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_missing_data_field_ends_feed() {
    let server = MockServer::start().await;
    mount_page(&server, "", "{}").await;

    let mut controller = controller_for(&server);
    let errors = record_errors(&mut controller);

    controller.advance();
    controller.settle().await;

    let state = controller.current_state();
    assert!(!state.has_more);
    assert!(state.items.is_empty());
    assert_eq!(*errors.lock().unwrap(), vec![ErrorKind::Schema]);
    assert!(!controller.advance());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_http_error_keeps_feed_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server);
    let errors = record_errors(&mut controller);

    controller.advance();
    controller.settle().await;

    let state = controller.current_state();
    assert!(!state.loading);
    assert!(state.has_more);
    assert!(state.items.is_empty());
    assert_eq!(state.cursor, Cursor::Start);
    assert_eq!(*errors.lock().unwrap(), vec![ErrorKind::Transport]);

    // No retry happens without another advance.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!controller.try_update());
    assert!(!controller.is_fetching());
}

#[tokio::test]
async fn test_malformed_json_is_retried_with_same_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("after", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"data\": "))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "",
        r#"{"data":{"children":[{"data":{"title":"B","selftext":"opal","url":"u2"}}],"after":"c3"}}"#,
    )
    .await;

    let mut controller = controller_for(&server);
    let errors = record_errors(&mut controller);

    controller.advance();
    controller.settle().await;
    assert_eq!(*errors.lock().unwrap(), vec![ErrorKind::Parse]);
    assert!(controller.current_state().has_more);

    controller.advance();
    controller.settle().await;

    let state = controller.current_state();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].description, "opal");
    assert_eq!(state.cursor, Cursor::After("c3".into()));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests
        .iter()
        .all(|r| r.url.query_pairs().any(|(k, v)| k == "after" && v.is_empty())));
}

#[tokio::test]
async fn test_trigger_drives_pagination() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "",
        r#"{"data":{"children":[
            {"data":{"title":"A","selftext":"","url":"u1"}},
            {"data":{"title":"B","selftext":"","url":"u2"}}
        ],"after":"c2"}}"#,
    )
    .await;
    mount_page(
        &server,
        "c2",
        r#"{"data":{"children":[{"data":{"title":"C","selftext":"","url":"u3"}}],"after":null}}"#,
    )
    .await;

    let mut controller = controller_for(&server);
    let mut trigger = IntersectionTrigger::new();

    controller.advance();

    // Loading: nothing is observed.
    let view = project(controller.current_state());
    trigger.attach(view.sentinel, view.trigger_active);
    assert_eq!(trigger.observer_id(), None);

    controller.settle().await;

    let view = project(controller.current_state());
    trigger.attach(view.sentinel, view.trigger_active);
    assert_eq!(trigger.observed(), Some("u2"));

    if trigger.report(true) {
        assert!(controller.advance());
    }
    controller.settle().await;

    let view = project(controller.current_state());
    assert_eq!(view.rows.len(), 3);
    assert!(view.show_end);
    trigger.attach(view.sentinel, view.trigger_active);
    assert_eq!(trigger.observer_id(), None);
    assert!(!trigger.report(true));

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
