//! Integration tests for the RPDE consumer
//!
//! These tests use wiremock to serve RPDE pages and walk them end-to-end.

use openactive_rpde::feed::{Consumer, Fetcher};
use openactive_rpde::state::{ConsumerState, RunStatus, StallReason};
use openactive_rpde::RpdeError;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a consumer with short delays for testing
fn test_consumer(max_attempts: u32) -> Consumer {
    let fetcher = Fetcher::with_client(Client::new(), max_attempts, Duration::from_millis(10));
    Consumer::new(fetcher, Duration::from_millis(1))
}

/// Mounts an RPDE page at /feed?page=N
async fn mount_page(server: &MockServer, page: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_self_echo_page_is_terminal() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/feed?page=1", mock_server.uri());

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": 1, "state": "updated", "modified": 5, "data": {}}],
            "next": seed,
        }),
    )
    .await;

    let outcome = test_consumer(3)
        .consume(seed.as_str())
        .await
        .expect("Consume failed");

    assert_eq!(outcome.status, RunStatus::Terminal);
    assert_eq!(outcome.state.len(), 1);
    assert!(outcome.state.get("1").is_some());
    assert_eq!(outcome.state.next_url, seed);
    assert!(outcome.state.urls.is_empty());
    assert_eq!(outcome.state.first_url_origin, mock_server.uri());
}

#[tokio::test]
async fn test_delete_on_later_page_removes_item() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let page1 = format!("{}/feed?page=1", base);
    let page2 = format!("{}/feed?page=2", base);

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [
                {"id": 1, "state": "updated", "modified": 5, "data": {}},
                {"id": 2, "state": "updated", "modified": 5, "data": {}}
            ],
            "next": page2,
        }),
    )
    .await;
    mount_page(
        &mock_server,
        "2",
        json!({
            "items": [{"id": 1, "state": "deleted", "modified": 6}],
            "next": page2,
        }),
    )
    .await;

    let outcome = test_consumer(3).consume(page1.as_str()).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Terminal);
    assert!(outcome.state.get("1").is_none());
    assert!(outcome.state.get("2").is_some());
    assert_eq!(outcome.state.urls, vec![page1]);
    assert_eq!(outcome.state.next_url, page2);
}

#[tokio::test]
async fn test_relative_next_links_are_resolved() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": "a", "state": "updated", "modified": 1}],
            "next": "/feed?page=2",
        }),
    )
    .await;
    mount_page(
        &mock_server,
        "2",
        json!({
            "items": [{"id": "b", "state": "updated", "modified": 2}],
            "next": "feed?page=3",
        }),
    )
    .await;
    mount_page(
        &mock_server,
        "3",
        json!({
            "items": [{"id": "a", "state": "updated", "modified": 3, "data": {"v": 2}}],
            "next": "%2Ffeed%3Fpage%3D3",
        }),
    )
    .await;

    let outcome = test_consumer(3)
        .consume(format!("{}/feed?page=1", base))
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Terminal);
    assert_eq!(
        outcome.state.urls,
        vec![
            format!("{}/feed?page=1", base),
            format!("{}/feed?page=2", base)
        ]
    );
    assert_eq!(outcome.state.next_url, format!("{}/feed?page=3", base));
    assert_eq!(outcome.state.len(), 2);
    assert_eq!(
        outcome.state.get("a").unwrap().data_field("v"),
        Some(&json!(2))
    );
}

#[tokio::test]
async fn test_stale_update_does_not_overwrite() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let page2 = format!("{}/feed?page=2", base);

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": 1, "state": "updated", "modified": 9, "data": {"v": "new"}}],
            "next": page2,
        }),
    )
    .await;
    mount_page(
        &mock_server,
        "2",
        json!({
            "items": [
                {"id": 1, "state": "updated", "modified": 3, "data": {"v": "old"}},
                {"id": 1, "state": "updated", "modified": 9, "data": {"v": "tie"}}
            ],
            "next": page2,
        }),
    )
    .await;

    let outcome = test_consumer(3)
        .consume(format!("{}/feed?page=1", base))
        .await
        .unwrap();

    assert_eq!(
        outcome.state.get("1").unwrap().data_field("v"),
        Some(&json!("new"))
    );
}

#[tokio::test]
async fn test_unreachable_page_stalls_and_resumes() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let page1 = format!("{}/feed?page=1", base);
    let page2 = format!("{}/feed?page=2", base);

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": 1, "state": "updated", "modified": 1}],
            "next": page2,
        }),
    )
    .await;

    // Page 2 fails for the whole first run, then recovers
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "2",
        json!({
            "items": [{"id": 2, "state": "updated", "modified": 1}],
            "next": page2,
        }),
    )
    .await;

    let consumer = test_consumer(2);
    let stalled = consumer.consume(page1.as_str()).await.unwrap();

    assert_eq!(
        stalled.status,
        RunStatus::Stalled {
            reason: StallReason::Unreachable {
                url: page2.clone(),
                attempts: 2,
            }
        }
    );
    assert_eq!(stalled.state.len(), 1);
    assert_eq!(stalled.state.urls, vec![page1.clone()]);
    assert_eq!(stalled.state.next_url, page2);

    let resumed = consumer.consume(stalled.state).await.unwrap();
    assert_eq!(resumed.status, RunStatus::Terminal);
    assert_eq!(resumed.state.len(), 2);
    assert_eq!(resumed.state.urls, vec![page1]);
}

#[tokio::test]
async fn test_resuming_terminal_state_is_idempotent() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let page2 = format!("{}/feed?page=2", base);

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": 1, "state": "updated", "modified": 1, "kind": "SessionSeries"}],
            "next": "/feed?page=2",
        }),
    )
    .await;
    mount_page(
        &mock_server,
        "2",
        json!({
            "items": [
                {"id": 2, "state": "updated", "modified": 4},
                {"id": 3, "state": "deleted", "modified": 4}
            ],
            "next": page2,
        }),
    )
    .await;

    let consumer = test_consumer(3);
    let first = consumer
        .consume(format!("{}/feed?page=1", base))
        .await
        .unwrap();
    assert_eq!(first.status, RunStatus::Terminal);

    let second = consumer.consume(first.state.clone()).await.unwrap();
    assert_eq!(second.status, RunStatus::Terminal);
    assert_eq!(second.state, first.state);
}

#[tokio::test]
async fn test_malformed_page_preserves_progress() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let page2 = format!("{}/feed?page=2", base);

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [
                {"id": 1, "state": "updated", "modified": 1},
                {"state": "updated", "modified": 1},
                {"id": 3, "state": "updated"}
            ],
            "next": page2,
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let outcome = test_consumer(3)
        .consume(format!("{}/feed?page=1", base))
        .await
        .unwrap();

    match &outcome.status {
        RunStatus::Stalled {
            reason: StallReason::MalformedPage { url, .. },
        } => assert_eq!(url, &page2),
        other => panic!("expected malformed page stall, got {:?}", other),
    }
    assert_eq!(outcome.state.len(), 1);
    assert_eq!(outcome.state.next_url, page2);
}

#[tokio::test]
async fn test_unresolvable_next_keeps_state_resumable() {
    let mock_server = MockServer::start().await;
    let page1 = format!("{}/feed?page=1", mock_server.uri());

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": 1, "state": "updated", "modified": 1}],
            "next": "",
        }),
    )
    .await;

    let outcome = test_consumer(3).consume(page1.as_str()).await.unwrap();

    assert!(matches!(
        outcome.status,
        RunStatus::Stalled {
            reason: StallReason::UnresolvableNext { .. }
        }
    ));
    assert_eq!(outcome.state.next_url, page1);
    assert!(outcome.state.validate_for_resume().is_ok());
}

#[tokio::test]
async fn test_invalid_seeds_make_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let consumer = test_consumer(3);
    assert!(matches!(
        consumer.consume("").await,
        Err(RpdeError::InvalidSeed(_))
    ));
    assert!(matches!(
        consumer.consume("/feed?page=1").await,
        Err(RpdeError::InvalidSeed(_))
    ));
    assert!(matches!(
        consumer.consume(ConsumerState::new()).await,
        Err(RpdeError::InvalidSeed(_))
    ));
}

#[tokio::test]
async fn test_page_limit() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    for page in 1..=3 {
        mount_page(
            &mock_server,
            &page.to_string(),
            json!({
                "items": [{"id": page, "state": "updated", "modified": 1}],
                "next": format!("/feed?page={}", page + 1),
            }),
        )
        .await;
    }

    let consumer = test_consumer(1).with_max_pages(Some(2));
    let outcome = consumer
        .consume(format!("{}/feed?page=1", base))
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::PageLimit { pages: 2 });
    assert_eq!(outcome.state.len(), 2);
    assert_eq!(outcome.state.next_url, format!("{}/feed?page=3", base));
}

#[tokio::test]
async fn test_cancel_before_start_returns_seed_state() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let seed = format!("{}/feed?page=1", mock_server.uri());
    let outcome = test_consumer(3)
        .consume_with_cancel(seed.as_str(), &cancel)
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert!(outcome.state.is_empty());
    assert_eq!(outcome.state.next_url, seed);
}

#[tokio::test]
async fn test_cancel_during_pacing_delay() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "1",
        json!({
            "items": [{"id": 1, "state": "updated", "modified": 1}],
            "next": "/feed?page=2",
        }),
    )
    .await;

    let fetcher = Fetcher::with_client(Client::new(), 1, Duration::from_millis(10));
    let consumer = Consumer::new(fetcher, Duration::from_secs(30));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let outcome = consumer
        .consume_with_cancel(format!("{}/feed?page=1", base), &cancel)
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(outcome.state.len(), 1);
    assert_eq!(outcome.state.urls, vec![format!("{}/feed?page=1", base)]);
    assert_eq!(outcome.state.next_url, format!("{}/feed?page=2", base));
}
