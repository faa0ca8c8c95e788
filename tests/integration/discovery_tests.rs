//! Integration tests for catalogue discovery and cross-feed correlation
//!
//! A mock publisher serves a catalogue collection, one catalogue, one dataset
//! page, and the two sibling RPDE feeds it describes.

use openactive_rpde::correlate::{find_subevents, find_superevents, partner_feed_url};
use openactive_rpde::discovery::{flatten, Discoverer};
use openactive_rpde::feed::{consume_many, Consumer, ConsumerSeed, Fetcher};
use openactive_rpde::output::{item_data_types, item_kinds};
use openactive_rpde::state::RunStatus;
use reqwest::Client;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_fetcher() -> Fetcher {
    Fetcher::with_client(Client::new(), 2, Duration::from_millis(10))
}

/// Mounts a mock publisher and returns its base URL
async fn mount_publisher(server: &MockServer) -> String {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collection.jsonld"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasPart": [format!("{}/catalogue.jsonld", base), format!("{}/broken.jsonld", base)]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/catalogue.jsonld"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dataset": [format!("{}/dataset", base)]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken.jsonld"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    let dataset_page = format!(
        r#"<html><head><title>Example</title>
        <script type="application/ld+json">
        {{
          "name": "Example Sessions",
          "license": "https://creativecommons.org/licenses/by/4.0/",
          "publisher": {{"name": "Example Ltd"}},
          "distribution": [
            {{"name": "SessionSeries", "contentUrl": "{base}/feeds/session-series"}},
            {{"name": "ScheduledSession", "contentUrl": "{base}/feeds/scheduled-sessions"}}
          ]
        }}
        </script></head><body></body></html>"#,
        base = base
    );
    Mock::given(method("GET"))
        .and(path("/dataset"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(dataset_page)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feeds/session-series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "ss1", "state": "updated", "kind": "SessionSeries", "modified": 1,
                 "data": {"@type": "SessionSeries", "@id": "https://ex.org/session-series/42"}},
                {"id": "ss2", "state": "updated", "kind": "SessionSeries", "modified": 1,
                 "data": {"@type": "SessionSeries", "@id": "https://ex.org/session-series/43"}}
            ],
            "next": "/feeds/session-series"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/feeds/scheduled-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "s1", "state": "updated", "kind": "ScheduledSession", "modified": 1,
                 "data": {"@type": "ScheduledSession", "superEvent": "https://ex.org/session-series/42"}},
                {"id": "s2", "state": "updated", "kind": "ScheduledSession", "modified": 1,
                 "data": {"@type": "ScheduledSession", "superEvent": "https://ex.org/session-series/42"}},
                {"id": "s3", "state": "updated", "kind": "ScheduledSession", "modified": 1,
                 "data": {"@type": "ScheduledSession", "superEvent": "https://ex.org/session-series/99"}}
            ],
            "next": "/feeds/scheduled-sessions"
        })))
        .mount(server)
        .await;

    base
}

#[tokio::test]
async fn test_discover_feeds() {
    let mock_server = MockServer::start().await;
    let base = mount_publisher(&mock_server).await;

    let discoverer = Discoverer::new(test_fetcher(), Duration::from_millis(1));
    let grouped = discoverer
        .discover(&format!("{}/collection.jsonld", base))
        .await;

    assert_eq!(grouped.len(), 1);
    let feeds = flatten(grouped);
    assert_eq!(feeds.len(), 2);
    assert_eq!(feeds[0].name, "Example Sessions");
    assert_eq!(feeds[0].feed_type, "SessionSeries");
    assert_eq!(feeds[0].url, format!("{}/feeds/session-series", base));
    assert_eq!(feeds[0].dataset_url, format!("{}/dataset", base));
    assert_eq!(feeds[0].publisher_name, "Example Ltd");
    assert!(feeds[0].discussion_url.is_empty());
}

#[tokio::test]
async fn test_datasets_follow_collection_order() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/collection.jsonld"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasPart": [format!("{}/z-catalogue", base), format!("{}/a-catalogue", base)]
        })))
        .mount(&mock_server)
        .await;

    for (catalogue, dataset) in [("z-catalogue", "first"), ("a-catalogue", "second")] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", catalogue)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dataset": [format!("{}/{}", base, dataset)]
            })))
            .mount(&mock_server)
            .await;
    }

    let discoverer = Discoverer::new(test_fetcher(), Duration::from_millis(1));
    let catalogues = discoverer
        .catalogue_urls(&format!("{}/collection.jsonld", base))
        .await;
    let grouped = discoverer.dataset_urls(&catalogues).await;

    assert_eq!(grouped[0].0, format!("{}/z-catalogue", base));
    assert_eq!(
        flatten(grouped),
        vec![format!("{}/first", base), format!("{}/second", base)]
    );
}

#[tokio::test]
async fn test_unreachable_collection_yields_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let discoverer = Discoverer::new(test_fetcher(), Duration::from_millis(1));
    let catalogues = discoverer
        .catalogue_urls(&format!("{}/collection.jsonld", mock_server.uri()))
        .await;
    assert!(catalogues.is_empty());
}

#[tokio::test]
async fn test_discover_consume_and_correlate() {
    let mock_server = MockServer::start().await;
    let base = mount_publisher(&mock_server).await;

    let discoverer = Discoverer::new(test_fetcher(), Duration::from_millis(1));
    let feeds = flatten(
        discoverer
            .discover(&format!("{}/collection.jsonld", base))
            .await,
    );
    let known: HashSet<String> = feeds.iter().map(|f| f.url.clone()).collect();

    let child_url = format!("{}/feeds/scheduled-sessions", base);
    let parent_url = partner_feed_url(&child_url, &known).expect("No sibling feed found");
    assert_eq!(parent_url, format!("{}/feeds/session-series", base));

    let consumer = Consumer::new(test_fetcher(), Duration::from_millis(1));
    let runs = consume_many(
        &consumer,
        vec![
            ConsumerSeed::from(child_url.clone()),
            ConsumerSeed::from(parent_url.clone()),
        ],
        2,
        &CancellationToken::new(),
    )
    .await;

    let children = runs[0].result.as_ref().unwrap();
    let parents = runs[1].result.as_ref().unwrap();
    assert_eq!(children.status, RunStatus::Terminal);
    assert_eq!(parents.status, RunStatus::Terminal);

    let s1 = children.state.get("s1").unwrap();
    let matched: Vec<String> = find_superevents(s1, &parents.state)
        .iter()
        .map(|p| p.key())
        .collect();
    assert_eq!(matched, vec!["ss1"]);

    let s3 = children.state.get("s3").unwrap();
    assert!(find_superevents(s3, &parents.state).is_empty());

    let ss1 = parents.state.get("ss1").unwrap();
    assert_eq!(find_subevents(ss1, &children.state).len(), 2);

    assert_eq!(item_kinds(&children.state)["ScheduledSession"], 3);
    assert_eq!(item_data_types(&parents.state)["SessionSeries"], 2);
}
