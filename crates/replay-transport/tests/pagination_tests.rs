//! Paginator behaviour against fixture routes.

use std::sync::Arc;

use futures::TryStreamExt;
use replay_transport::{
    fetch_page, ApiRequest, Cursor, FetchError, FixtureRoute, FixtureTransport, Paginator,
    Transport,
};
use serde_json::{json, Value};

const PATH: &str = "/organizations/acme/replays-events-meta/";

fn next_link(cursor: &str, results: bool) -> String {
    format!(
        "<https://sentry.io/api/0{PATH}?cursor=0:0:1>; \
         rel=\"previous\"; results=\"false\"; cursor=\"0:0:1\", \
         <https://sentry.io/api/0{PATH}?cursor={cursor}>; \
         rel=\"next\"; results=\"{results}\"; cursor=\"{cursor}\""
    )
}

fn three_pages() -> Arc<FixtureTransport> {
    Arc::new(FixtureTransport::with_routes([
        FixtureRoute::ok(PATH, json!({"data": [{"id": "a"}, {"id": "b"}]}))
            .for_cursor("0:0:0")
            .with_link(next_link("0:2:0", true)),
        FixtureRoute::ok(PATH, json!({"data": [{"id": "c"}, {"id": "d"}]}))
            .for_cursor("0:2:0")
            .with_link(next_link("0:4:0", true)),
        FixtureRoute::ok(PATH, json!({"data": [{"id": "e"}]}))
            .for_cursor("0:4:0")
            .with_link(next_link("0:6:0", false)),
    ]))
}

fn paginator(transport: &Arc<FixtureTransport>, path: &str, per_page: usize) -> Paginator<Value> {
    Paginator::new(transport.clone(), ApiRequest::new(path), per_page)
}

fn ids(items: &[Value]) -> Vec<&str> {
    items.iter().map(|v| v["id"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn test_collect_all_follows_cursors_in_order() {
    let transport = three_pages();

    let items = paginator(&transport, PATH, 2).collect_all().await.unwrap();
    assert_eq!(ids(&items), vec!["a", "b", "c", "d", "e"]);

    let cursors: Vec<_> = transport
        .requests()
        .iter()
        .map(|r| r.cursor().unwrap().to_string())
        .collect();
    assert_eq!(cursors, vec!["0:0:0", "0:2:0", "0:4:0"]);
    assert!(transport
        .requests()
        .iter()
        .all(|r| r.query_value("per_page") == Some("2")));
}

#[tokio::test]
async fn test_results_false_stops_after_one_page() {
    let route = FixtureRoute::ok(PATH, json!({"data": [{"id": "only"}]}))
        .with_link(next_link("0:50:0", false));
    let transport = Arc::new(FixtureTransport::with_routes([route]));

    let mut paginator = paginator(&transport, PATH, 50);
    assert_eq!(paginator.next_page().await.unwrap().map(|p| p.len()), Some(1));
    assert!(paginator.is_exhausted());
    assert_eq!(paginator.next_page().await.unwrap(), None);
    assert_eq!(transport.request_count(), 1);
    assert_eq!(paginator.pages_fetched(), 1);
}

#[tokio::test]
async fn test_missing_or_malformed_link_ends_stream() {
    let transport = Arc::new(FixtureTransport::with_routes([
        FixtureRoute::ok(PATH, json!({"data": [{"id": "a"}]}))
            .with_link("this is not a link header"),
        FixtureRoute::ok("/bare/", json!([{"id": "b"}])),
    ]));

    let items = paginator(&transport, PATH, 50).collect_all().await.unwrap();
    assert_eq!(ids(&items), vec!["a"]);

    let items = paginator(&transport, "/bare/", 50).collect_all().await.unwrap();
    assert_eq!(ids(&items), vec!["b"]);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_into_stream_yields_pages_lazily() {
    let transport = three_pages();
    let stream = paginator(&transport, PATH, 2).into_stream();
    futures::pin_mut!(stream);

    let first = stream.try_next().await.unwrap().unwrap();
    assert_eq!(ids(&first), vec!["a", "b"]);
    assert_eq!(transport.request_count(), 1);

    let rest: Vec<Vec<Value>> = stream.try_collect().await.unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let route = FixtureRoute::failing(PATH, 502);
    let transport: Arc<dyn Transport> = Arc::new(FixtureTransport::with_routes([route]));

    let request = ApiRequest::new(PATH);
    let err = fetch_page::<Value>(transport.as_ref(), &request, &Cursor::initial(), 50)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { status: Some(502), .. }));
}

#[tokio::test]
async fn test_bad_body_is_deserialization_error() {
    let transport = FixtureTransport::with_routes([FixtureRoute::ok(PATH, json!({"rows": []}))]);

    let request = ApiRequest::new(PATH);
    let err = fetch_page::<Value>(&transport, &request, &Cursor::initial(), 50)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Deserialization { .. }));
}
