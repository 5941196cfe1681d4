use agrodrone_store::{
    query_in_batches, DocumentStore, HttpDocumentStore, MemoryStore, Query, StoreError,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_store(server: &MockServer) -> HttpDocumentStore {
    HttpDocumentStore::new(&server.uri(), "test_api_key", Client::new())
}

#[tokio::test]
async fn create_returns_assigned_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/flights"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "flight-1",
            "operatorId": "op-1",
            "status": "scheduled"
        }])))
        .mount(&mock_server)
        .await;

    let store = http_store(&mock_server);
    let id = store
        .create("flights", json!({"operatorId": "op-1", "status": "scheduled"}))
        .await
        .unwrap();
    assert_eq!(id, "flight-1");
}

#[tokio::test]
async fn get_maps_404_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/flights/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let store = http_store(&mock_server);
    let err = store.get("flights", "missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn update_patches_document() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/flights/flight-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = http_store(&mock_server);
    store
        .update("flights", "flight-1", json!({"status": "completed"}))
        .await
        .unwrap();
}

#[tokio::test]
async fn query_encodes_filters_and_ordering() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/flights"))
        .and(query_param("operatorId", "eq.op-1"))
        .and(query_param("order", "scheduledDate.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "f2", "operatorId": "op-1", "scheduledDate": "2026-02-01T00:00:00Z"},
            {"id": "f1", "operatorId": "op-1", "scheduledDate": "2026-01-01T00:00:00Z"}
        ])))
        .mount(&mock_server)
        .await;

    let store = http_store(&mock_server);
    let docs = store
        .query(
            "flights",
            &Query::new().eq("operatorId", "op-1").order_desc("scheduledDate"),
        )
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["id"], "f2");
}

#[tokio::test]
async fn count_reads_server_side_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("count", "exact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 42})))
        .mount(&mock_server)
        .await;

    let store = http_store(&mock_server);
    assert_eq!(store.count("users", &Query::new()).await.unwrap(), 42);
}

#[tokio::test]
async fn api_error_carries_provider_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/flights"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "store unavailable"})),
        )
        .mount(&mock_server)
        .await;

    let store = http_store(&mock_server);
    let err = store.query("flights", &Query::new()).await.unwrap_err();
    match err {
        StoreError::Api { message, status } => {
            assert_eq!(message, "store unavailable");
            assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE);
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn batched_in_query_chunks_merges_and_orders() {
    let store = MemoryStore::new();

    // 65 flights, each with one fumigation referencing it.
    let mut flight_ids = Vec::new();
    for i in 0..65u32 {
        let flight_id = store
            .create("flights", json!({"status": "completed"}))
            .await
            .unwrap();
        store
            .create(
                "fumigations",
                json!({
                    "flightId": flight_id,
                    "fumigationDate": format!("2026-01-{:02}T00:00:00Z", (i % 28) + 1),
                }),
            )
            .await
            .unwrap();
        flight_ids.push(flight_id);
    }
    let queries_before = store.query_count("fumigations");

    let template = Query::new().order_desc("fumigationDate");
    let merged = query_in_batches(&store, "fumigations", "flightId", &flight_ids, &template)
        .await
        .unwrap();

    // 65 ids split at the provider limit of 30: exactly 3 underlying queries.
    assert_eq!(store.query_count("fumigations") - queries_before, 3);
    assert_eq!(merged.len(), 65);

    // No duplicates.
    let mut ids: Vec<&str> = merged.iter().map(|d| d["id"].as_str().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 65);

    // Combined ordering holds across batch boundaries.
    let dates: Vec<&str> = merged
        .iter()
        .map(|d| d["fumigationDate"].as_str().unwrap())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}
