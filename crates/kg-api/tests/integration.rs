//! Integration tests: retrieve over HTTP, cache stats/clear, error envelopes.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use kg_api::server::{self, AppState};
use kg_cache::{CacheManager, InMemoryCacheStore};
use kg_extract::HeuristicExtractor;
use kg_graph::fixtures::{middle_earth, UnavailableGraphClient};
use kg_retrieval::Retriever;
use kg_types::GraphClient;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn app_with(graph: Arc<dyn GraphClient>, cached: bool) -> axum::Router {
    let mut retriever = Retriever::new(graph, Arc::new(HeuristicExtractor::new()));
    if cached {
        let cache = CacheManager::new(Arc::new(InMemoryCacheStore::new(32)), Duration::from_secs(300));
        retriever = retriever.with_cache(Arc::new(cache));
    }
    server::router(Arc::new(AppState {
        retriever: Arc::new(retriever),
    }))
}

fn test_app() -> axum::Router {
    app_with(Arc::new(middle_earth()), true)
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Value {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn retrieve_entity_strategy() {
    let app = test_app();
    let j = call(
        &app,
        "POST",
        "/retrieve",
        Some(json!({ "query": "Who is Gandalf?", "strategy": "entity", "max_results": 10 })),
    )
    .await;
    assert_eq!(j["code"], 200);
    let data = &j["data"];
    assert_eq!(data["strategy"], "entity");
    assert_eq!(data["query"], "Who is Gandalf?");
    assert_eq!(data["nodes"][0]["properties"]["name"], "Gandalf");
    assert_eq!(data["nodes"][1]["properties"]["name"], "Gandalf the White");
    assert_eq!(data["total_results"], 2);
    assert_eq!(data["metadata"]["entities"][0]["name"], "Gandalf");
    assert!(data["execution_time"].is_number());
}

#[tokio::test]
async fn retrieve_pathrag_serializes_paths_and_communities() {
    let app = test_app();
    let j = call(
        &app,
        "POST",
        "/retrieve",
        Some(json!({
            "query": "What is the relationship between Frodo and the Ring of Power?",
            "strategy": "pathrag",
            "max_communities": 5,
            "max_path_length": 3,
            "max_paths_per_entity": 5
        })),
    )
    .await;
    assert_eq!(j["code"], 200);
    let data = &j["data"];
    let paths = data["paths"].as_array().unwrap();
    assert!(!paths.is_empty());
    for p in paths {
        assert!(p["length"].as_u64().unwrap() <= 3);
        assert_eq!(p["hops"][0]["kind"], "node");
    }
    assert!(data["communities"].as_array().unwrap().len() <= 5);
    assert_eq!(data["relationships"][0]["type"], "CARRIES");
    assert_eq!(data["relationships"][0]["direction"], "outgoing");
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let app = test_app();
    let body = json!({ "query": "Frodo and Sam" });
    let first = call(&app, "POST", "/retrieve", Some(body.clone())).await;
    assert_eq!(first["data"]["metadata"]["cache_hit"], false);
    let second = call(&app, "POST", "/retrieve", Some(body)).await;
    assert_eq!(second["data"]["metadata"]["cache_hit"], true);
    assert_eq!(second["data"]["nodes"], first["data"]["nodes"]);

    let stats = call(&app, "GET", "/cache/stats", None).await;
    assert_eq!(stats["data"]["hits"], 1);
    assert_eq!(stats["data"]["misses"], 1);
    assert_eq!(stats["data"]["entries"], 1);

    let cleared = call(&app, "POST", "/cache/clear", None).await;
    assert_eq!(cleared["data"]["removed"], 1);
    let stats = call(&app, "GET", "/cache/stats", None).await;
    assert_eq!(stats["data"]["entries"], 0);
}

#[tokio::test]
async fn invalid_input_returns_400_envelope() {
    let app = test_app();
    for body in [
        json!({ "query": "Who is Gandalf?", "strategy": "vector" }),
        json!({ "query": "Who is Gandalf?", "max_results": 0 }),
        json!({ "query": "  " }),
    ] {
        let j = call(&app, "POST", "/retrieve", Some(body)).await;
        assert_eq!(j["code"], 400);
        assert!(j["data"].is_null());
    }
}

#[tokio::test]
async fn no_entities_is_an_empty_success() {
    let app = test_app();
    let j = call(&app, "POST", "/retrieve", Some(json!({ "query": "what is it" }))).await;
    assert_eq!(j["code"], 200);
    assert_eq!(j["data"]["total_results"], 0);
    assert_eq!(j["data"]["metadata"]["entities"], json!([]));
}

#[tokio::test]
async fn graph_outage_returns_503_envelope() {
    let app = app_with(Arc::new(UnavailableGraphClient), false);
    let j = call(&app, "POST", "/retrieve", Some(json!({ "query": "Who is Gandalf?" }))).await;
    assert_eq!(j["code"], 503);
    assert!(j["message"].as_str().unwrap().contains("unavailable"));

    let stats = call(&app, "GET", "/cache/stats", None).await;
    assert_eq!(stats["code"], 404);
}

#[tokio::test]
async fn health() {
    let app = test_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}
