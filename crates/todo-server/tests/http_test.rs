//! Integration tests for the HTTP surface

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use healthcheck::types::{Endpoint, ProbeStatus};
use healthcheck::{
    ConnectionResolver, EndpointProber, HealthMetrics, HealthOrchestrator, PingProber,
    RoleAggregator, StaticLookup,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use store::{MemoryConnector, StoreConfig, TodoStore};
use todo_server::config::{Backend, Config};
use todo_server::{AppState, TodoServer, router};
use tower::ServiceExt;

const MASTER: &str = "m:6379";
const SLAVE: &str = "s:6379";

fn store_config() -> StoreConfig {
    let settings: HashMap<String, String> = [("master", MASTER), ("slave", SLAVE)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    StoreConfig::from_map(&settings, "test")
}

/// Helper to build handler state over the in-memory store
fn state_with(
    connector: &MemoryConnector,
    prober: Arc<dyn EndpointProber>,
    health_timeout: Option<Duration>,
) -> AppState {
    let lookup = StaticLookup::new()
        .with_host("m", vec!["10.0.0.1".parse::<IpAddr>().unwrap()])
        .with_host("s", vec!["10.0.0.2".parse::<IpAddr>().unwrap()]);
    let aggregator = Arc::new(RoleAggregator::new(
        ConnectionResolver::new(Arc::new(lookup)),
        prober,
    ));

    AppState {
        orchestrator: Arc::new(HealthOrchestrator::new(
            store_config(),
            aggregator,
            Arc::new(HealthMetrics::default()),
        )),
        store: Arc::new(TodoStore::new(store_config(), Arc::new(connector.clone()))),
        health_timeout,
    }
}

fn state(connector: &MemoryConnector) -> AppState {
    state_with(
        connector,
        Arc::new(PingProber::new(Arc::new(connector.clone()))),
        None,
    )
}

/// Replica mirrors the master
fn replicated_connector() -> MemoryConnector {
    let connector = MemoryConnector::new();
    connector.alias(SLAVE, MASTER);
    connector
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_todo(method: &str, todo: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/todos")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "todo": todo }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_lists_every_endpoint() {
    let connector = MemoryConnector::new();
    connector.set_down("10.0.0.2:6379", "connection refused");

    let (status, body) = send(state(&connector), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let health: HashMap<String, String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.len(), 3);
    assert_eq!(health["self"], "ok");
    assert_eq!(health["m-0"], "ok");
    assert_eq!(health["s-0"], "connection refused");
}

#[tokio::test]
async fn test_metrics_after_health_check() {
    let connector = MemoryConnector::new();
    let state = state(&connector);

    send(state.clone(), get("/health")).await;
    let (status, body) = send(state, get("/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("todoapp_redis_masters_total{"));
    assert!(text.contains("todoapp_redis_masters_healthy_total{"));
    assert!(text.contains("todoapp_redis_slaves_total{"));
    assert!(text.contains("todoapp_redis_slaves_healthy_total{"));
    assert!(text.contains("version=\"test\""));
}

/// Prober that never answers in time
struct SlowProber;

#[async_trait]
impl EndpointProber for SlowProber {
    async fn probe(&self, _endpoint: &Endpoint, _password: &str) -> ProbeStatus {
        tokio::time::sleep(Duration::from_secs(30)).await;
        ProbeStatus::Healthy
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn test_health_timeout_still_reports_self() {
    let connector = MemoryConnector::new();
    let state = state_with(&connector, Arc::new(SlowProber), Some(Duration::from_millis(50)));

    let (status, body) = send(state, get("/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let health: HashMap<String, String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["self"], "ok");
    assert!(health.contains_key("error"));
}

#[tokio::test]
async fn test_add_then_list_todos() {
    let connector = replicated_connector();
    let state = state(&connector);

    let (status, _) = send(state.clone(), with_todo("POST", "buy milk")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(state.clone(), with_todo("POST", "walk dog")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(state, get("/todos")).await;
    assert_eq!(status, StatusCode::OK);
    let todos: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(todos, vec!["buy milk", "walk dog"]);

    // writes only on master, reads served by the replica
    assert_eq!(connector.connects(MASTER), 2);
    assert_eq!(connector.connects(SLAVE), 1);
}

#[tokio::test]
async fn test_list_falls_back_to_master() {
    let connector = MemoryConnector::new();
    connector.seed(MASTER, "todo", &["from master"]);
    connector.set_down(SLAVE, "connection refused");

    let (status, body) = send(state(&connector), get("/todos")).await;

    assert_eq!(status, StatusCode::OK);
    let todos: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(todos, vec!["from master"]);
}

#[tokio::test]
async fn test_list_fails_when_both_roles_fail() {
    let connector = MemoryConnector::new();
    connector.set_down(SLAVE, "replica down");
    connector.set_down(MASTER, "master down");

    let (status, body) = send(state(&connector), get("/todos")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "master down");
}

#[tokio::test]
async fn test_add_fails_without_master() {
    let connector = MemoryConnector::new();
    connector.set_down(MASTER, "master down");

    let (status, _) = send(state(&connector), with_todo("POST", "x")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(connector.commands(SLAVE).is_empty());
}

#[tokio::test]
async fn test_empty_todo_rejected() {
    let connector = MemoryConnector::new();

    let (status, _) = send(state(&connector), with_todo("POST", "   ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(connector.connects(MASTER), 0);
}

#[tokio::test]
async fn test_delete_removes_first_match() {
    let connector = replicated_connector();
    connector.seed(MASTER, "todo", &["a", "b", "a"]);

    let (status, _) = send(state(&connector), with_todo("DELETE", "a")).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(connector.list(MASTER, "todo"), vec!["b", "a"]);
}

#[tokio::test]
async fn test_memory_backend_state_serves_todos() {
    let mut config = Config::default();
    config.store.backend = Backend::Memory;
    config
        .store
        .settings
        .insert("slave".to_string(), "redis-master:6379".into());

    let state = TodoServer::new(config, "test").build_state();

    let (status, _) = send(state.clone(), with_todo("POST", "offline")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(state, get("/todos")).await;
    assert_eq!(status, StatusCode::OK);
    let todos: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(todos, vec!["offline"]);
}
