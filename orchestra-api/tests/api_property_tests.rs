//! Property-Based Tests for the Resource API
//!
//! Requests are generated from the payload strategies in
//! `orchestra-test-utils` and sent through the full router over an
//! in-memory store. Each case builds a fresh store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use orchestra_api::{create_api_router, ApiConfig, AppState};
use orchestra_test_utils::{generators::*, InMemoryStore, Store};
use proptest::prelude::*;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tower::ServiceExt;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn test_app() -> (Router, InMemoryStore) {
    let store = InMemoryStore::new();
    let state = AppState::new(Arc::new(store.clone()));
    let app = create_api_router(state, &ApiConfig::unlimited()).unwrap();
    (app, store)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Strategy for log levels outside the accepted set.
fn invalid_level_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z]{0,6}".prop_filter("must not be a known level", |s| {
        !["INF", "WRN", "ERR", "FAT", "SYS", "USR"].contains(&s.as_str())
    })
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A valid agent body is created with every supplied field echoed, and
    /// shows up in the listing.
    #[test]
    fn prop_valid_agent_round_trips(payload in arb_create_agent_payload()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, _) = test_app();

            let (status, created) = call(&app, Method::POST, "/api/agents", Some(&payload)).await;
            prop_assert_eq!(status, StatusCode::CREATED);
            for (key, value) in payload.as_object().unwrap() {
                prop_assert_eq!(&created[key], value);
            }
            if payload.get("status").is_none() {
                prop_assert_eq!(&created["status"], "IDLE");
            }

            let (_, listed) = call(&app, Method::GET, "/api/agents", None).await;
            let ids: Vec<&Value> = listed.as_array().unwrap().iter().map(|a| &a["id"]).collect();
            prop_assert_eq!(ids, vec![&created["id"]]);
            Ok(())
        })?;
    }

    /// An oversized name is rejected and nothing is stored.
    #[test]
    fn prop_oversized_agent_name_writes_nothing(
        payload in arb_create_agent_payload(),
        name in arb_oversized(100),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, store) = test_app();
            let mut payload = payload;
            payload["name"] = json!(name);

            let (status, body) = call(&app, Method::POST, "/api/agents", Some(&payload)).await;
            prop_assert_eq!(status, StatusCode::BAD_REQUEST);
            prop_assert_eq!(&body["details"][0]["field"], "name");
            prop_assert_eq!(store.agent_count().await.unwrap(), 0);
            Ok(())
        })?;
    }

    /// A non-string name is a validation failure, never a server error.
    #[test]
    fn prop_non_string_agent_name_is_rejected(name in arb_non_string()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, store) = test_app();

            let payload = json!({ "name": name });
            let (status, body) = call(&app, Method::POST, "/api/agents", Some(&payload)).await;
            prop_assert_eq!(status, StatusCode::BAD_REQUEST);
            prop_assert_eq!(&body["code"], "VALIDATION_FAILED");
            prop_assert_eq!(store.agent_count().await.unwrap(), 0);
            Ok(())
        })?;
    }

    /// An unknown log level is rejected and no log is stored.
    #[test]
    fn prop_invalid_log_level_writes_nothing(
        payload in arb_create_log_payload(),
        level in invalid_level_strategy(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, store) = test_app();
            let mut payload = payload;
            payload["level"] = json!(level);

            let (status, _) = call(&app, Method::POST, "/api/logs", Some(&payload)).await;
            prop_assert_eq!(status, StatusCode::BAD_REQUEST);
            prop_assert!(store.log_list_recent(100).await.unwrap().is_empty());
            Ok(())
        })?;
    }

    /// Created logs lead the listing, and back-to-back reads agree.
    #[test]
    fn prop_log_reads_are_stable(payloads in prop::collection::vec(arb_create_log_payload(), 1..8)) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, _) = test_app();
            let mut last_id = Value::Null;
            for payload in &payloads {
                let (status, created) = call(&app, Method::POST, "/api/logs", Some(payload)).await;
                prop_assert_eq!(status, StatusCode::CREATED);
                last_id = created["id"].clone();
            }

            let (_, first) = call(&app, Method::GET, "/api/logs", None).await;
            let (_, second) = call(&app, Method::GET, "/api/logs", None).await;
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.as_array().unwrap().len(), payloads.len());
            prop_assert_eq!(&first[0]["id"], &last_id);
            Ok(())
        })?;
    }

    /// Console events come back in the order they were posted.
    #[test]
    fn prop_console_listing_preserves_submission_order(
        payloads in prop::collection::vec(arb_create_console_payload(), 1..8),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, _) = test_app();
            let mut posted = Vec::new();
            for payload in &payloads {
                let (status, created) = call(&app, Method::POST, "/api/console", Some(payload)).await;
                prop_assert_eq!(status, StatusCode::CREATED);
                posted.push(created["id"].clone());
            }

            let (_, listed) = call(&app, Method::GET, "/api/console", None).await;
            let ids: Vec<Value> = listed.as_array().unwrap().iter().map(|e| e["id"].clone()).collect();
            prop_assert_eq!(ids, posted);
            Ok(())
        })?;
    }

    /// Memories attach to their agent; unknown agents never gain rows.
    #[test]
    fn prop_memory_requires_existing_agent(
        agent in arb_create_agent_payload(),
        memory in arb_create_memory_payload(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let (app, store) = test_app();

            let (status, _) = call(&app, Method::POST, "/api/agents/missing/memory", Some(&memory)).await;
            prop_assert_eq!(status, StatusCode::NOT_FOUND);

            let (_, created) = call(&app, Method::POST, "/api/agents", Some(&agent)).await;
            let uri = format!("/api/agents/{}/memory", created["id"].as_str().unwrap());
            let (status, entry) = call(&app, Method::POST, &uri, Some(&memory)).await;
            prop_assert_eq!(status, StatusCode::CREATED);
            prop_assert_eq!(&entry["agentId"], &created["id"]);

            let agents = store.agent_list().await.unwrap();
            prop_assert_eq!(agents.len(), 1);
            prop_assert_eq!(agents[0].memories.len(), 1);
            Ok(())
        })?;
    }
}
