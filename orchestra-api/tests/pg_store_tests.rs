#![cfg(feature = "db-tests")]
//! PostgreSQL Store Integration Tests
//!
//! Run against a live database configured through `ORCHESTRA_DB_*`:
//!
//! ```text
//! cargo test -p orchestra-api --features db-tests --test pg_store_tests
//! ```
//!
//! The database is shared between runs, so assertions look for the rows a
//! test wrote rather than counting whole tables.

use orchestra_api::{DbConfig, PgStore};
use orchestra_test_utils::{fixtures, AgentStatus, ConsoleEventType, LogLevel, Store};

async fn test_store() -> PgStore {
    let store = PgStore::from_config(&DbConfig::from_env()).unwrap();
    store.migrate().await.unwrap();
    store
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, orchestra_core::new_entity_id())
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let store = test_store().await;
    store.migrate().await.unwrap();
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_agent_with_memories_round_trips() {
    let store = test_store().await;
    let name = unique("PG-AGENT");

    let agent = store.agent_insert(&fixtures::full_agent(&name)).await.unwrap();
    assert_eq!(agent.status, AgentStatus::Running);

    let first = store
        .memory_insert(&agent.id, &fixtures::memory_input("first", "alpha"))
        .await
        .unwrap();
    let second = store
        .memory_insert(&agent.id, &fixtures::memory_input("second", "beta"))
        .await
        .unwrap();

    let listed = store.agent_list().await.unwrap();
    let found = listed.iter().find(|a| a.id == agent.id).unwrap();
    assert_eq!(found.name, name);
    let memory_ids: Vec<&str> = found.memories.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(memory_ids, [first.id.as_str(), second.id.as_str()]);
}

#[tokio::test]
async fn test_status_update_returns_new_row() {
    let store = test_store().await;
    let agent = store
        .agent_insert(&fixtures::full_agent(&unique("PG-STATUS")))
        .await
        .unwrap();

    let updated = store
        .agent_update_status(&agent.id, AgentStatus::Offline)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, AgentStatus::Offline);

    let missing = store
        .agent_update_status(&unique("missing"), AgentStatus::Idle)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_recent_logs_are_newest_first() {
    let store = test_store().await;
    let source = unique("PG");

    for message in ["one", "two"] {
        store
            .log_insert(&fixtures::log_input(LogLevel::Inf, &source, message))
            .await
            .unwrap();
    }

    let recent = store.log_list_recent(100).await.unwrap();
    let ours: Vec<&str> = recent
        .iter()
        .filter(|l| l.source == source)
        .map(|l| l.message.as_str())
        .collect();
    assert_eq!(ours, ["two", "one"]);
}

#[tokio::test]
async fn test_console_events_are_stored() {
    let store = test_store().await;
    let agent = unique("PG-CONSOLE");

    let event = store
        .console_insert(&fixtures::console_input(ConsoleEventType::Cmd, &agent, "status --all"))
        .await
        .unwrap();

    let recent = store.console_list_recent(100).await.unwrap();
    assert!(recent.iter().any(|e| e.id == event.id && e.agent == agent));
}
