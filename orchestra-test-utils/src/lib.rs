//! Orchestra Test Utilities
//!
//! Shared test infrastructure for the Orchestra workspace:
//! - Stores that fail on purpose, for exercising error paths
//! - Proptest generators for request payloads and enum values
//! - Fixtures for common inputs
//! - Assertions over validation errors and read ordering

// Re-export the in-memory store from its source crate
pub use orchestra_storage::{InMemoryStore, StorageResult, Store};

// Re-export core types for convenience
pub use orchestra_core::{
    Agent, AgentColor, AgentStatus, ConsoleEvent, ConsoleEventType, CreateAgentInput,
    CreateConsoleEventInput, CreateLogInput, CreateMemoryInput, LogEntry, LogLevel, MemoryEntry,
    MemoryType, StorageError, Timestamp, ValidationErrors,
};

use async_trait::async_trait;

// ============================================================================
// FAILING STORES
// ============================================================================

/// A store whose every operation fails with a backend error.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    pub fn new() -> Self {
        Self
    }

    fn fail<T>(operation: &str) -> StorageResult<T> {
        Err(StorageError::backend(operation, "store unavailable"))
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn agent_list(&self) -> StorageResult<Vec<Agent>> {
        Self::fail("agent_list")
    }

    async fn agent_get(&self, _id: &str) -> StorageResult<Option<Agent>> {
        Self::fail("agent_get")
    }

    async fn agent_insert(&self, _input: &CreateAgentInput) -> StorageResult<Agent> {
        Self::fail("agent_insert")
    }

    async fn agent_update_status(
        &self,
        _id: &str,
        _status: AgentStatus,
    ) -> StorageResult<Option<Agent>> {
        Self::fail("agent_update_status")
    }

    async fn agent_count(&self) -> StorageResult<u64> {
        Self::fail("agent_count")
    }

    async fn memory_insert(
        &self,
        _agent_id: &str,
        _input: &CreateMemoryInput,
    ) -> StorageResult<MemoryEntry> {
        Self::fail("memory_insert")
    }

    async fn log_insert(&self, _input: &CreateLogInput) -> StorageResult<LogEntry> {
        Self::fail("log_insert")
    }

    async fn log_list_recent(&self, _limit: usize) -> StorageResult<Vec<LogEntry>> {
        Self::fail("log_list_recent")
    }

    async fn console_insert(
        &self,
        _input: &CreateConsoleEventInput,
    ) -> StorageResult<ConsoleEvent> {
        Self::fail("console_insert")
    }

    async fn console_list_recent(&self, _limit: usize) -> StorageResult<Vec<ConsoleEvent>> {
        Self::fail("console_list_recent")
    }

    async fn ping(&self) -> StorageResult<()> {
        Self::fail("ping")
    }
}

/// An in-memory store whose log writes fail.
///
/// Everything else is delegated, so agent writes succeed while their
/// follow-up audit line does not.
#[derive(Debug, Clone, Default)]
pub struct LogFailingStore {
    inner: InMemoryStore,
}

impl LogFailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backing store, for inspecting what was written.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }
}

#[async_trait]
impl Store for LogFailingStore {
    async fn agent_list(&self) -> StorageResult<Vec<Agent>> {
        self.inner.agent_list().await
    }

    async fn agent_get(&self, id: &str) -> StorageResult<Option<Agent>> {
        self.inner.agent_get(id).await
    }

    async fn agent_insert(&self, input: &CreateAgentInput) -> StorageResult<Agent> {
        self.inner.agent_insert(input).await
    }

    async fn agent_update_status(
        &self,
        id: &str,
        status: AgentStatus,
    ) -> StorageResult<Option<Agent>> {
        self.inner.agent_update_status(id, status).await
    }

    async fn agent_count(&self) -> StorageResult<u64> {
        self.inner.agent_count().await
    }

    async fn memory_insert(
        &self,
        agent_id: &str,
        input: &CreateMemoryInput,
    ) -> StorageResult<MemoryEntry> {
        self.inner.memory_insert(agent_id, input).await
    }

    async fn log_insert(&self, _input: &CreateLogInput) -> StorageResult<LogEntry> {
        Err(StorageError::backend("log_insert", "log table unavailable"))
    }

    async fn log_list_recent(&self, limit: usize) -> StorageResult<Vec<LogEntry>> {
        self.inner.log_list_recent(limit).await
    }

    async fn console_insert(
        &self,
        input: &CreateConsoleEventInput,
    ) -> StorageResult<ConsoleEvent> {
        self.inner.console_insert(input).await
    }

    async fn console_list_recent(&self, limit: usize) -> StorageResult<Vec<ConsoleEvent>> {
        self.inner.console_list_recent(limit).await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.inner.ping().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for request payloads and enum values.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    // === Enum Generators ===

    /// Generate an AgentStatus variant.
    pub fn arb_agent_status() -> impl Strategy<Value = AgentStatus> {
        prop_oneof![
            Just(AgentStatus::Running),
            Just(AgentStatus::Idle),
            Just(AgentStatus::Error),
            Just(AgentStatus::Offline),
        ]
    }

    /// Generate an AgentColor variant.
    pub fn arb_agent_color() -> impl Strategy<Value = AgentColor> {
        prop::sample::select(vec![
            AgentColor::Blue,
            AgentColor::Yellow,
            AgentColor::Red,
            AgentColor::Green,
            AgentColor::Purple,
            AgentColor::Aqua,
            AgentColor::Orange,
        ])
    }

    /// Generate a LogLevel variant.
    pub fn arb_log_level() -> impl Strategy<Value = LogLevel> {
        prop::sample::select(vec![
            LogLevel::Inf,
            LogLevel::Wrn,
            LogLevel::Err,
            LogLevel::Fat,
            LogLevel::Sys,
            LogLevel::Usr,
        ])
    }

    /// Generate a MemoryType variant.
    pub fn arb_memory_type() -> impl Strategy<Value = MemoryType> {
        prop_oneof![
            Just(MemoryType::Fact),
            Just(MemoryType::Observation),
            Just(MemoryType::Synthesis),
        ]
    }

    /// Generate a ConsoleEventType variant.
    pub fn arb_console_event_type() -> impl Strategy<Value = ConsoleEventType> {
        prop_oneof![
            Just(ConsoleEventType::Plan),
            Just(ConsoleEventType::Trace),
            Just(ConsoleEventType::Action),
            Just(ConsoleEventType::Cmd),
        ]
    }

    // === String Generators ===

    /// Generate a string of `min..=max` characters, including non-ASCII ones.
    pub fn arb_text(min: usize, max: usize) -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                4 => prop::char::range('a', 'z'),
                2 => prop::char::range('A', 'Z'),
                1 => prop::char::range('0', '9'),
                1 => prop::sample::select(vec!['-', '_', ' ', 'é', 'λ', '→']),
            ],
            min..=max,
        )
        .prop_map(|chars| chars.into_iter().collect())
    }

    /// Generate a string that is too long for a field capped at `max`.
    pub fn arb_oversized(max: usize) -> impl Strategy<Value = String> {
        arb_text(max + 1, max + 16)
    }

    /// Generate any JSON value that is not a string.
    pub fn arb_non_string() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            Just(json!([])),
            Just(json!({})),
        ]
    }

    // === Payload Generators ===

    prop_compose! {
        /// Generate a valid `POST /api/agents` body.
        pub fn arb_create_agent_payload()(
            name in arb_text(1, 100),
            role in proptest::option::of(arb_text(1, 100)),
            status in proptest::option::of(arb_agent_status()),
            version in proptest::option::of(arb_text(0, 20)),
            message in proptest::option::of(arb_text(0, 500)),
            color in proptest::option::of(arb_agent_color()),
            progress in proptest::option::of(0i64..=100),
        ) -> Value {
            let mut body = Map::new();
            body.insert("name".to_string(), json!(name));
            if let Some(role) = role {
                body.insert("role".to_string(), json!(role));
            }
            if let Some(status) = status {
                body.insert("status".to_string(), json!(status.as_str()));
            }
            if let Some(version) = version {
                body.insert("version".to_string(), json!(version));
            }
            if let Some(message) = message {
                body.insert("message".to_string(), json!(message));
            }
            if let Some(color) = color {
                body.insert("color".to_string(), json!(color.as_str()));
            }
            if let Some(progress) = progress {
                body.insert("progress".to_string(), json!(progress));
            }
            Value::Object(body)
        }
    }

    prop_compose! {
        /// Generate a valid `POST /api/logs` body.
        pub fn arb_create_log_payload()(
            level in arb_log_level(),
            source in arb_text(1, 50),
            message in arb_text(1, 500),
        ) -> Value {
            json!({ "level": level.as_str(), "source": source, "message": message })
        }
    }

    prop_compose! {
        /// Generate a valid `POST /api/agents/{id}/memory` body.
        pub fn arb_create_memory_payload()(
            key in arb_text(1, 100),
            value in arb_text(1, 2000),
            memory_type in proptest::option::of(arb_memory_type()),
        ) -> Value {
            let mut body = json!({ "key": key, "value": value });
            if let Some(t) = memory_type {
                body["type"] = json!(t.as_str());
            }
            body
        }
    }

    prop_compose! {
        /// Generate a valid `POST /api/console` body.
        pub fn arb_create_console_payload()(
            event_type in arb_console_event_type(),
            agent in arb_text(1, 100),
            content in arb_text(1, 2000),
        ) -> Value {
            json!({ "type": event_type.as_str(), "agent": agent, "content": content })
        }
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built inputs for common testing scenarios.

    use super::*;

    /// A fully populated agent input.
    pub fn full_agent(name: &str) -> CreateAgentInput {
        CreateAgentInput {
            name: name.to_string(),
            role: Some("DATA_INGESTION".to_string()),
            status: AgentStatus::Running,
            version: Some("v2.1.0".to_string()),
            message: Some("Processing stream".to_string()),
            image_url: Some("https://example.com/agent.png".to_string()),
            color: Some(AgentColor::Blue),
            progress: Some(45),
        }
    }

    /// A log input from `source`.
    pub fn log_input(level: LogLevel, source: &str, message: &str) -> CreateLogInput {
        CreateLogInput {
            level,
            source: source.to_string(),
            message: message.to_string(),
        }
    }

    /// A memory input of the default type.
    pub fn memory_input(key: &str, value: &str) -> CreateMemoryInput {
        CreateMemoryInput {
            key: key.to_string(),
            value: value.to_string(),
            memory_type: MemoryType::Fact,
        }
    }

    /// A console event input.
    pub fn console_input(
        event_type: ConsoleEventType,
        agent: &str,
        content: &str,
    ) -> CreateConsoleEventInput {
        CreateConsoleEventInput {
            event_type,
            agent: agent.to_string(),
            content: content.to_string(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for Orchestra-specific checks.

    use super::*;

    /// Assert that validation failed with an error naming `field`.
    #[track_caller]
    pub fn assert_field_error<T: std::fmt::Debug>(
        result: &Result<T, ValidationErrors>,
        field: &str,
    ) {
        match result {
            Err(errors) => assert!(
                errors.has_field(field),
                "Expected an error for field {:?}, got: {}",
                field,
                errors
            ),
            Ok(value) => panic!("Expected validation failure for {:?}, got Ok: {:?}", field, value),
        }
    }

    /// Assert that timestamps never increase, i.e. a newest-first listing.
    #[track_caller]
    pub fn assert_newest_first(timestamps: &[Timestamp]) {
        for pair in timestamps.windows(2) {
            assert!(
                pair[0] >= pair[1],
                "Listing not newest first: {} before {}",
                pair[0],
                pair[1]
            );
        }
    }

    /// Assert that timestamps never decrease, i.e. an oldest-first listing.
    #[track_caller]
    pub fn assert_oldest_first(timestamps: &[Timestamp]) {
        for pair in timestamps.windows(2) {
            assert!(
                pair[0] <= pair[1],
                "Listing not oldest first: {} before {}",
                pair[0],
                pair[1]
            );
        }
    }
}
