//! Orchestra Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the persistence abstraction the API layer talks to. The
//! PostgreSQL implementation lives in orchestra-api; the in-memory one here
//! backs development mode and the test suites.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use orchestra_core::{
    Agent, AgentStatus, ConsoleEvent, CreateAgentInput, CreateConsoleEventInput, CreateLogInput,
    CreateMemoryInput, LogEntry, MemoryEntry, StorageError,
};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Async storage trait for the four Orchestra record kinds.
///
/// Every method is a single atomic store operation. Identifiers and
/// `createdAt` timestamps are assigned here, never by callers.
#[async_trait]
pub trait Store: Send + Sync {
    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    /// List every agent with its memories embedded.
    async fn agent_list(&self) -> StorageResult<Vec<Agent>>;

    /// Get an agent by ID, without its memories.
    async fn agent_get(&self, id: &str) -> StorageResult<Option<Agent>>;

    /// Insert a new agent under a fresh identifier.
    async fn agent_insert(&self, input: &CreateAgentInput) -> StorageResult<Agent>;

    /// Set an agent's status. Returns `None` when no such agent exists.
    async fn agent_update_status(
        &self,
        id: &str,
        status: AgentStatus,
    ) -> StorageResult<Option<Agent>>;

    /// Number of stored agents.
    async fn agent_count(&self) -> StorageResult<u64>;

    // ========================================================================
    // MEMORY OPERATIONS
    // ========================================================================

    /// Insert a memory owned by `agent_id`. Callers confirm the agent exists
    /// first; backends with foreign keys reject orphans on their own.
    async fn memory_insert(
        &self,
        agent_id: &str,
        input: &CreateMemoryInput,
    ) -> StorageResult<MemoryEntry>;

    // ========================================================================
    // LOG OPERATIONS
    // ========================================================================

    /// Append a log entry.
    async fn log_insert(&self, input: &CreateLogInput) -> StorageResult<LogEntry>;

    /// The `limit` most recent log entries, newest first.
    async fn log_list_recent(&self, limit: usize) -> StorageResult<Vec<LogEntry>>;

    // ========================================================================
    // CONSOLE OPERATIONS
    // ========================================================================

    /// Append a console event.
    async fn console_insert(&self, input: &CreateConsoleEventInput)
        -> StorageResult<ConsoleEvent>;

    /// The `limit` most recent console events, newest first.
    async fn console_list_recent(&self, limit: usize) -> StorageResult<Vec<ConsoleEvent>>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Cheap round trip to the backend.
    async fn ping(&self) -> StorageResult<()>;
}
