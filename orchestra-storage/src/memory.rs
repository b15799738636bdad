//! In-memory Store implementation.
//!
//! Tables are plain vectors in insertion order behind one lock, so every
//! operation observes a consistent snapshot. Suitable for development and
//! tests; nothing survives a restart.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use orchestra_core::{
    new_entity_id, Agent, AgentStatus, ConsoleEvent, CreateAgentInput, CreateConsoleEventInput,
    CreateLogInput, CreateMemoryInput, LogEntry, MemoryEntry, StorageError,
};

use crate::{Store, StorageResult};

#[derive(Debug, Default)]
struct Tables {
    agents: Vec<Agent>,
    memories: Vec<MemoryEntry>,
    logs: Vec<LogEntry>,
    console: Vec<ConsoleEvent>,
}

/// In-memory [`Store`].
///
/// Clones share the same tables.
///
/// # Example
///
/// ```rust,ignore
/// use orchestra_storage::{InMemoryStore, Store};
/// use orchestra_core::CreateAgentInput;
///
/// let store = InMemoryStore::new();
/// let agent = store.agent_insert(&CreateAgentInput::named("OMEGA-7")).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Newest `limit` rows of an insertion-ordered table, newest first.
fn newest_first<T: Clone>(rows: &[T], limit: usize) -> Vec<T> {
    rows.iter().rev().take(limit).cloned().collect()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn agent_list(&self) -> StorageResult<Vec<Agent>> {
        let tables = self.read()?;
        Ok(tables
            .agents
            .iter()
            .map(|agent| {
                let mut agent = agent.clone();
                agent.memories = tables
                    .memories
                    .iter()
                    .filter(|m| m.agent_id == agent.id)
                    .cloned()
                    .collect();
                agent
            })
            .collect())
    }

    async fn agent_get(&self, id: &str) -> StorageResult<Option<Agent>> {
        let tables = self.read()?;
        Ok(tables.agents.iter().find(|a| a.id == id).cloned())
    }

    async fn agent_insert(&self, input: &CreateAgentInput) -> StorageResult<Agent> {
        let agent = Agent {
            id: new_entity_id(),
            name: input.name.clone(),
            role: input.role.clone(),
            status: input.status,
            version: input.version.clone(),
            message: input.message.clone(),
            image_url: input.image_url.clone(),
            color: input.color,
            progress: input.progress,
            memories: Vec::new(),
        };
        self.write()?.agents.push(agent.clone());
        Ok(agent)
    }

    async fn agent_update_status(
        &self,
        id: &str,
        status: AgentStatus,
    ) -> StorageResult<Option<Agent>> {
        let mut tables = self.write()?;
        Ok(tables.agents.iter_mut().find(|a| a.id == id).map(|agent| {
            agent.status = status;
            agent.clone()
        }))
    }

    async fn agent_count(&self) -> StorageResult<u64> {
        Ok(self.read()?.agents.len() as u64)
    }

    async fn memory_insert(
        &self,
        agent_id: &str,
        input: &CreateMemoryInput,
    ) -> StorageResult<MemoryEntry> {
        let mut tables = self.write()?;
        if !tables.agents.iter().any(|a| a.id == agent_id) {
            return Err(StorageError::backend(
                "memory_insert",
                format!("agent {} does not exist", agent_id),
            ));
        }
        let memory = MemoryEntry {
            id: new_entity_id(),
            agent_id: agent_id.to_string(),
            key: input.key.clone(),
            value: input.value.clone(),
            memory_type: input.memory_type,
            created_at: Utc::now(),
        };
        tables.memories.push(memory.clone());
        Ok(memory)
    }

    async fn log_insert(&self, input: &CreateLogInput) -> StorageResult<LogEntry> {
        let entry = LogEntry {
            id: new_entity_id(),
            level: input.level,
            source: input.source.clone(),
            message: input.message.clone(),
            created_at: Utc::now(),
        };
        self.write()?.logs.push(entry.clone());
        Ok(entry)
    }

    async fn log_list_recent(&self, limit: usize) -> StorageResult<Vec<LogEntry>> {
        Ok(newest_first(&self.read()?.logs, limit))
    }

    async fn console_insert(
        &self,
        input: &CreateConsoleEventInput,
    ) -> StorageResult<ConsoleEvent> {
        let event = ConsoleEvent {
            id: new_entity_id(),
            event_type: input.event_type,
            agent: input.agent.clone(),
            content: input.content.clone(),
            created_at: Utc::now(),
        };
        self.write()?.console.push(event.clone());
        Ok(event)
    }

    async fn console_list_recent(&self, limit: usize) -> StorageResult<Vec<ConsoleEvent>> {
        Ok(newest_first(&self.read()?.console, limit))
    }

    async fn ping(&self) -> StorageResult<()> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::{ConsoleEventType, LogLevel, MemoryType};

    fn log(message: &str) -> CreateLogInput {
        CreateLogInput {
            level: LogLevel::Inf,
            source: "SYSTEM".to_string(),
            message: message.to_string(),
        }
    }

    fn memory(key: &str) -> CreateMemoryInput {
        CreateMemoryInput {
            key: key.to_string(),
            value: "v".to_string(),
            memory_type: MemoryType::Fact,
        }
    }

    #[tokio::test]
    async fn test_agent_insert_assigns_id_and_empty_memories() {
        let store = InMemoryStore::new();
        let agent = store
            .agent_insert(&CreateAgentInput::named("OMEGA-7"))
            .await
            .unwrap();
        assert!(!agent.id.is_empty());
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.memories.is_empty());
        assert_eq!(store.agent_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_agent_list_embeds_only_owned_memories() {
        let store = InMemoryStore::new();
        let a = store.agent_insert(&CreateAgentInput::named("A")).await.unwrap();
        let b = store.agent_insert(&CreateAgentInput::named("B")).await.unwrap();
        store.memory_insert(&a.id, &memory("first")).await.unwrap();
        store.memory_insert(&a.id, &memory("second")).await.unwrap();

        let agents = store.agent_list().await.unwrap();
        assert_eq!(agents.len(), 2);
        let listed_a = agents.iter().find(|x| x.id == a.id).unwrap();
        let listed_b = agents.iter().find(|x| x.id == b.id).unwrap();
        let keys: Vec<&str> = listed_a.memories.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert!(listed_b.memories.is_empty());
    }

    #[tokio::test]
    async fn test_agent_get_omits_memories() {
        let store = InMemoryStore::new();
        let a = store.agent_insert(&CreateAgentInput::named("A")).await.unwrap();
        store.memory_insert(&a.id, &memory("k")).await.unwrap();
        let fetched = store.agent_get(&a.id).await.unwrap().unwrap();
        assert!(fetched.memories.is_empty());
        assert!(store.agent_get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_status_changes_only_status() {
        let store = InMemoryStore::new();
        let mut input = CreateAgentInput::named("A");
        input.role = Some("PLANNER".to_string());
        input.progress = Some(12);
        let a = store.agent_insert(&input).await.unwrap();

        let updated = store
            .agent_update_status(&a.id, AgentStatus::Running)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, AgentStatus::Running);
        assert_eq!(updated.role, a.role);
        assert_eq!(updated.progress, a.progress);
        assert_eq!(updated.id, a.id);

        let again = store.agent_get(&a.id).await.unwrap().unwrap();
        assert_eq!(again.status, AgentStatus::Running);
    }

    #[tokio::test]
    async fn test_update_status_missing_agent() {
        let store = InMemoryStore::new();
        let result = store
            .agent_update_status("nope", AgentStatus::Error)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_memory_insert_rejects_orphan() {
        let store = InMemoryStore::new();
        let err = store.memory_insert("ghost", &memory("k")).await.unwrap_err();
        assert!(matches!(err, StorageError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_log_list_recent_newest_first_and_capped() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.log_insert(&log(&format!("m{}", i))).await.unwrap();
        }
        let recent = store.log_list_recent(3).await.unwrap();
        let messages: Vec<&str> = recent.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["m4", "m3", "m2"]);
        assert!(store.log_list_recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_console_list_recent_newest_first() {
        let store = InMemoryStore::new();
        for content in ["one", "two"] {
            store
                .console_insert(&CreateConsoleEventInput {
                    event_type: ConsoleEventType::Plan,
                    agent: "ORCHESTRATOR".to_string(),
                    content: content.to_string(),
                })
                .await
                .unwrap();
        }
        let recent = store.console_list_recent(100).await.unwrap();
        assert_eq!(recent[0].content, "two");
        assert_eq!(recent[1].content, "one");
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.log_insert(&log("shared")).await.unwrap();
        assert_eq!(other.log_list_recent(10).await.unwrap().len(), 1);
        assert!(other.ping().await.is_ok());
    }
}
