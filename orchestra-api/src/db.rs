//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and [`PgStore`],
//! the production [`Store`] implementation. The schema lives in
//! `migrations/001_init.sql` and is applied idempotently at startup.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use orchestra_core::{
    new_entity_id, Agent, AgentColor, AgentStatus, ConsoleEvent, ConsoleEventType,
    CreateAgentInput, CreateConsoleEventInput, CreateLogInput, CreateMemoryInput, LogEntry,
    LogLevel, MemoryEntry, MemoryType, StorageError, Timestamp,
};
use orchestra_storage::{StorageResult, Store};
use tokio_postgres::{NoTls, Row};

const SCHEMA_SQL: &str = include_str!("../migrations/001_init.sql");

const AGENT_COLUMNS: &str = "id, name, role, status, version, message, image_url, color, progress";
const MEMORY_COLUMNS: &str = "id, agent_id, key, value, type, created_at";
const LOG_COLUMNS: &str = "id, level, source, message, created_at";
const CONSOLE_COLUMNS: &str = "id, type, agent, content, created_at";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a free connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "orchestra".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("ORCHESTRA_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("ORCHESTRA_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("ORCHESTRA_DB_NAME").unwrap_or_else(|_| "orchestra".to_string()),
            user: std::env::var("ORCHESTRA_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("ORCHESTRA_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("ORCHESTRA_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("ORCHESTRA_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first query does that.
    pub fn create_pool(&self) -> StorageResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                ..Timeouts::default()
            },
            ..PoolConfig::default()
        });

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::Pool {
                reason: format!("Failed to create pool: {}", e),
            })
    }
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn db_error(operation: &'static str) -> impl Fn(tokio_postgres::Error) -> StorageError {
    move |e| StorageError::backend(operation, e)
}

fn column<'a, T>(row: &'a Row, entity: &'static str, name: &str) -> StorageResult<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name).map_err(|e| StorageError::CorruptRow {
        entity,
        reason: format!("column {}: {}", name, e),
    })
}

fn parse_enum<T>(entity: &'static str, raw: &str) -> StorageResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| StorageError::CorruptRow {
        entity,
        reason: e.to_string(),
    })
}

fn agent_from_row(row: &Row) -> StorageResult<Agent> {
    let status: String = column(row, "agent", "status")?;
    let color: Option<String> = column(row, "agent", "color")?;
    Ok(Agent {
        id: column(row, "agent", "id")?,
        name: column(row, "agent", "name")?,
        role: column(row, "agent", "role")?,
        status: parse_enum::<AgentStatus>("agent", &status)?,
        version: column(row, "agent", "version")?,
        message: column(row, "agent", "message")?,
        image_url: column(row, "agent", "image_url")?,
        color: color
            .map(|c| parse_enum::<AgentColor>("agent", &c))
            .transpose()?,
        progress: column(row, "agent", "progress")?,
        memories: Vec::new(),
    })
}

fn memory_from_row(row: &Row) -> StorageResult<MemoryEntry> {
    let memory_type: String = column(row, "memory", "type")?;
    Ok(MemoryEntry {
        id: column(row, "memory", "id")?,
        agent_id: column(row, "memory", "agent_id")?,
        key: column(row, "memory", "key")?,
        value: column(row, "memory", "value")?,
        memory_type: parse_enum::<MemoryType>("memory", &memory_type)?,
        created_at: column::<Timestamp>(row, "memory", "created_at")?,
    })
}

fn log_from_row(row: &Row) -> StorageResult<LogEntry> {
    let level: String = column(row, "log", "level")?;
    Ok(LogEntry {
        id: column(row, "log", "id")?,
        level: parse_enum::<LogLevel>("log", &level)?,
        source: column(row, "log", "source")?,
        message: column(row, "log", "message")?,
        created_at: column::<Timestamp>(row, "log", "created_at")?,
    })
}

fn console_from_row(row: &Row) -> StorageResult<ConsoleEvent> {
    let event_type: String = column(row, "console", "type")?;
    Ok(ConsoleEvent {
        id: column(row, "console", "id")?,
        event_type: parse_enum::<ConsoleEventType>("console", &event_type)?,
        agent: column(row, "console", "agent")?,
        content: column(row, "console", "content")?,
        created_at: column::<Timestamp>(row, "console", "created_at")?,
    })
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// [`Store`] backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Create a store over an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a store from configuration.
    pub fn from_config(config: &DbConfig) -> StorageResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create missing tables and indexes.
    pub async fn migrate(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA_SQL)
            .await
            .map_err(|e| StorageError::Migration {
                reason: e.to_string(),
            })?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> StorageResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| StorageError::Pool {
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl Store for PgStore {
    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    async fn agent_list(&self) -> StorageResult<Vec<Agent>> {
        let conn = self.get_conn().await?;

        let agent_rows = conn
            .query(
                &format!("SELECT {} FROM agents ORDER BY created_at, id", AGENT_COLUMNS),
                &[],
            )
            .await
            .map_err(db_error("agent_list"))?;

        let memory_rows = conn
            .query(
                &format!(
                    "SELECT {} FROM memory_entries ORDER BY created_at, id",
                    MEMORY_COLUMNS
                ),
                &[],
            )
            .await
            .map_err(db_error("agent_list"))?;

        let mut memories: HashMap<String, Vec<MemoryEntry>> = HashMap::new();
        for row in &memory_rows {
            let memory = memory_from_row(row)?;
            memories.entry(memory.agent_id.clone()).or_default().push(memory);
        }

        agent_rows
            .iter()
            .map(|row| {
                let mut agent = agent_from_row(row)?;
                agent.memories = memories.remove(&agent.id).unwrap_or_default();
                Ok(agent)
            })
            .collect()
    }

    async fn agent_get(&self, id: &str) -> StorageResult<Option<Agent>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                &format!("SELECT {} FROM agents WHERE id = $1", AGENT_COLUMNS),
                &[&id],
            )
            .await
            .map_err(db_error("agent_get"))?;
        row.as_ref().map(agent_from_row).transpose()
    }

    async fn agent_insert(&self, input: &CreateAgentInput) -> StorageResult<Agent> {
        let conn = self.get_conn().await?;
        let id = new_entity_id();
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO agents (id, name, role, status, version, message, image_url, color, progress) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
                    AGENT_COLUMNS
                ),
                &[
                    &id,
                    &input.name,
                    &input.role,
                    &input.status.as_str(),
                    &input.version,
                    &input.message,
                    &input.image_url,
                    &input.color.map(|c| c.as_str()),
                    &input.progress,
                ],
            )
            .await
            .map_err(db_error("agent_insert"))?;
        agent_from_row(&row)
    }

    async fn agent_update_status(
        &self,
        id: &str,
        status: AgentStatus,
    ) -> StorageResult<Option<Agent>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                &format!(
                    "UPDATE agents SET status = $2 WHERE id = $1 RETURNING {}",
                    AGENT_COLUMNS
                ),
                &[&id, &status.as_str()],
            )
            .await
            .map_err(db_error("agent_update_status"))?;
        row.as_ref().map(agent_from_row).transpose()
    }

    async fn agent_count(&self) -> StorageResult<u64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one("SELECT COUNT(*) FROM agents", &[])
            .await
            .map_err(db_error("agent_count"))?;
        let count: i64 = column(&row, "agent", "count")?;
        Ok(count.max(0) as u64)
    }

    // ========================================================================
    // MEMORY OPERATIONS
    // ========================================================================

    async fn memory_insert(
        &self,
        agent_id: &str,
        input: &CreateMemoryInput,
    ) -> StorageResult<MemoryEntry> {
        let conn = self.get_conn().await?;
        let id = new_entity_id();
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO memory_entries (id, agent_id, key, value, type) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING {}",
                    MEMORY_COLUMNS
                ),
                &[
                    &id,
                    &agent_id,
                    &input.key,
                    &input.value,
                    &input.memory_type.as_str(),
                ],
            )
            .await
            .map_err(db_error("memory_insert"))?;
        memory_from_row(&row)
    }

    // ========================================================================
    // LOG OPERATIONS
    // ========================================================================

    async fn log_insert(&self, input: &CreateLogInput) -> StorageResult<LogEntry> {
        let conn = self.get_conn().await?;
        let id = new_entity_id();
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO log_entries (id, level, source, message) \
                     VALUES ($1, $2, $3, $4) RETURNING {}",
                    LOG_COLUMNS
                ),
                &[&id, &input.level.as_str(), &input.source, &input.message],
            )
            .await
            .map_err(db_error("log_insert"))?;
        log_from_row(&row)
    }

    async fn log_list_recent(&self, limit: usize) -> StorageResult<Vec<LogEntry>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM log_entries ORDER BY created_at DESC, id DESC LIMIT $1",
                    LOG_COLUMNS
                ),
                &[&limit_param(limit)],
            )
            .await
            .map_err(db_error("log_list_recent"))?;
        rows.iter().map(log_from_row).collect()
    }

    // ========================================================================
    // CONSOLE OPERATIONS
    // ========================================================================

    async fn console_insert(
        &self,
        input: &CreateConsoleEventInput,
    ) -> StorageResult<ConsoleEvent> {
        let conn = self.get_conn().await?;
        let id = new_entity_id();
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO console_events (id, type, agent, content) \
                     VALUES ($1, $2, $3, $4) RETURNING {}",
                    CONSOLE_COLUMNS
                ),
                &[
                    &id,
                    &input.event_type.as_str(),
                    &input.agent,
                    &input.content,
                ],
            )
            .await
            .map_err(db_error("console_insert"))?;
        console_from_row(&row)
    }

    async fn console_list_recent(&self, limit: usize) -> StorageResult<Vec<ConsoleEvent>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM console_events ORDER BY created_at DESC, id DESC LIMIT $1",
                    CONSOLE_COLUMNS
                ),
                &[&limit_param(limit)],
            )
            .await
            .map_err(db_error("console_list_recent"))?;
        rows.iter().map(console_from_row).collect()
    }

    // ========================================================================
    // HEALTH
    // ========================================================================

    async fn ping(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.execute("SELECT 1", &[])
            .await
            .map_err(db_error("ping"))?;
        Ok(())
    }
}
