//! Request schemas
//!
//! One schema per write operation. Each schema is paired with a typed input
//! whose serde names match the schema's field paths, so a validated payload
//! deserializes without further checks.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::enums::{AgentColor, AgentStatus, ConsoleEventType, LogLevel, MemoryType};
use crate::validation::{FieldSpec, Schema, Validate};

/// Build a schema declared in this module. A failure here is a defect in
/// the declaration, not in any request, so it aborts startup.
fn declare(name: &'static str, fields: Vec<FieldSpec>) -> Schema {
    match Schema::new(name, fields) {
        Ok(schema) => schema,
        Err(e) => panic!("invalid built-in schema: {}", e),
    }
}

pub static CREATE_AGENT: Lazy<Schema> = Lazy::new(|| {
    declare(
        "CreateAgent",
        vec![
            FieldSpec::string("name").min_len(1).max_len(100),
            FieldSpec::string("role").min_len(1).max_len(100).optional(),
            FieldSpec::enumeration("status", AgentStatus::VALUES).default_value(json!("IDLE")),
            FieldSpec::string("version").max_len(20).optional(),
            FieldSpec::string("message").max_len(500).optional(),
            FieldSpec::string("imageUrl").max_len(500).optional(),
            FieldSpec::enumeration("color", AgentColor::VALUES).optional(),
            FieldSpec::integer("progress").min(0.0).max(100.0).optional(),
        ],
    )
});

/// Longest accepted `LogEntry.source`, in characters.
pub const LOG_SOURCE_MAX_LEN: usize = 50;

pub static CREATE_LOG: Lazy<Schema> = Lazy::new(|| {
    declare(
        "CreateLog",
        vec![
            FieldSpec::enumeration("level", LogLevel::VALUES),
            FieldSpec::string("source").min_len(1).max_len(LOG_SOURCE_MAX_LEN),
            FieldSpec::string("message").min_len(1).max_len(500),
        ],
    )
});

pub static CREATE_MEMORY: Lazy<Schema> = Lazy::new(|| {
    declare(
        "CreateMemory",
        vec![
            FieldSpec::string("key").min_len(1).max_len(100),
            FieldSpec::string("value").min_len(1).max_len(2000),
            FieldSpec::enumeration("type", MemoryType::VALUES).default_value(json!("FACT")),
        ],
    )
});

pub static UPDATE_AGENT_STATUS: Lazy<Schema> = Lazy::new(|| {
    declare(
        "UpdateAgentStatus",
        vec![FieldSpec::enumeration("status", AgentStatus::VALUES)],
    )
});

pub static CREATE_CONSOLE_EVENT: Lazy<Schema> = Lazy::new(|| {
    declare(
        "CreateConsoleEvent",
        vec![
            FieldSpec::enumeration("type", ConsoleEventType::VALUES),
            FieldSpec::string("agent").min_len(1).max_len(100),
            FieldSpec::string("content").min_len(1).max_len(2000),
        ],
    )
});

// ============================================================================
// TYPED INPUTS
// ============================================================================

/// Validated body of `POST /api/agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<AgentColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
}

impl CreateAgentInput {
    /// Minimal input: a name, everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            status: AgentStatus::default(),
            version: None,
            message: None,
            image_url: None,
            color: None,
            progress: None,
        }
    }
}

impl Validate for CreateAgentInput {
    fn schema() -> &'static Schema {
        &CREATE_AGENT
    }
}

/// Validated body of `POST /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateLogInput {
    pub level: LogLevel,
    pub source: String,
    pub message: String,
}

impl Validate for CreateLogInput {
    fn schema() -> &'static Schema {
        &CREATE_LOG
    }
}

/// Validated body of `POST /api/agents/{id}/memory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateMemoryInput {
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub memory_type: MemoryType,
}

impl Validate for CreateMemoryInput {
    fn schema() -> &'static Schema {
        &CREATE_MEMORY
    }
}

/// Validated body of `PUT /api/agents/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateAgentStatusInput {
    pub status: AgentStatus,
}

impl Validate for UpdateAgentStatusInput {
    fn schema() -> &'static Schema {
        &UPDATE_AGENT_STATUS
    }
}

/// Validated body of `POST /api/console`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateConsoleEventInput {
    #[serde(rename = "type")]
    pub event_type: ConsoleEventType,
    pub agent: String,
    pub content: String,
}

impl Validate for CreateConsoleEventInput {
    fn schema() -> &'static Schema {
        &CREATE_CONSOLE_EVENT
    }
}
