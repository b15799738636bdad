//! OpenAPI Specification for Orchestra API
//!
//! Generated by utoipa from the route annotations and the entity types in
//! `orchestra-core`. Served at `/openapi.json` and printed by the
//! `generate-openapi` binary.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{agent, console, health, log};
use crate::types::{ConsoleEventResponse, LogEntryResponse};

use orchestra_core::{
    Agent, AgentColor, AgentStatus, ConsoleEvent, ConsoleEventType, CreateAgentInput,
    CreateConsoleEventInput, CreateLogInput, CreateMemoryInput, FieldError, LogEntry, LogLevel,
    MemoryEntry, MemoryType, UpdateAgentStatusInput,
};

/// OpenAPI document for Orchestra API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orchestra OS API",
        version = "0.2.0",
        description = "Agents, memories, audit logs, and console events for the Orchestra OS dashboard",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3002", description = "Local Development")
    ),
    tags(
        (name = "Agents", description = "Agent registry, status changes, and memories"),
        (name = "Logs", description = "Append-only audit log"),
        (name = "Console", description = "Orchestration transcript events"),
        (name = "Health", description = "Liveness and readiness checks")
    ),
    paths(
        agent::list_agents,
        agent::create_agent,
        agent::update_agent_status,
        agent::create_memory,
        log::list_logs,
        log::create_log,
        console::list_console_events,
        console::create_console_event,
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // === Errors ===
            ApiError, ErrorCode, FieldError,

            // === Entities ===
            Agent, MemoryEntry, LogEntry, ConsoleEvent,
            AgentStatus, AgentColor, LogLevel, MemoryType, ConsoleEventType,

            // === Requests ===
            CreateAgentInput, UpdateAgentStatusInput, CreateMemoryInput,
            CreateLogInput, CreateConsoleEventInput,

            // === Responses ===
            LogEntryResponse, ConsoleEventResponse,
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Render the OpenAPI document as pretty-printed JSON.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
