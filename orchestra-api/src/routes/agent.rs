//! Agent REST API Routes
//!
//! Listing, creation, status updates, and memory creation. Every write is
//! validated before the store is touched, and agent existence is confirmed
//! before any write scoped under an agent id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use orchestra_core::{
    validate, AgentStatus, CreateAgentInput, CreateLogInput, CreateMemoryInput, LogLevel,
    UpdateAgentStatusInput,
};
use orchestra_storage::Store;

use crate::{
    constants::ORCHESTRATOR_SOURCE,
    error::{ApiError, ApiResult},
    extractors::{JsonPayload, ValidatedJson},
    routes::route_not_found,
    state::AppState,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/agents - List every agent with its memories embedded
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "All agents with memories", body = Vec<orchestra_core::Agent>),
        (status = 500, description = "Store failure", body = ApiError),
    ),
))]
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let agents = state.store.agent_list().await?;
    Ok(Json(agents))
}

/// POST /api/agents - Create an agent
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/agents",
    tag = "Agents",
    request_body = CreateAgentInput,
    responses(
        (status = 201, description = "Agent created", body = orchestra_core::Agent),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError),
    ),
))]
pub async fn create_agent(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateAgentInput>,
) -> ApiResult<impl IntoResponse> {
    let agent = state.store.agent_insert(&input).await?;
    tracing::debug!(agent_id = %agent.id, name = %agent.name, "Agent created");
    Ok((StatusCode::CREATED, Json(agent)))
}

/// PUT /api/agents/{id}/status - Set an agent's status
///
/// Any status may follow any other. The audit log entry is written after
/// the status change and is best-effort: if it fails the new status stands
/// and the caller still gets 200.
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/agents/{id}/status",
    tag = "Agents",
    params(("id" = String, Path, description = "Agent id")),
    request_body = UpdateAgentStatusInput,
    responses(
        (status = 200, description = "Status updated", body = orchestra_core::Agent),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError),
    ),
))]
pub async fn update_agent_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateAgentStatusInput>,
) -> ApiResult<impl IntoResponse> {
    if state.store.agent_get(&id).await?.is_none() {
        return Err(ApiError::agent_not_found(&id));
    }

    // A concurrent writer may win between the check and the update; the
    // store's answer is authoritative.
    let agent = state
        .store
        .agent_update_status(&id, input.status)
        .await?
        .ok_or_else(|| ApiError::agent_not_found(&id))?;

    record_status_change(state.store.as_ref(), &agent.name, input.status).await;

    Ok(Json(agent))
}

async fn record_status_change(store: &dyn Store, agent_name: &str, status: AgentStatus) {
    let entry = CreateLogInput {
        level: LogLevel::Sys,
        source: ORCHESTRATOR_SOURCE.to_string(),
        message: format!("Agent {} status update: {}", agent_name, status),
    };
    if let Err(e) = store.log_insert(&entry).await {
        tracing::warn!(
            error = %e,
            agent = %agent_name,
            status = %status,
            "Status changed but audit log entry could not be written"
        );
    }
}

/// POST /api/agents/{id}/memory - Attach a memory to an agent
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/agents/{id}/memory",
    tag = "Agents",
    params(("id" = String, Path, description = "Agent id")),
    request_body = CreateMemoryInput,
    responses(
        (status = 201, description = "Memory created", body = orchestra_core::MemoryEntry),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
        (status = 500, description = "Store failure", body = ApiError),
    ),
))]
pub async fn create_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> ApiResult<impl IntoResponse> {
    if state.store.agent_get(&id).await?.is_none() {
        return Err(ApiError::agent_not_found(&id));
    }

    let input: CreateMemoryInput = validate(&payload)?;
    let memory = state.store.memory_insert(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(memory)))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the agent router, mounted at `/api/agents`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(list_agents).post(create_agent).fallback(route_not_found),
        )
        .route("/:id/status", put(update_agent_status).fallback(route_not_found))
        .route("/:id/memory", post(create_memory).fallback(route_not_found))
        .with_state(state)
}
