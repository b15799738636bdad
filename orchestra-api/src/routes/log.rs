//! Log REST API Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use orchestra_core::CreateLogInput;

use crate::{
    constants::RECENT_LOG_LIMIT,
    error::ApiResult,
    extractors::ValidatedJson,
    routes::route_not_found,
    state::AppState,
    types::LogEntryResponse,
};

/// GET /api/logs - Most recent entries, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/logs",
    tag = "Logs",
    responses(
        (status = 200, description = "Up to 100 entries, newest first", body = Vec<LogEntryResponse>),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
))]
pub async fn list_logs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let entries = state.store.log_list_recent(RECENT_LOG_LIMIT).await?;
    let body: Vec<LogEntryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/logs - Append an entry
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/logs",
    tag = "Logs",
    request_body = CreateLogInput,
    responses(
        (status = 201, description = "Entry appended", body = orchestra_core::LogEntry),
        (status = 400, description = "Validation failed", body = crate::error::ApiError),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
))]
pub async fn create_log(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateLogInput>,
) -> ApiResult<impl IntoResponse> {
    let entry = state.store.log_insert(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Create the log router, mounted at `/api/logs`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_logs).post(create_log).fallback(route_not_found))
        .with_state(state)
}
