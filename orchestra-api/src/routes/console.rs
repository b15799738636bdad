//! Console Event REST API Routes
//!
//! Reads come back oldest first so a client can render them as a transcript.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use orchestra_core::CreateConsoleEventInput;

use crate::{
    constants::RECENT_CONSOLE_LIMIT,
    error::ApiResult,
    extractors::ValidatedJson,
    routes::route_not_found,
    state::AppState,
    types::ConsoleEventResponse,
};

/// GET /api/console - Most recent events, oldest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/console",
    tag = "Console",
    responses(
        (status = 200, description = "Up to 100 events, oldest first", body = Vec<ConsoleEventResponse>),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
))]
pub async fn list_console_events(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let events = state.store.console_list_recent(RECENT_CONSOLE_LIMIT).await?;
    // Store order is newest first.
    let body: Vec<ConsoleEventResponse> = events.into_iter().rev().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /api/console - Append an event
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/console",
    tag = "Console",
    request_body = CreateConsoleEventInput,
    responses(
        (status = 201, description = "Event appended", body = ConsoleEventResponse),
        (status = 400, description = "Validation failed", body = crate::error::ApiError),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    ),
))]
pub async fn create_console_event(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateConsoleEventInput>,
) -> ApiResult<impl IntoResponse> {
    let event = state.store.console_insert(&input).await?;
    Ok((StatusCode::CREATED, Json(ConsoleEventResponse::from(event))))
}

/// Create the console router, mounted at `/api/console`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(list_console_events)
                .post(create_console_event)
                .fallback(route_not_found),
        )
        .with_state(state)
}
