//! Orchestra API - REST Layer for Orchestra OS
//!
//! Axum handlers for agents, memories, audit logs, and console events.
//! Every write passes the validation layer in `orchestra-core` before it
//! reaches a [`orchestra_storage::Store`]; errors share one JSON shape.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod seed;
pub mod shutdown;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, LogFormat, ServerConfig, StoreKind};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use seed::{seed_store, SeedOutcome};
pub use state::AppState;
pub use types::{ConsoleEventResponse, LogEntryResponse};
