//! Orchestra Telemetry - Logging Infrastructure
//!
//! Subscriber setup and per-request tracing for the API layer.

pub mod middleware;
pub mod tracer;

pub use middleware::{normalize_path, observability_middleware};
pub use tracer::init_tracing;
