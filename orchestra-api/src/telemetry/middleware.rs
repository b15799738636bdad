//! Axum Middleware for HTTP Request Tracing
//!
//! Wraps every request in an `http_request` span and logs one completion
//! line with status and latency.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{info_span, Instrument};

/// Normalize a path for span fields, replacing agent ids with `{id}`.
///
/// Keeps the `http.route` field low-cardinality.
pub fn normalize_path(path: &str) -> String {
    let mut previous = "";
    path.split('/')
        .map(|segment| {
            let normalized = if previous == "agents" && !segment.is_empty() {
                "{id}"
            } else {
                segment
            };
            previous = segment;
            normalized
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Observability middleware for Axum.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let normalized_path = normalize_path(&path);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %normalized_path,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_agent_id() {
        let path = "/api/agents/0192f3a4-7b1c-7d2e-8f90-a1b2c3d4e5f6/status";
        assert_eq!(normalize_path(path), "/api/agents/{id}/status");
    }

    #[test]
    fn test_normalize_path_memory() {
        assert_eq!(normalize_path("/api/agents/abc/memory"), "/api/agents/{id}/memory");
    }

    #[test]
    fn test_normalize_path_collection() {
        assert_eq!(normalize_path("/api/agents"), "/api/agents");
        assert_eq!(normalize_path("/api/agents/"), "/api/agents/");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/logs"), "/api/logs");
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
