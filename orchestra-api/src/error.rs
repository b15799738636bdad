//! API Error Responses
//!
//! Every handler, extractor, and middleware reports failures through
//! [`ApiError`], so all error bodies share one JSON shape
//! (`code`, `message`, optional `details`) and [`ErrorCode`] alone decides
//! the HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orchestra_core::{StorageError, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Machine-readable failure kind, serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Client errors (400)
    // ========================================================================
    /// Request body failed schema validation
    ValidationFailed,

    /// Request body could not be read as JSON
    InvalidInput,

    // ========================================================================
    // Missing resources (404)
    // ========================================================================
    /// No agent with the path's id
    AgentNotFound,

    /// No handler matches the method and path
    RouteNotFound,

    // ========================================================================
    // Throttling and server errors (429, 500)
    // ========================================================================
    /// Per-address quota used up
    TooManyRequests,

    /// Internal server error
    InternalError,

    /// Persistence operation failed
    DatabaseError,
}

impl ErrorCode {
    /// Status sent for this kind of failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,

            ErrorCode::AgentNotFound | ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,

            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message used when the caller supplies none.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::AgentNotFound => "Agent not found",
            ErrorCode::RouteNotFound => "Route not found",
            ErrorCode::TooManyRequests => "Rate limit exceeded",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Failure kind
    pub code: ErrorCode,

    /// Client-safe description
    pub message: String,

    /// Field errors for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Error with an explicit message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Error carrying the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Attach a structured `details` payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Status this error is sent with.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    /// 400 with every field error in `details`.
    pub fn validation_failed(errors: &ValidationErrors) -> Self {
        let details = serde_json::to_value(errors).unwrap_or(serde_json::Value::Null);
        Self::from_code(ErrorCode::ValidationFailed).with_details(details)
    }

    /// 400 for a body that is not JSON.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// 404 naming the missing agent.
    pub fn agent_not_found(agent_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::AgentNotFound,
            format!("Agent {} not found", agent_id),
        )
    }

    pub fn route_not_found() -> Self {
        Self::from_code(ErrorCode::RouteNotFound)
    }

    /// 500 with a caller-chosen message.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// 429, optionally telling the client how long to wait.
    pub fn too_many_requests(retry_after_secs: Option<u64>) -> Self {
        let message = match retry_after_secs {
            Some(secs) => format!("Rate limit exceeded. Retry after {} seconds", secs),
            None => "Rate limit exceeded".to_string(),
        };
        Self::new(ErrorCode::TooManyRequests, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Store failures are logged in full and reported without internal detail.
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage operation failed");
        ApiError::from_code(ErrorCode::DatabaseError)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation_failed(&errors)
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result returned by handlers and startup code.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::FieldError;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::AgentNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::RouteNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::TooManyRequests.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorCode::DatabaseError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_shape() -> Result<(), serde_json::Error> {
        let mut errors = ValidationErrors::new();
        errors.push(FieldError::new("name", "Required"));
        errors.push(FieldError::new("progress", "Expected integer, received float"));

        let json = serde_json::to_value(ApiError::from(errors))?;
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["details"][0]["field"], "name");
        assert_eq!(json["details"][1]["field"], "progress");
        Ok(())
    }

    #[test]
    fn test_storage_error_hides_detail() {
        let err = ApiError::from(StorageError::backend("agent_insert", "password=hunter2"));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_agent_not_found_message() {
        let err = ApiError::agent_not_found("agent-does-not-exist");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.message.contains("agent-does-not-exist"));
    }

    #[test]
    fn test_error_serialization_omits_empty_details() -> Result<(), serde_json::Error> {
        let err = ApiError::route_not_found();
        let json = serde_json::to_string(&err)?;
        assert!(json.contains("ROUTE_NOT_FOUND"));
        assert!(!json.contains("details"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }
}
