//! Request body extractors.
//!
//! Axum's `Json<T>` rejects a body the moment serde disagrees with it and
//! reports only the first problem. These extractors split that in two: the
//! body must parse as JSON (otherwise `INVALID_INPUT`), and the parsed value
//! then goes through the schema so every field error comes back at once.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use orchestra_core::{validate, Validate};
use serde_json::Value;

use crate::error::ApiError;

/// A request body that parsed as JSON but has not been validated.
#[derive(Debug, Clone)]
pub struct JsonPayload(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::invalid_input(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// A request body that passed `T`'s schema, with defaults applied.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonPayload(value) = JsonPayload::from_request(req, state).await?;
        Ok(Self(validate::<T>(&value)?))
    }
}
