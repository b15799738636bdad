//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use orchestra_storage::Store;

/// Application-wide state shared across all routes.
///
/// Holds no mutable data of its own; everything a request can change lives
/// behind the [`Store`].
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}
