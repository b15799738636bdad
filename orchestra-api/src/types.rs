//! Response shapes that add derived fields to stored entities.
//!
//! The display time is computed from `createdAt` on every read and never
//! persisted.

use orchestra_core::{display_time, ConsoleEvent, LogEntry};
use serde::{Deserialize, Serialize};

/// A log entry plus its local `HH:MM:SS` time of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LogEntryResponse {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub timestamp: String,
}

impl From<LogEntry> for LogEntryResponse {
    fn from(entry: LogEntry) -> Self {
        let timestamp = display_time(&entry.created_at);
        Self { entry, timestamp }
    }
}

/// A console event plus its local `HH:MM:SS` time of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConsoleEventResponse {
    #[serde(flatten)]
    pub event: ConsoleEvent,
    pub time: String,
}

impl From<ConsoleEvent> for ConsoleEventResponse {
    fn from(event: ConsoleEvent) -> Self {
        let time = display_time(&event.created_at);
        Self { event, time }
    }
}
