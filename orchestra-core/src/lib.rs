//! Orchestra Core - Entity Types and Validation
//!
//! Pure data structures plus the schema-driven validation layer that gates
//! every write. All other crates depend on this one; it performs no I/O.

pub mod entities;
pub mod enums;
pub mod error;
pub mod schemas;
pub mod validation;

pub use entities::{display_time, Agent, ConsoleEvent, LogEntry, MemoryEntry};
pub use enums::{AgentColor, AgentStatus, ConsoleEventType, LogLevel, MemoryType, ParseEnumError};
pub use error::{OrchestraError, OrchestraResult, SchemaError, StorageError};
pub use schemas::{
    CreateAgentInput, CreateConsoleEventInput, CreateLogInput, CreateMemoryInput,
    UpdateAgentStatusInput, LOG_SOURCE_MAX_LEN,
};
pub use validation::{
    validate, FieldError, FieldKind, FieldSpec, Presence, Schema, Validate, ValidationErrors,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque identifier assigned by the store on insert.
pub type EntityId = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a fresh identifier.
///
/// UUIDv7 text embeds the creation time, so identifiers sort the same way
/// their rows were created. Stores use this as the tie-break when two rows
/// share a `createdAt`.
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_unique_and_non_empty() {
        let a = new_entity_id();
        let b = new_entity_id();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_entity_ids_sort_by_creation() {
        let ids: Vec<EntityId> = (0..32).map(|_| new_entity_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
