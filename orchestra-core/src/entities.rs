//! Persisted entities
//!
//! All four record kinds are append-only aggregates; the only in-place
//! mutation anywhere is [`Agent::status`].

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::enums::{AgentColor, AgentStatus, ConsoleEventType, LogLevel, MemoryType};
use crate::{EntityId, Timestamp};

/// A named simulated process with a display identity and operational state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: EntityId,
    pub name: String,
    pub role: Option<String>,
    pub status: AgentStatus,
    pub version: Option<String>,
    pub message: Option<String>,
    pub image_url: Option<String>,
    pub color: Option<AgentColor>,
    pub progress: Option<i32>,
    /// Owned memories. Only populated by listing; single-agent responses
    /// carry an empty list.
    #[serde(default)]
    pub memories: Vec<MemoryEntry>,
}

/// A fact or observation attributed to exactly one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub id: EntityId,
    pub agent_id: EntityId,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// An immutable audit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: EntityId,
    pub level: LogLevel,
    /// Emitting agent or system component
    pub source: String,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// An immutable record of one step in a simulated orchestration exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEvent {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub event_type: ConsoleEventType,
    /// Free-text label, not a reference to an [`Agent`]
    pub agent: String,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

/// Local time of day as `HH:MM:SS` on a 24-hour clock.
///
/// Derived for display on every read; never stored.
pub fn display_time(ts: &Timestamp) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};

    #[test]
    fn test_display_time_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 23, 5, 7).unwrap();
        let shown = display_time(&ts);
        assert_eq!(shown.len(), 8);
        let local = ts.with_timezone(&Local);
        assert_eq!(
            shown,
            format!("{:02}:{:02}:{:02}", local.hour(), local.minute(), local.second())
        );
    }

    #[test]
    fn test_display_time_is_stable() {
        let ts = Utc::now();
        assert_eq!(display_time(&ts), display_time(&ts));
    }

    #[test]
    fn test_agent_serializes_camel_case() {
        let agent = Agent {
            id: "a1".to_string(),
            name: "OMEGA-7".to_string(),
            role: None,
            status: AgentStatus::Idle,
            version: None,
            message: None,
            image_url: Some("https://example.com/a.png".to_string()),
            color: Some(AgentColor::Blue),
            progress: Some(40),
            memories: Vec::new(),
        };
        let json = serde_json::to_value(&agent).unwrap();
        assert_eq!(json["imageUrl"], "https://example.com/a.png");
        assert_eq!(json["status"], "IDLE");
        assert_eq!(json["color"], "blue");
        assert!(json["role"].is_null());
        assert_eq!(json["memories"], serde_json::json!([]));
    }

    #[test]
    fn test_memory_and_console_use_type_key() {
        let memory = MemoryEntry {
            id: "m1".to_string(),
            agent_id: "a1".to_string(),
            key: "k".to_string(),
            value: "v".to_string(),
            memory_type: MemoryType::Observation,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&memory).unwrap();
        assert_eq!(json["type"], "OBSERVATION");
        assert_eq!(json["agentId"], "a1");
        assert!(json.get("createdAt").is_some());

        let event = ConsoleEvent {
            id: "c1".to_string(),
            event_type: ConsoleEventType::Plan,
            agent: "ORCHESTRATOR".to_string(),
            content: "step".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PLAN");
    }
}
