//! Enum types for Orchestra entities
//!
//! Every enum carries its wire spelling in one place: `as_str` for storage
//! columns, `FromStr` for reading them back, and `VALUES` for the
//! validation schemas' membership checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure to parse a stored or submitted enum value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, $rename:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(rename_all = $rename)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted wire value, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            /// Wire spelling of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, ParseEnumError> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Operational state of an agent.
    ///
    /// Any state may move to any other state through a single status update;
    /// no transition graph is enforced.
    AgentStatus, "agent status", "SCREAMING_SNAKE_CASE" {
        Running => "RUNNING",
        Idle => "IDLE",
        Error => "ERROR",
        Offline => "OFFLINE",
    }
}

impl Default for AgentStatus {
    fn default() -> Self {
        AgentStatus::Idle
    }
}

string_enum! {
    /// Display theme of an agent card.
    AgentColor, "agent color", "lowercase" {
        Blue => "blue",
        Yellow => "yellow",
        Red => "red",
        Green => "green",
        Purple => "purple",
        Aqua => "aqua",
        Orange => "orange",
    }
}

string_enum! {
    /// Severity of a log line.
    LogLevel, "log level", "SCREAMING_SNAKE_CASE" {
        /// Informational
        Inf => "INF",
        /// Warning
        Wrn => "WRN",
        /// Error
        Err => "ERR",
        /// Fatal
        Fat => "FAT",
        /// Emitted by the system itself
        Sys => "SYS",
        /// Emitted on behalf of a user
        Usr => "USR",
    }
}

string_enum! {
    /// Kind of fact an agent remembers.
    MemoryType, "memory type", "SCREAMING_SNAKE_CASE" {
        Fact => "FACT",
        Observation => "OBSERVATION",
        Synthesis => "SYNTHESIS",
    }
}

impl Default for MemoryType {
    fn default() -> Self {
        MemoryType::Fact
    }
}

string_enum! {
    /// Kind of step in a simulated orchestration exchange.
    ConsoleEventType, "console event type", "SCREAMING_SNAKE_CASE" {
        Plan => "PLAN",
        Trace => "TRACE",
        Action => "ACTION",
        Cmd => "CMD",
    }
}
