//! Constants for Orchestra API
//!
//! Centralizing constants makes them easy to find, modify, and test.

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3002;

/// Body of `GET /`
pub const ROOT_STATUS_TEXT: &str = "Orchestra OS API - Status: ONLINE";

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// RATE LIMITING
// ============================================================================

/// Default requests allowed per window per client address
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 100;

/// Default rate limit window in seconds (15 minutes)
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 900;

/// Requests between sweeps of limiters idle for a whole window
pub const RATE_LIMIT_SWEEP_EVERY: u64 = 1024;

// ============================================================================
// READS
// ============================================================================

/// Maximum number of log entries returned by `GET /api/logs`
pub const RECENT_LOG_LIMIT: usize = 100;

/// Maximum number of console events returned by `GET /api/console`
pub const RECENT_CONSOLE_LIMIT: usize = 100;

// ============================================================================
// AUDIT
// ============================================================================

/// Log source for entries written by the API on behalf of the system
pub const ORCHESTRATOR_SOURCE: &str = "ORCHESTRATOR";

// ============================================================================
// ACTIVITY FEED
// ============================================================================

/// Default activity feed period in seconds
pub const DEFAULT_ACTIVITY_FEED_INTERVAL_SECS: u64 = 3;

/// Chance that a cycle emits an entry while no agent is running
pub const IDLE_EMIT_PROBABILITY: f64 = 0.2;
