//! Activity Feed Background Task
//!
//! Periodically appends a randomized log line so a dashboard has something
//! to show. Sources are drawn from the running agents plus a few system
//! components; while nothing is running the feed mostly stays quiet.
//!
//! The task owns its RNG and talks to handlers only through the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orchestra_core::{AgentStatus, CreateLogInput, LogLevel, LOG_SOURCE_MAX_LEN};
use orchestra_storage::Store;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::constants::{DEFAULT_ACTIVITY_FEED_INTERVAL_SECS, IDLE_EMIT_PROBABILITY};

/// Weighted toward informational lines.
const LEVELS: [LogLevel; 5] = [
    LogLevel::Inf,
    LogLevel::Inf,
    LogLevel::Inf,
    LogLevel::Sys,
    LogLevel::Wrn,
];

const SYSTEM_SOURCES: [&str; 3] = ["SYSTEM", "NETWORK", "SECURITY"];

const MESSAGES: [&str; 9] = [
    "Processing data packet...",
    "Optimizing neural weights...",
    "Connection stabilised.",
    "Buffer flush initiated.",
    "Garbage collection running...",
    "Ping response: 12ms",
    "Validating API schema...",
    "Syncing state with cluster...",
    "Memory usage nominal.",
];

const MIN_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the activity feed task.
#[derive(Debug, Clone)]
pub struct ActivityFeedConfig {
    /// Whether the server should spawn the task at all (default: false)
    pub enabled: bool,

    /// Time between cycles (default: 3 seconds)
    pub interval: Duration,
}

impl Default for ActivityFeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(DEFAULT_ACTIVITY_FEED_INTERVAL_SECS),
        }
    }
}

impl ActivityFeedConfig {
    /// Create ActivityFeedConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `ORCHESTRA_ACTIVITY_FEED_ENABLED`: "true" to run the feed (default: false)
    /// - `ORCHESTRA_ACTIVITY_FEED_INTERVAL_SECS`: Cycle period (default: 3)
    pub fn from_env() -> Self {
        let enabled = std::env::var("ORCHESTRA_ACTIVITY_FEED_ENABLED")
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(false);

        let interval = Duration::from_secs(
            std::env::var("ORCHESTRA_ACTIVITY_FEED_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_ACTIVITY_FEED_INTERVAL_SECS),
        );

        Self { enabled, interval }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for activity feed cycles.
#[derive(Debug, Default)]
pub struct ActivityFeedMetrics {
    /// Cycles run since startup
    pub cycles: AtomicU64,

    /// Log entries appended
    pub entries_written: AtomicU64,

    /// Cycles that chose not to emit
    pub quiet_cycles: AtomicU64,

    /// Store failures
    pub errors: AtomicU64,
}

impl ActivityFeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> ActivityFeedSnapshot {
        ActivityFeedSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            entries_written: self.entries_written.load(Ordering::Relaxed),
            quiet_cycles: self.quiet_cycles.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of feed metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFeedSnapshot {
    pub cycles: u64,
    pub entries_written: u64,
    pub quiet_cycles: u64,
    pub errors: u64,
}

// ============================================================================
// GENERATION
// ============================================================================

/// Pick the next feed line, or `None` for a quiet cycle.
///
/// `running_agents` are the names of agents currently RUNNING. Names longer
/// than a log source may be are never used as one. With none running, a
/// line is emitted with probability 0.2.
pub fn generate_entry<R: Rng + ?Sized>(
    rng: &mut R,
    running_agents: &[String],
) -> Option<CreateLogInput> {
    if running_agents.is_empty() && !rng.random_bool(IDLE_EMIT_PROBABILITY) {
        return None;
    }

    let sources: Vec<&str> = running_agents
        .iter()
        .map(String::as_str)
        .filter(|name| name.chars().count() <= LOG_SOURCE_MAX_LEN)
        .chain(SYSTEM_SOURCES)
        .collect();

    let level = LEVELS.choose(rng).copied().unwrap_or(LogLevel::Inf);
    let source = sources.choose(rng).copied().unwrap_or("SYSTEM");
    let message = MESSAGES.choose(rng).copied().unwrap_or(MESSAGES[0]);

    Some(CreateLogInput {
        level,
        source: source.to_string(),
        message: message.to_string(),
    })
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Background task that appends feed lines until shutdown is signalled.
///
/// Returns the metrics collected during the task's lifetime.
pub async fn activity_feed_task(
    store: Arc<dyn Store>,
    config: ActivityFeedConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<ActivityFeedMetrics> {
    let metrics = Arc::new(ActivityFeedMetrics::new());
    let mut rng = StdRng::from_os_rng();

    let mut ticker = interval(config.interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_ms = config.interval.as_millis() as u64,
        "Activity feed task started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Activity feed task shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                run_cycle(store.as_ref(), &mut rng, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        cycles = snapshot.cycles,
        entries_written = snapshot.entries_written,
        quiet_cycles = snapshot.quiet_cycles,
        errors = snapshot.errors,
        "Activity feed task completed"
    );

    metrics
}

/// Perform one feed cycle.
async fn run_cycle(store: &dyn Store, rng: &mut StdRng, metrics: &ActivityFeedMetrics) {
    metrics.cycles.fetch_add(1, Ordering::Relaxed);

    let running: Vec<String> = match store.agent_list().await {
        Ok(agents) => agents
            .into_iter()
            .filter(|a| a.status == AgentStatus::Running)
            .map(|a| a.name)
            .collect(),
        Err(e) => {
            tracing::error!(error = %e, "Activity feed could not list agents");
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let Some(entry) = generate_entry(rng, &running) else {
        metrics.quiet_cycles.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Activity feed cycle stayed quiet");
        return;
    };

    match store.log_insert(&entry).await {
        Ok(log) => {
            metrics.entries_written.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(log_id = %log.id, source = %log.source, "Activity feed entry written");
        }
        Err(e) => {
            tracing::error!(error = %e, "Activity feed could not append log entry");
            metrics.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestra_core::{validate, CreateAgentInput};
    use orchestra_storage::InMemoryStore;
    use orchestra_test_utils::FailingStore;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config_is_disabled() {
        let config = ActivityFeedConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval, Duration::from_secs(3));
    }

    #[test]
    fn test_generated_entries_draw_from_fixed_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        let running = names(&["OMEGA-7", "ALPHA-CORE"]);

        for _ in 0..200 {
            let entry = generate_entry(&mut rng, &running).unwrap();
            assert!(matches!(entry.level, LogLevel::Inf | LogLevel::Sys | LogLevel::Wrn));
            assert!(
                running.contains(&entry.source) || SYSTEM_SOURCES.contains(&entry.source.as_str())
            );
            assert!(MESSAGES.contains(&entry.message.as_str()));
        }
    }

    #[test]
    fn test_running_agents_always_emit() {
        let mut rng = StdRng::seed_from_u64(11);
        let running = names(&["ZETA-9"]);
        assert!((0..100).all(|_| generate_entry(&mut rng, &running).is_some()));
    }

    #[test]
    fn test_idle_system_is_mostly_quiet() {
        let mut rng = StdRng::seed_from_u64(42);
        let emitted = (0..2000)
            .filter_map(|_| generate_entry(&mut rng, &[]))
            .inspect(|entry| assert!(SYSTEM_SOURCES.contains(&entry.source.as_str())))
            .count();
        // Expected 400; the bound is loose enough for any seed.
        assert!((250..550).contains(&emitted), "emitted {}", emitted);
    }

    #[tokio::test]
    async fn test_task_writes_until_shutdown() {
        let store = InMemoryStore::new();
        let mut agent = CreateAgentInput::named("OMEGA-7");
        agent.status = AgentStatus::Running;
        store.agent_insert(&agent).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = ActivityFeedConfig {
            enabled: true,
            interval: Duration::from_millis(10),
        };
        let handle = tokio::spawn(activity_feed_task(
            Arc::new(store.clone()),
            config,
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown_tx.send(true).unwrap();
        let snapshot = handle.await.unwrap().snapshot();

        assert!(snapshot.entries_written >= 1);
        assert_eq!(snapshot.errors, 0);
        let logs = store.log_list_recent(1000).await.unwrap();
        assert_eq!(logs.len() as u64, snapshot.entries_written);
    }

    #[test]
    fn test_overlong_agent_names_are_not_sources() {
        let mut rng = StdRng::seed_from_u64(3);
        let fits = "N".repeat(LOG_SOURCE_MAX_LEN);
        let running = vec!["A".repeat(80), fits.clone()];

        for _ in 0..200 {
            let entry = generate_entry(&mut rng, &running).unwrap();
            assert!(entry.source.chars().count() <= LOG_SOURCE_MAX_LEN);
            assert!(entry.source == fits || SYSTEM_SOURCES.contains(&entry.source.as_str()));
        }
    }

    #[tokio::test]
    async fn test_feed_lines_pass_the_log_schema() {
        let store = InMemoryStore::new();
        let mut agent = CreateAgentInput::named(&"A".repeat(80));
        agent.status = AgentStatus::Running;
        store.agent_insert(&agent).await.unwrap();

        let metrics = ActivityFeedMetrics::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            run_cycle(&store, &mut rng, &metrics).await;
        }

        let logs = store.log_list_recent(1000).await.unwrap();
        assert_eq!(logs.len(), 50);
        for log in logs {
            let payload = serde_json::to_value(&log).unwrap();
            assert!(
                validate::<CreateLogInput>(&payload).is_ok(),
                "invalid feed line from {:?}",
                log.source
            );
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_counted() {
        let store = FailingStore;
        let metrics = ActivityFeedMetrics::new();
        let mut rng = StdRng::seed_from_u64(1);

        run_cycle(&store, &mut rng, &metrics).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles, 1);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.entries_written, 0);
    }
}
