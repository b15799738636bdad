//! Background Jobs for Orchestra API
//!
//! - `activity_feed`: appends simulated system chatter to the audit log
//!
//! # Usage
//!
//! ```ignore
//! use orchestra_api::jobs::{activity_feed_task, ActivityFeedConfig};
//! use tokio::sync::watch;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let handle = tokio::spawn(activity_feed_task(store, ActivityFeedConfig::from_env(), shutdown_rx));
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! let metrics = handle.await?;
//! ```

pub mod activity_feed;

pub use activity_feed::{
    activity_feed_task, generate_entry, ActivityFeedConfig, ActivityFeedMetrics,
    ActivityFeedSnapshot,
};
