//! Retention sweep for finished jobs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::registry::JobRegistry;
use crate::config::RetentionConfig;
use crate::observability::Metrics;

/// Remove finished jobs idle for longer than `ttl`
pub fn sweep_once(registry: &JobRegistry, ttl: Duration, metrics: &Metrics) -> usize {
    let evicted = registry.evict_expired(ttl);
    metrics.jobs_evicted(evicted);
    debug!(evicted, remaining = registry.len(), "Retention sweep finished");
    evicted
}

/// Start the periodic sweep; `None` when retention is disabled
pub fn spawn_sweeper(
    registry: Arc<JobRegistry>,
    config: &RetentionConfig,
    metrics: Arc<Metrics>,
) -> Option<JoinHandle<()>> {
    if !config.enabled {
        info!("Job retention disabled; finished jobs are kept until restart");
        return None;
    }

    let ttl = config.job_ttl();
    let period = config.sweep_interval();
    info!(ttl_secs = ttl.as_secs(), interval_secs = period.as_secs(), "Starting retention sweeper");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_once(&registry, ttl, &metrics);
        }
    }))
}
