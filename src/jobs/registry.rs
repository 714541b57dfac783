use chrono::Utc;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::error::RegistryError;
use super::model::{Job, JobEvent, JobId, JobUpdate};

/// Concurrent store of the latest snapshot for every job.
///
/// Each write runs under the entry's shard lock, so readers see a job either
/// before or after an update, never halfway. Every accepted write is also
/// published on a broadcast channel for observers that prefer push over polling.
pub struct JobRegistry {
    jobs: DashMap<JobId, Job>,
    events: broadcast::Sender<JobEvent>,
}

impl JobRegistry {
    pub fn new(event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            jobs: DashMap::new(),
            events,
        }
    }

    /// Insert `job`, discarding any previous entry under the same id
    pub fn create(&self, job: Job) {
        let id = job.id.clone();
        if self.jobs.insert(id.clone(), job.clone()).is_some() {
            debug!(job_id = %id, "Replaced existing job entry");
        }
        self.publish(job);
    }

    pub fn update(&self, id: &JobId, update: JobUpdate) -> Result<Job, RegistryError> {
        self.update_with(id, |_| update)
    }

    /// Compute and apply an update from the current snapshot, atomically
    pub fn update_with<F>(&self, id: &JobId, f: F) -> Result<Job, RegistryError>
    where
        F: FnOnce(&Job) -> JobUpdate,
    {
        let snapshot = {
            let mut entry = self
                .jobs
                .get_mut(id)
                .ok_or_else(|| RegistryError::UnknownJob(id.clone()))?;

            let update = f(&entry);
            if !entry.status.can_transition_to(update.status) {
                return Err(RegistryError::InvalidTransition {
                    id: id.clone(),
                    from: entry.status,
                    to: update.status,
                });
            }

            entry.apply(update);
            entry.clone()
        };

        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Drop finished jobs untouched for longer than `ttl`; live jobs always stay
    pub fn evict_expired(&self, ttl: Duration) -> usize {
        // A TTL reaching past the representable range keeps everything
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };

        let mut evicted = 0;
        self.jobs.retain(|_, job| {
            let expired = job.status.is_terminal() && job.updated_at < cutoff;
            if expired {
                evicted += 1;
            }
            !expired
        });

        if evicted > 0 {
            info!(evicted, remaining = self.jobs.len(), "Evicted expired jobs");
        }
        evicted
    }

    fn publish(&self, job: Job) {
        // No subscribers is the common case for the HTTP server
        let _ = self.events.send(JobEvent { job });
    }
}
