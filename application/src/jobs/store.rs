//! In-memory job store
//!
//! The only shared mutable structure of the engine. Each job is written
//! only by its own supervisor; readers get cloned snapshots.

use super::error::JobError;
use crate::config::RetentionPolicy;
use chrono::{DateTime, Utc};
use consensus_domain::{Job, JobId, JobStateError};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, Job>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Job>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert(&self, job: Job) {
        self.write().insert(job.job_id.clone(), job);
    }

    /// Snapshot of one job
    pub fn get(&self, job_id: &JobId) -> Option<Job> {
        self.read().get(job_id).cloned()
    }

    /// Apply a state change to one job under the write lock
    pub fn update<F>(&self, job_id: &JobId, f: F) -> Result<(), JobError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobStateError>,
    {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.clone()))?;
        f(job)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop terminal jobs past their TTL, then the oldest terminal jobs
    /// while the store holds more than `max_jobs`. Live jobs are never
    /// removed. Returns the number of jobs dropped.
    pub fn purge(&self, policy: &RetentionPolicy, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(policy.ttl).unwrap_or(chrono::Duration::MAX);
        let mut jobs = self.write();
        let before = jobs.len();

        jobs.retain(|_, job| !job.is_terminal() || now - job.updated_at < ttl);

        if jobs.len() > policy.max_jobs {
            let mut terminal: Vec<(DateTime<Utc>, JobId)> = jobs
                .values()
                .filter(|job| job.is_terminal())
                .map(|job| (job.updated_at, job.job_id.clone()))
                .collect();
            terminal.sort();

            let excess = jobs.len() - policy.max_jobs;
            for (_, job_id) in terminal.into_iter().take(excess) {
                jobs.remove(&job_id);
            }
        }

        before - jobs.len()
    }
}
