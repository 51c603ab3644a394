use std::collections::HashMap;

use crate::error::{Result, YardworkError};
use crate::jobs::job::Job;
use crate::jobs::status::Stage;

const DEFAULT_MAX_JOBS: usize = 10_000;

/// In-memory job table keyed by job id.
///
/// Writes after insert go through [`JobStore::compare_and_swap`], which only
/// succeeds when the caller saw the latest revision of the job. This turns
/// the read-modify-write of every lifecycle operation into a conditional
/// update, so a lost update surfaces as [`YardworkError::Conflict`].
#[derive(Debug)]
pub struct JobStore {
    jobs: HashMap<String, Job>,
    max_jobs: usize,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }

    pub fn with_capacity(max_jobs: usize) -> Self {
        Self {
            jobs: HashMap::new(),
            max_jobs,
        }
    }

    /// Insert a new job. Fails if the id is taken or the store is full.
    pub fn insert(&mut self, mut job: Job) -> Result<()> {
        if self.jobs.contains_key(&job.job_id) {
            return Err(YardworkError::DuplicateJob(job.job_id));
        }
        if self.is_full() {
            return Err(YardworkError::StoreFull);
        }
        job.revision = 1;
        self.jobs.insert(job.job_id.clone(), job);
        Ok(())
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    /// Clone of the stored job, or `JobNotFound`.
    pub fn snapshot(&self, job_id: &str) -> Result<Job> {
        self.get(job_id)
            .cloned()
            .ok_or_else(|| YardworkError::JobNotFound(job_id.to_string()))
    }

    /// Replace a job only if it is still at the revision the caller read.
    pub fn compare_and_swap(&mut self, expected_revision: u64, mut next: Job) -> Result<&Job> {
        let current = self
            .jobs
            .get_mut(&next.job_id)
            .ok_or_else(|| YardworkError::JobNotFound(next.job_id.clone()))?;
        if current.revision != expected_revision {
            tracing::warn!(
                job_id = %next.job_id,
                expected_revision,
                actual_revision = current.revision,
                "Rejected stale job update"
            );
            return Err(YardworkError::Conflict(next.job_id));
        }
        next.revision = expected_revision + 1;
        *current = next;
        Ok(current)
    }

    /// Remove a job outright. Returns the removed job if it existed.
    pub fn remove(&mut self, job_id: &str) -> Option<Job> {
        self.jobs.remove(job_id)
    }

    /// All jobs, oldest placement first
    pub fn all_jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self.jobs.values().collect();
        jobs.sort_by(|a, b| {
            a.job_status
                .placed_at()
                .cmp(&b.job_status.placed_at())
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        jobs
    }

    /// Jobs placed by a customer, oldest placement first
    pub fn jobs_for_customer(&self, customer_id: &str) -> Vec<&Job> {
        self.all_jobs()
            .into_iter()
            .filter(|j| j.customer_id == customer_id)
            .collect()
    }

    /// Jobs currently assigned to a provider
    pub fn jobs_for_provider(&self, provider_id: &str) -> Vec<&Job> {
        self.all_jobs()
            .into_iter()
            .filter(|j| j.provider_id.as_deref() == Some(provider_id))
            .collect()
    }

    /// Pending jobs nobody has accepted yet
    pub fn unassigned_jobs(&self) -> Vec<&Job> {
        self.all_jobs()
            .into_iter()
            .filter(|j| j.provider_id.is_none() && j.stage() == Stage::Pending)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.max_jobs
    }
}
