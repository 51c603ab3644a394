//! Job lifecycle operations against the shared job store and the provider
//! directory.
//!
//! Every mutation reads a snapshot, computes the next job with a pure
//! function from `jobs::lifecycle`, `jobs::assigner` or `providers::feedback`,
//! then writes it back with a revision check. Two callers racing on the same
//! job cannot both win; the loser gets `Conflict`.
//!
//! The provider directory is updated after the job write and outside of it.
//! If that second update fails the job keeps its new state and the failure
//! is only logged.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{Result, YardworkError};
use crate::geo::distance_miles;
use crate::jobs::job::generate_job_id;
use crate::jobs::status::now_utc;
use crate::jobs::validate::validate;
use crate::jobs::{assigner, lifecycle, Coords, Job, JobRequest, JobStore, StatusLog};
use crate::providers::feedback::apply_feedback;
use crate::providers::{Feedback, ProviderDirectory, ProviderProfile};

pub const NO_PHOTOS: &str = "No photo URLs provided.";

/// A job open for acceptance, with its distance from the searching provider.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableJob {
    #[serde(flatten)]
    pub job: Job,
    pub distance_miles: f64,
}

#[derive(Clone)]
pub struct Marketplace {
    store: Arc<RwLock<JobStore>>,
    providers: Arc<dyn ProviderDirectory>,
}

impl Marketplace {
    pub fn new(store: JobStore, providers: Arc<dyn ProviderDirectory>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            providers,
        }
    }

    pub fn providers(&self) -> &Arc<dyn ProviderDirectory> {
        &self.providers
    }

    /// Validate and store a new pending job. Returns its id.
    pub async fn create_job(&self, request: JobRequest) -> Result<String> {
        let mut errors = validate(&request);
        if request.before_photos.iter().all(|p| p.trim().is_empty()) {
            errors.push(NO_PHOTOS.to_string());
        }
        if !errors.is_empty() {
            tracing::debug!(errors = ?errors, "Rejected job request");
            return Err(YardworkError::Validation(errors));
        }

        let job_id = request
            .job_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(generate_job_id);
        let job = Job::from_request(request, job_id.clone(), now_utc())?;

        self.store.write().await.insert(job)?;
        tracing::info!(job_id = %job_id, "Job created");
        Ok(job_id)
    }

    /// Move a job one stage forward and return its new status log.
    pub async fn advance_status(&self, job_id: &str) -> Result<StatusLog> {
        let job = self
            .update(job_id, |job| lifecycle::advance(job, now_utc()))
            .await?;
        tracing::info!(job_id = %job_id, stage = %job.stage(), "Job status advanced");
        Ok(job.job_status)
    }

    pub async fn accept_job(&self, job_id: &str, provider_id: &str) -> Result<()> {
        self.update(job_id, |job| assigner::accept(job, provider_id))
            .await?;
        tracing::info!(job_id = %job_id, provider_id = %provider_id, "Job accepted");
        Ok(())
    }

    /// Drop the provider and step back from Accepted to Pending.
    pub async fn cancel_job(&self, job_id: &str) -> Result<StatusLog> {
        let job = self.update(job_id, assigner::cancel).await?;
        tracing::info!(job_id = %job_id, "Job acceptance cancelled");
        Ok(job.job_status)
    }

    /// Attach after photos and credit the provider with a finished job.
    pub async fn complete_job(&self, job_id: &str, after_photos: Vec<String>) -> Result<()> {
        let job = self
            .update(job_id, |job| lifecycle::complete(job, after_photos))
            .await?;
        tracing::info!(job_id = %job_id, "Job completed");

        if let Some(provider_id) = job.provider_id.as_deref() {
            if let Err(e) = self.providers.record_completion(provider_id) {
                tracing::error!(
                    job_id = %job_id,
                    provider_id = %provider_id,
                    error = %e,
                    "Job completed but provider stats were not updated"
                );
            }
        }
        Ok(())
    }

    /// Store the customer's rating on the job and add it to the provider's
    /// profile. Only the first submission for a job is accepted. Returns the
    /// sanitized feedback as stored.
    pub async fn submit_feedback(
        &self,
        job_id: &str,
        rating: u8,
        text: Option<&str>,
    ) -> Result<Feedback> {
        let feedback = Feedback::new(rating, text)?;
        let job = self
            .update(job_id, |job| apply_feedback(job, &feedback))
            .await?;
        tracing::info!(job_id = %job_id, rating, "Feedback submitted");

        if let Some(provider_id) = job.provider_id.as_deref() {
            let review = feedback.review_entry(&job);
            if let Err(e) = self
                .providers
                .record_rating(provider_id, feedback.rating, review)
            {
                tracing::error!(
                    job_id = %job_id,
                    provider_id = %provider_id,
                    error = %e,
                    "Feedback stored but provider rating was not updated"
                );
            }
        }
        Ok(feedback)
    }

    /// All jobs, or only one customer's, oldest placement first.
    pub async fn list_jobs(&self, customer_id: Option<&str>) -> Vec<Job> {
        let store = self.store.read().await;
        let jobs = match customer_id {
            Some(id) => store.jobs_for_customer(id),
            None => store.all_jobs(),
        };
        jobs.into_iter().cloned().collect()
    }

    pub async fn list_jobs_by_provider(&self, provider_id: &str) -> Vec<Job> {
        self.store
            .read()
            .await
            .jobs_for_provider(provider_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Unaccepted pending jobs within `range_miles` of `origin`, nearest first.
    pub async fn list_available_jobs(&self, origin: Coords, range_miles: f64) -> Vec<AvailableJob> {
        let store = self.store.read().await;
        let mut available: Vec<AvailableJob> = store
            .unassigned_jobs()
            .into_iter()
            .map(|job| AvailableJob {
                distance_miles: distance_miles(origin, job.delivery_coords),
                job: job.clone(),
            })
            .filter(|a| a.distance_miles <= range_miles)
            .collect();
        available.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
        available
    }

    /// Remove a job that no provider has taken on yet.
    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let job = store
            .get(job_id)
            .ok_or_else(|| YardworkError::JobNotFound(job_id.to_string()))?;
        lifecycle::ensure_deletable(job)?;
        store.remove(job_id);
        tracing::info!(job_id = %job_id, "Job deleted");
        Ok(())
    }

    pub fn register_provider(&self, profile: ProviderProfile) -> Result<()> {
        self.providers.register(profile)
    }

    pub fn provider(&self, provider_id: &str) -> Result<ProviderProfile> {
        self.providers.profile(provider_id)
    }

    async fn update<F>(&self, job_id: &str, apply: F) -> Result<Job>
    where
        F: FnOnce(&Job) -> Result<Job>,
    {
        let current = self.store.read().await.snapshot(job_id)?;
        let next = apply(&current)?;
        let mut store = self.store.write().await;
        store.compare_and_swap(current.revision, next).cloned()
    }
}
