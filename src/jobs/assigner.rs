use crate::error::{Result, YardworkError};
use crate::jobs::job::Job;

/// Bind a provider to a job. Re-accepting overwrites the previous provider.
pub fn accept(job: &Job, provider_id: &str) -> Result<Job> {
    if provider_id.trim().is_empty() {
        return Err(YardworkError::invalid("Missing provider ID."));
    }
    Ok(Job {
        provider_id: Some(provider_id.to_string()),
        ..job.clone()
    })
}

/// Undo an acceptance: drop the Accepted entry and unbind the provider together.
///
/// Only ever reverts one stage. A job must be assigned and sitting at
/// Accepted; cancelling a pending or completed job is rejected, and so is
/// cancelling once after photos are attached.
pub fn cancel(job: &Job) -> Result<Job> {
    if !job.is_assigned() {
        return Err(YardworkError::NotAssigned(job.job_id.clone()));
    }
    if job.after_photos.is_some() {
        return Err(YardworkError::AlreadyCompleted(job.job_id.clone()));
    }
    let job_status = job.job_status.reverted()?;
    Ok(Job {
        provider_id: None,
        job_status,
        ..job.clone()
    })
}
