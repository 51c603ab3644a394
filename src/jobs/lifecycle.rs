//! Status transitions for a single job.
//!
//! These are pure functions from the current job to the next one. Callers
//! persist the result with a revision-checked write.

use chrono::{DateTime, Utc};

use crate::error::{Result, YardworkError};
use crate::jobs::job::Job;
use crate::jobs::status::Stage;

/// Move a job to its next stage: Pending -> Accepted -> Completed.
///
/// The next stage depends only on how far the job has come. A completed
/// job cannot advance any further.
pub fn advance(job: &Job, at: DateTime<Utc>) -> Result<Job> {
    let job_status = job.job_status.advanced(at)?;
    Ok(Job {
        job_status,
        ..job.clone()
    })
}

/// Attach the provider's after photos. One-shot: fails once photos are set.
/// The job must be assigned and at least Accepted.
pub fn complete(job: &Job, after_photos: Vec<String>) -> Result<Job> {
    if job.after_photos.is_some() {
        return Err(YardworkError::AlreadyCompleted(job.job_id.clone()));
    }
    if !job.is_assigned() {
        return Err(YardworkError::NotAssigned(job.job_id.clone()));
    }
    if job.stage() == Stage::Pending {
        return Err(YardworkError::InvalidTransition(format!(
            "Job {} has not been started and cannot be completed.",
            job.job_id
        )));
    }
    if after_photos.is_empty() {
        return Err(YardworkError::invalid("No photo URLs provided."));
    }
    Ok(Job {
        after_photos: Some(after_photos),
        ..job.clone()
    })
}

/// Customers may only withdraw a job nobody has accepted yet.
pub fn ensure_deletable(job: &Job) -> Result<()> {
    match job.stage() {
        Stage::Pending => Ok(()),
        stage => Err(YardworkError::InvalidTransition(format!(
            "Job {} is {} and can no longer be deleted.",
            job.job_id, stage
        ))),
    }
}
