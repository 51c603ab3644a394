//! Customer feedback on a finished job and the provider ratings it feeds.

use crate::error::{Result, YardworkError};
use crate::jobs::sanitize::sanitize;
use crate::jobs::validate::{CUSTOM_INSTRUCTIONS_PREFIX, EDGING_PREFIX};
use crate::jobs::{Job, JobType, Stage};

pub const INVALID_RATING: &str = "Rating must be between 1 and 5.";

/// Sanitized feedback ready to be stored on a job and a provider profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub rating: u8,
    pub text: String,
}

impl Feedback {
    pub fn new(rating: u8, text: Option<&str>) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(YardworkError::invalid(INVALID_RATING));
        }
        Ok(Self {
            rating,
            text: text.map(sanitize).unwrap_or_default(),
        })
    }

    /// Value stored on the job: `"<rating>"` or `"<rating>|<text>"`.
    pub fn job_value(&self) -> String {
        if self.text.is_empty() {
            self.rating.to_string()
        } else {
            format!("{}|{}", self.rating, self.text)
        }
    }

    /// Review appended to the provider's profile:
    /// `"<rating>|<text>|<details>|<M/D>"`, the text segment dropped when empty.
    pub fn review_entry(&self, job: &Job) -> String {
        let details = details_summary(job);
        let completed_on = completion_date(job);
        if self.text.is_empty() {
            format!("{}|{}|{}", self.rating, details, completed_on)
        } else {
            format!("{}|{}|{}|{}", self.rating, self.text, details, completed_on)
        }
    }
}

/// Record feedback on a job. Write-once, and only for a completed job
/// that has a provider to credit.
pub fn apply_feedback(job: &Job, feedback: &Feedback) -> Result<Job> {
    if job.feedback.as_deref().is_some_and(|f| !f.is_empty()) {
        return Err(YardworkError::AlreadySubmitted(job.job_id.clone()));
    }
    if !job.is_assigned() {
        return Err(YardworkError::NotAssigned(job.job_id.clone()));
    }
    if job.stage() != Stage::Completed {
        return Err(YardworkError::InvalidTransition(format!(
            "Feedback can only be left on a completed job, job {} is {}.",
            job.job_id,
            job.stage()
        )));
    }
    Ok(Job {
        feedback: Some(feedback.job_value()),
        ..job.clone()
    })
}

/// Short, human readable description of the work, used in reviews.
pub fn details_summary(job: &Job) -> String {
    match job.job_type {
        JobType::LawnCare => {
            let (edging, trimming): (Vec<&String>, Vec<&String>) = job
                .job_details
                .iter()
                .partition(|d| d.starts_with(EDGING_PREFIX));
            let trimming = trimming
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            match (trimming.is_empty(), edging.is_empty()) {
                (false, false) => format!("{} Lawn Trimming, Edging", trimming),
                (true, false) => "Edging".to_string(),
                (false, true) => format!("{} Lawn Trimming", trimming),
                (true, true) => String::new(),
            }
        }
        JobType::SnowRemoval => job
            .job_details
            .iter()
            .filter(|d| !d.starts_with(CUSTOM_INSTRUCTIONS_PREFIX))
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Eastern-time month/day the job was completed, e.g. `1/5`.
fn completion_date(job: &Job) -> String {
    job.job_status
        .entry(Stage::Completed)
        .map(|entry| entry.eastern().format("%-m/%-d").to_string())
        .unwrap_or_default()
}
