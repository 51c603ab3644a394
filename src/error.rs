use thiserror::Error;

#[derive(Error, Debug)]
pub enum YardworkError {
    #[error("Validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),

    #[error("Job with ID {0} not found.")]
    JobNotFound(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Job {0} is not assigned to any provider.")]
    NotAssigned(String),

    #[error("Job {0} has already been completed.")]
    AlreadyCompleted(String),

    #[error("Feedback for Job ID {0} has already been submitted.")]
    AlreadySubmitted(String),

    #[error("Job {0} was modified concurrently, re-read and try again.")]
    Conflict(String),

    #[error("A job with ID {0} already exists.")]
    DuplicateJob(String),

    #[error("Job store is at capacity")]
    StoreFull,

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Photo uploads are not configured")]
    UploadsDisabled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl YardworkError {
    /// Shorthand for a validation failure carrying a single message.
    pub fn invalid(message: impl Into<String>) -> Self {
        YardworkError::Validation(vec![message.into()])
    }
}

pub type Result<T> = std::result::Result<T, YardworkError>;
