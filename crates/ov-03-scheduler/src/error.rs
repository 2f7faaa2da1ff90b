use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Lock operation failed for job '{job}': {reason}")]
    LockError { job: String, reason: String },

    #[error("Job '{job}' failed: {reason}")]
    JobFailed { job: String, reason: String },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
