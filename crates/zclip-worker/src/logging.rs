//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for render jobs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use zclip_models::JobState;

/// Job logger for structured logging with consistent formatting.
///
/// Every line carries the caller's record ID and the operation name so a
/// single job can be followed from acceptance to its webhook.
#[derive(Debug, Clone)]
pub struct JobLogger {
    record_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a record and operation.
    pub fn new(record_id: &str, operation: &str) -> Self {
        Self {
            record_id: record_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(
            record_id = %self.record_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            record_id = %self.record_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            record_id = %self.record_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            record_id = %self.record_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            record_id = %self.record_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            record_id = %self.record_id,
            operation = %self.operation
        )
    }
}

/// Tracks a job's lifecycle state and logs every transition.
#[derive(Debug, Clone)]
pub struct JobTracker {
    logger: JobLogger,
    state: JobState,
}

impl JobTracker {
    /// Start tracking a freshly accepted job.
    pub fn new(record_id: &str, operation: &str) -> Self {
        Self::resume(record_id, operation, JobState::Accepted)
    }

    /// Pick up a job that earlier stages already moved to `state`.
    pub fn resume(record_id: &str, operation: &str, state: JobState) -> Self {
        Self {
            logger: JobLogger::new(record_id, operation),
            state,
        }
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: JobState) -> bool {
        if !self.state.can_transition_to(next) {
            error!(
                record_id = %self.logger.record_id,
                from = %self.state,
                to = %next,
                "Illegal job state transition"
            );
            return false;
        }

        info!(
            record_id = %self.logger.record_id,
            operation = %self.logger.operation,
            from = %self.state,
            to = %next,
            "Job state changed"
        );
        self.state = next;
        true
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn logger(&self) -> &JobLogger {
        &self.logger
    }
}
