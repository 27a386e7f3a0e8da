//! Worker error types.

use thiserror::Error;

use zclip_models::JobContractError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// A job reached encoding with parameters validation should have rejected.
    #[error("Contract violation for job {record_id}: {source}")]
    ContractViolation {
        record_id: String,
        #[source]
        source: JobContractError,
    },

    #[error("Worker pool saturated ({pending} jobs pending, limit {limit})")]
    PoolSaturated { pending: usize, limit: usize },

    #[error("Worker pool is shutting down")]
    ShuttingDown,

    #[error("Job task failed: {0}")]
    JobPanicked(String),

    #[error("Webhook error: {0}")]
    Webhook(#[from] zclip_webhook::WebhookError),
}

impl WorkerError {
    pub fn contract_violation(record_id: impl Into<String>, source: JobContractError) -> Self {
        Self::ContractViolation {
            record_id: record_id.into(),
            source,
        }
    }

    /// Check if the pool refused the job (caller may try again later).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WorkerError::PoolSaturated { .. } | WorkerError::ShuttingDown
        )
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, WorkerError::ContractViolation { .. })
    }
}
