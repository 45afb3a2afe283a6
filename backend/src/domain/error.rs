//! Error taxonomy shared by the domain services.

/// Errors surfaced to callers of domain operations.
///
/// Tick-internal failures never appear here; they are logged and dropped by
/// the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Collection point not found: {0}")]
    NotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Simulation already running for collection point: {0}")]
    AlreadyRunning(String),
    #[error("No active simulation found for collection point: {0}")]
    NotRunning(String),
    #[error("Collection point is not active: {0}")]
    Inactive(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
