use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GalaError {
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("concurrent modification of '{field}': proposal was built against {expected}, live value is {actual}")]
    ConcurrentModification {
        field: String,
        expected: serde_json::Value,
        actual: serde_json::Value,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GalaError {
    /// Whether retrying the analyze -> propose -> apply sequence against a
    /// fresh snapshot can resolve this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

pub type GalaResult<T> = Result<T, GalaError>;
