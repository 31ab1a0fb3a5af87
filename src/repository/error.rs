// ==========================================
// Loan Engine - repository error types
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Stored value that no longer parses (decimal/enum columns)
    #[error("corrupted column value: {0}")]
    Corrupted(String),
}

/// Result alias for the repository layer.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
