// ==========================================
// Loan Engine - pipeline error types
// ==========================================

use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    // ===== Configuration errors =====
    #[error("no rejection criteria mapped for ({exception_type}, {exception_category})")]
    UnmappedRejectionCriteria {
        exception_type: String,
        exception_category: String,
    },

    #[error("configuration read failed: {0}")]
    Config(String),

    #[error("missing input: {0}")]
    MissingInput(String),

    // ===== Layered errors =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result alias for the pipeline layer.
pub type PipelineResult<T> = Result<T, PipelineError>;
