// ==========================================
// Loan Engine - importer error types
// ==========================================

use thiserror::Error;

/// Import layer error type.
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== Discovery errors =====
    #[error("no file matching pattern '{pattern}' in {directory}")]
    NoMatchingFile { pattern: String, directory: String },

    // ===== Field mapping errors =====
    #[error("missing column '{column}' for {tape} tape")]
    MissingColumn { tape: String, column: String },

    #[error("type conversion failed (row {row}, field {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("date format error (row {row}, field {field}): expected YYYY-MM-DD or MM/DD/YYYY, got {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    // ===== Reference data errors =====
    #[error("reference data error ({file}): {message}")]
    ReferenceDataError { file: String, message: String },

    // ===== Generic =====
    #[error("internal import error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result alias for the import layer.
pub type ImportResult<T> = Result<T, ImportError>;
