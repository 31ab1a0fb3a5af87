// ==========================================
// Loan Engine - core library
// ==========================================
// Daily loan-tape rule-validation pipeline: tape ingestion,
// normalization, enrichment, sequential rule passes, disposition
// and persisted run records. Batch decision support; a human owns
// the final purchase decision.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - business rules
pub mod engine;

// Importer layer - external data
pub mod importer;

// Configuration layer
pub mod config;

// Database infrastructure (connection init / unified PRAGMAs)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Core type re-exports
// ==========================================

// Domain types
pub use domain::types::{Disposition, ExceptionSeverity, RunStatus, TapeType};

// Domain entities
pub use domain::{
    EnrichedLoan, LoanException, LoanFact, NormalizationError, NormalizedLoan, PipelineRun,
    RawLoanRecord, RuleException, RuleOutcome,
};

// Engine
pub use engine::{
    DispositionClassifier, EligibilityAnalyzer, ExceptionCollector, LoanEnricher, LoanNormalizer,
    PipelineExecutor, RunContext,
};

// Configuration
pub use config::{PipelineConfigReader, RejectionCriteriaMap, Settings};

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Application name
pub const APP_NAME: &str = "Loan Purchase Engine";
