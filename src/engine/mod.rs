// ==========================================
// Loan Engine - pipeline engine layer
// ==========================================
// Normalization, enrichment, rule evaluation, disposition,
// eligibility analysis and run orchestration.
// ==========================================

pub mod disposition;
pub mod eligibility;
pub mod enricher;
pub mod error;
pub mod exceptions;
pub mod executor;
pub mod normalizer;
pub mod rules;
pub mod run_context;

pub use disposition::{Classification, DispositionClassifier};
pub use eligibility::{EligibilityAnalyzer, EligibilityReport};
pub use enricher::LoanEnricher;
pub use error::{PipelineError, PipelineResult};
pub use exceptions::ExceptionCollector;
pub use executor::{PipelineExecutor, EXHIBIT_HEADER_OFFSET};
pub use normalizer::LoanNormalizer;
pub use run_context::{next_tuesday, new_run_id, weekday_of, RunContext};
