// ==========================================
// Loan Engine - domain layer
// ==========================================

pub mod loan;
pub mod run;
pub mod types;

pub use loan::{EnrichedLoan, NormalizedLoan, RawLoanRecord};
pub use run::{LoanException, LoanFact, NormalizationError, PipelineRun, RuleException, RuleOutcome};
pub use types::{Disposition, ExceptionSeverity, RunStatus, TapeType};
