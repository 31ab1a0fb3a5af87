// ==========================================
// Loan Engine - repository layer
// ==========================================
// SQLite-backed persistence behind a shared connection. Writers run
// whole-run batches in transactions; readers see only rows from runs
// whose status has been finalized.
// ==========================================

pub mod error;
pub mod loan_exception_repo;
pub mod loan_fact_repo;
pub mod run_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use loan_exception_repo::LoanExceptionRepository;
pub use loan_fact_repo::LoanFactRepository;
pub use run_repo::RunRepository;
