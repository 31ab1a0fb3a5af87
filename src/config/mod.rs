// ==========================================
// Loan Engine - configuration layer
// ==========================================

pub mod rejection_criteria;
pub mod settings;

pub use rejection_criteria::RejectionCriteriaMap;
pub use settings::{PipelineConfigReader, Settings};
