// ==========================================
// Loan Engine - disposition classifier
// ==========================================
// Folds a loan's rule outcomes into a final disposition. All rules
// pass -> to_purchase; any failure -> rejected, with the FIRST
// failure in rule order resolved to its canonical rejection
// criteria key. `projected` exists as a disposition but is never
// produced by classification; it is reserved for forward-looking
// runs written by other tooling.
// ==========================================

use crate::config::RejectionCriteriaMap;
use crate::domain::run::{RuleException, RuleOutcome};
use crate::domain::types::Disposition;
use crate::engine::error::{PipelineError, PipelineResult};

/// Result of classifying one loan.
#[derive(Debug, Clone)]
pub struct Classification {
    pub disposition: Disposition,
    /// Canonical key of the first failing rule; `None` unless rejected.
    pub rejection_criteria: Option<String>,
    /// Every rule failure, in evaluation order.
    pub exceptions: Vec<RuleException>,
}

pub struct DispositionClassifier {
    criteria: RejectionCriteriaMap,
}

impl DispositionClassifier {
    pub fn new(criteria: RejectionCriteriaMap) -> Self {
        Self { criteria }
    }

    /// Classify from ordered rule outcomes. An exception pair with no
    /// entry in the criteria map is a configuration error and fails
    /// the run.
    pub fn classify(&self, outcomes: &[RuleOutcome]) -> PipelineResult<Classification> {
        let mut exceptions = Vec::new();
        let mut rejection_criteria = None;

        for outcome in outcomes {
            if let Some(exception) = &outcome.exception {
                if rejection_criteria.is_none() {
                    rejection_criteria = Some(self.resolve(exception)?.to_string());
                }
                exceptions.push(exception.clone());
            }
        }

        let disposition = if exceptions.is_empty() {
            Disposition::ToPurchase
        } else {
            Disposition::Rejected
        };

        Ok(Classification {
            disposition,
            rejection_criteria,
            exceptions,
        })
    }

    pub fn resolve(&self, exception: &RuleException) -> PipelineResult<&'static str> {
        self.criteria
            .resolve(&exception.exception_type, &exception.exception_category)
            .ok_or_else(|| PipelineError::UnmappedRejectionCriteria {
                exception_type: exception.exception_type.clone(),
                exception_category: exception.exception_category.clone(),
            })
    }
}
