// ==========================================
// Loan Engine - exception collector
// ==========================================
// Accumulates persisted LoanException records for one run. Every
// rule failure becomes exactly one record with its canonical
// rejection key resolved up front, so persistence never deals with
// unmapped pairs.
// ==========================================

use crate::config::RejectionCriteriaMap;
use crate::domain::loan::EnrichedLoan;
use crate::domain::run::{LoanException, RuleException};
use crate::engine::error::{PipelineError, PipelineResult};
use chrono::Utc;

pub struct ExceptionCollector {
    run_id: String,
    criteria: RejectionCriteriaMap,
    exceptions: Vec<LoanException>,
}

impl ExceptionCollector {
    pub fn new(run_id: String, criteria: RejectionCriteriaMap) -> Self {
        Self {
            run_id,
            criteria,
            exceptions: Vec::new(),
        }
    }

    /// Record one loan's rule failures.
    pub fn collect(
        &mut self,
        loan: &EnrichedLoan,
        failures: &[RuleException],
    ) -> PipelineResult<()> {
        for failure in failures {
            let rejection_criteria = self
                .criteria
                .resolve(&failure.exception_type, &failure.exception_category)
                .ok_or_else(|| PipelineError::UnmappedRejectionCriteria {
                    exception_type: failure.exception_type.clone(),
                    exception_category: failure.exception_category.clone(),
                })?;

            self.exceptions.push(LoanException {
                run_id: self.run_id.clone(),
                loan_id: loan.loan_id().to_string(),
                seller_loan_number: loan.seller_loan_number.clone(),
                exception_type: failure.exception_type.clone(),
                exception_category: failure.exception_category.clone(),
                severity: failure.severity,
                rejection_criteria: rejection_criteria.to_string(),
                message: failure.message.clone(),
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.exceptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exceptions.is_empty()
    }

    pub fn into_exceptions(self) -> Vec<LoanException> {
        self.exceptions
    }
}
