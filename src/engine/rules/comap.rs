// ==========================================
// Loan Engine - CoMAP rule
// ==========================================
// Program/FICO membership against the platform's CoMAP grid. The
// grid lists (program, FICO floor) bands; a loan must hit at least
// one band for its grid program.
// ==========================================

use crate::domain::loan::EnrichedLoan;
use crate::domain::run::{RuleException, RuleOutcome};
use crate::domain::types::ExceptionSeverity;
use crate::engine::rules::{platform_suffix, Rule};
use crate::importer::ReferenceData;

pub const RULE_NAME: &str = "comap";
const CATEGORY_NOT_IN_COMAP: &str = "not_in_comap";

pub struct ComapRule;

impl ComapRule {
    pub fn new() -> Self {
        Self
    }

    fn not_in_comap(loan: &EnrichedLoan, message: String) -> RuleOutcome {
        RuleOutcome::fail(
            RULE_NAME,
            RuleException {
                exception_type: format!(
                    "comap_{}",
                    platform_suffix(loan.platform, loan.is_note)
                ),
                exception_category: CATEGORY_NOT_IN_COMAP.to_string(),
                severity: ExceptionSeverity::Error,
                message,
            },
        )
    }
}

impl Default for ComapRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ComapRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn evaluate(&self, loan: &EnrichedLoan, reference: &ReferenceData) -> RuleOutcome {
        let grid = reference.comap_for(loan.platform, loan.is_note);

        if !grid.contains_program(&loan.grid_program) {
            return Self::not_in_comap(
                loan,
                format!("program '{}' not in CoMAP", loan.grid_program),
            );
        }

        let fico = match loan.loan.fico {
            Some(f) => f,
            None => {
                return Self::not_in_comap(loan, "missing FICO for CoMAP band".to_string());
            }
        };

        if !grid.admits(&loan.grid_program, fico) {
            return Self::not_in_comap(
                loan,
                format!(
                    "FICO {} below every CoMAP band for '{}'",
                    fico, loan.grid_program
                ),
            );
        }

        RuleOutcome::pass(RULE_NAME)
    }
}
