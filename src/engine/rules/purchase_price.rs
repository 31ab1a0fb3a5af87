// ==========================================
// Loan Engine - purchase price rule
// ==========================================
// Quoted purchase price must sit within tolerance of the reference
// price (UPB * grid percentage for the program's rate band). A loan
// whose program/rate has no pricing band fails the same rule.
// ==========================================

use crate::domain::loan::EnrichedLoan;
use crate::domain::run::{RuleException, RuleOutcome};
use crate::domain::types::ExceptionSeverity;
use crate::engine::rules::Rule;
use crate::importer::ReferenceData;
use rust_decimal::Decimal;

pub const RULE_NAME: &str = "purchase_price";
const EXCEPTION_TYPE: &str = "purchase_price";
const CATEGORY_MISMATCH: &str = "mismatch";

pub struct PurchasePriceRule {
    /// Absolute dollar tolerance around the reference price.
    tolerance: Decimal,
}

impl PurchasePriceRule {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    fn mismatch(message: String) -> RuleOutcome {
        RuleOutcome::fail(
            RULE_NAME,
            RuleException {
                exception_type: EXCEPTION_TYPE.to_string(),
                exception_category: CATEGORY_MISMATCH.to_string(),
                severity: ExceptionSeverity::Error,
                message,
            },
        )
    }
}

impl Rule for PurchasePriceRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn evaluate(&self, loan: &EnrichedLoan, reference: &ReferenceData) -> RuleOutcome {
        let program = &loan.loan.loan_program;
        let rate = loan.loan.interest_rate;

        let price_pct = match reference.pricing.price_pct_for(program, rate) {
            Some(pct) => pct,
            None => {
                return Self::mismatch(format!(
                    "no pricing band for program '{}' at rate {}",
                    program, rate
                ));
            }
        };

        let reference_price = loan.loan.upb * price_pct;
        let quoted = loan.loan.purchase_price_quoted;
        let diff = (quoted - reference_price).abs();

        if diff > self.tolerance {
            return Self::mismatch(format!(
                "quoted {} vs reference {} (diff {}, tolerance {})",
                quoted, reference_price, diff, self.tolerance
            ));
        }

        RuleOutcome::pass(RULE_NAME)
    }
}
