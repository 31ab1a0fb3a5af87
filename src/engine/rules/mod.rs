// ==========================================
// Loan Engine - rule modules
// ==========================================
// Each rule is total (every loan gets an outcome) and pure against
// the run-scoped reference snapshot. Evaluation order is fixed; the
// first failure in this order becomes the loan's rejection criteria.
// ==========================================

pub mod comap;
pub mod purchase_price;
pub mod underwriting;

use crate::domain::loan::EnrichedLoan;
use crate::domain::run::RuleOutcome;
use crate::domain::types::TapeType;
use crate::importer::ReferenceData;
use rust_decimal::Decimal;

pub use comap::ComapRule;
pub use purchase_price::PurchasePriceRule;
pub use underwriting::UnderwritingRule;

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, loan: &EnrichedLoan, reference: &ReferenceData) -> RuleOutcome;
}

/// The full rule set in evaluation order.
pub fn standard_rules(price_tolerance: Decimal) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(PurchasePriceRule::new(price_tolerance)),
        Box::new(UnderwritingRule::new()),
        Box::new(ComapRule::new()),
    ]
}

/// Exception-type suffix for platform-routed rules (`sfy`, `prime`,
/// `notes`).
pub(crate) fn platform_suffix(platform: TapeType, is_note: bool) -> &'static str {
    if is_note {
        "notes"
    } else {
        match platform {
            TapeType::Sfy => "sfy",
            TapeType::Prime => "prime",
        }
    }
}
