// ==========================================
// Loan Engine - underwriting rule
// ==========================================
// A loan passes when ANY grid row for its program admits it: income
// at or above the row's monthly floor, FICO at or above the row's
// minimum, balance within the approval ceiling, DTI within the cap.
// Borrowers with FICO above 700 get a min-income waiver: the income
// floor is dropped and the PTI cap is enforced instead.
// Routed to the platform (or notes) grid by the enricher's flags.
// ==========================================

use crate::domain::loan::EnrichedLoan;
use crate::domain::run::{RuleException, RuleOutcome};
use crate::domain::types::ExceptionSeverity;
use crate::engine::rules::{platform_suffix, Rule};
use crate::importer::reference::UnderwritingRow;
use crate::importer::ReferenceData;
use rust_decimal::Decimal;

pub const RULE_NAME: &str = "underwriting";
const CATEGORY_FLAGGED: &str = "flagged";

/// FICO above this qualifies for the min-income waiver.
const FICO_WAIVER: i32 = 700;

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

pub struct UnderwritingRule;

impl UnderwritingRule {
    pub fn new() -> Self {
        Self
    }

    fn flagged(loan: &EnrichedLoan, message: String) -> RuleOutcome {
        RuleOutcome::fail(
            RULE_NAME,
            RuleException {
                exception_type: format!(
                    "underwriting_{}",
                    platform_suffix(loan.platform, loan.is_note)
                ),
                exception_category: CATEGORY_FLAGGED.to_string(),
                severity: ExceptionSeverity::Error,
                message,
            },
        )
    }

    fn monthly_income(loan: &EnrichedLoan) -> Option<Decimal> {
        loan.loan.annual_income.map(|a| a / MONTHS_PER_YEAR)
    }

    /// Shared row checks: FICO floor, approval ceiling, DTI cap.
    /// Missing DTI is not checked against the cap.
    fn base_admits(loan: &EnrichedLoan, row: &UnderwritingRow) -> bool {
        let fico_ok = loan.loan.fico.map(|f| f >= row.fico_min).unwrap_or(false);
        let balance_ok = loan.loan.upb <= row.approval_high;
        let dti_ok = loan.loan.dti.map(|d| d <= row.dti_max).unwrap_or(true);
        fico_ok && balance_ok && dti_ok
    }

    fn admits_standard(loan: &EnrichedLoan, row: &UnderwritingRow) -> bool {
        let income_ok = row.monthly_income_min <= Decimal::ZERO
            || Self::monthly_income(loan)
                .map(|m| m >= row.monthly_income_min)
                .unwrap_or(false);
        income_ok && Self::base_admits(loan, row)
    }

    /// Min-income waiver path: income floor dropped, PTI cap enforced.
    fn admits_waiver(loan: &EnrichedLoan, row: &UnderwritingRow) -> bool {
        let pti_ok = loan.loan.pti.map(|p| p <= row.pti_max).unwrap_or(true);
        pti_ok && Self::base_admits(loan, row)
    }
}

impl Default for UnderwritingRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for UnderwritingRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn evaluate(&self, loan: &EnrichedLoan, reference: &ReferenceData) -> RuleOutcome {
        let grid = reference.underwriting_for(loan.platform, loan.is_note);
        let rows = grid.rows_for(&loan.grid_program);

        if rows.is_empty() {
            return Self::flagged(
                loan,
                format!("no underwriting tier for program '{}'", loan.grid_program),
            );
        }

        if rows.iter().any(|r| Self::admits_standard(loan, r)) {
            return RuleOutcome::pass(RULE_NAME);
        }

        let strong_fico = loan.loan.fico.map(|f| f > FICO_WAIVER).unwrap_or(false);
        if strong_fico && rows.iter().any(|r| Self::admits_waiver(loan, r)) {
            return RuleOutcome::pass(RULE_NAME);
        }

        Self::flagged(
            loan,
            format!(
                "no underwriting tier admits program '{}' (balance {}, fico {})",
                loan.grid_program,
                loan.loan.upb,
                loan.loan
                    .fico
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loan::NormalizedLoan;
    use crate::domain::types::TapeType;
    use crate::importer::reference::{ComapGrid, ExistingAssets, PricingGrid, UnderwritingGrid};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn reference() -> ReferenceData {
        let prime_rows = vec![
            UnderwritingRow {
                loan_program: "home-12".to_string(),
                monthly_income_min: dec!(0),
                fico_min: 640,
                approval_high: dec!(20000),
                dti_max: dec!(45),
                pti_max: dec!(15),
            },
            UnderwritingRow {
                loan_program: "home-12".to_string(),
                monthly_income_min: dec!(4000),
                fico_min: 680,
                approval_high: dec!(50000),
                dti_max: dec!(40),
                pti_max: dec!(12),
            },
        ];
        let notes_rows = vec![UnderwritingRow {
            loan_program: "home-12_notes".to_string(),
            monthly_income_min: dec!(0),
            fico_min: 660,
            approval_high: dec!(30000),
            dti_max: dec!(45),
            pti_max: dec!(15),
        }];
        ReferenceData {
            loan_types: HashMap::new(),
            pricing: PricingGrid::default(),
            underwriting_sfy: UnderwritingGrid::default(),
            underwriting_prime: UnderwritingGrid::new(prime_rows),
            underwriting_notes: UnderwritingGrid::new(notes_rows),
            comap_sfy: ComapGrid::default(),
            comap_prime: ComapGrid::default(),
            comap_notes: ComapGrid::default(),
            existing_assets: ExistingAssets::default(),
        }
    }

    fn loan(upb: Decimal, fico: Option<i32>, annual_income: Option<Decimal>) -> EnrichedLoan {
        let normalized = NormalizedLoan {
            loan_id: "1001".to_string(),
            seller_loan_number: None,
            loan_group: None,
            loan_program: "home-12".to_string(),
            application_type: None,
            upb,
            interest_rate: dec!(7.99),
            purchase_price_quoted: dec!(24500),
            lender_price_pct: None,
            fico,
            annual_income,
            dti: Some(dec!(30)),
            pti: Some(dec!(10)),
            term_months: Some(144),
            origination_date: None,
            submit_date: None,
            purchase_date: NaiveDate::from_ymd_opt(2024, 6, 11).unwrap(),
            status_codes: None,
            property_state: None,
            tape: TapeType::Prime,
            row_number: 1,
        };
        EnrichedLoan {
            loan: normalized,
            seller_loan_number: "SFC_1001".to_string(),
            platform: TapeType::Prime,
            loan_type: Some("standard".to_string()),
            is_repurchase: false,
            is_note: false,
            grid_program: "home-12".to_string(),
        }
    }

    #[test]
    fn test_small_balance_admitted_without_income() {
        let rule = UnderwritingRule::new();
        // 15k fits the 20k tier, which has no income floor
        let outcome = rule.evaluate(&loan(dec!(15000), Some(650), None), &reference());
        assert!(outcome.passed);
    }

    #[test]
    fn test_large_balance_needs_income_and_fico() {
        let rule = UnderwritingRule::new();
        // 30k only fits the 50k tier: needs 4000/mo and FICO 680
        let outcome = rule.evaluate(&loan(dec!(30000), Some(690), Some(dec!(60000))), &reference());
        assert!(outcome.passed);

        // FICO below the tier minimum
        let outcome = rule.evaluate(&loan(dec!(30000), Some(650), Some(dec!(60000))), &reference());
        assert!(!outcome.passed);
        let exc = outcome.exception.unwrap();
        assert_eq!(exc.exception_type, "underwriting_prime");
        assert_eq!(exc.exception_category, "flagged");
    }

    #[test]
    fn test_income_floor_enforced() {
        let rule = UnderwritingRule::new();
        // 36000/yr = 3000/mo, below the 4000 floor; FICO 690 gets no waiver
        let outcome = rule.evaluate(&loan(dec!(30000), Some(690), Some(dec!(36000))), &reference());
        assert!(!outcome.passed);
    }

    #[test]
    fn test_min_income_waiver_above_700() {
        let rule = UnderwritingRule::new();
        // Income below floor but FICO 720: waiver path, PTI 10 <= 12
        let outcome = rule.evaluate(&loan(dec!(30000), Some(720), Some(dec!(36000))), &reference());
        assert!(outcome.passed);
    }

    #[test]
    fn test_waiver_still_enforces_pti() {
        let rule = UnderwritingRule::new();
        let mut l = loan(dec!(30000), Some(720), Some(dec!(36000)));
        l.loan.pti = Some(dec!(20));
        let outcome = rule.evaluate(&l, &reference());
        assert!(!outcome.passed);
    }

    #[test]
    fn test_balance_above_every_ceiling_fails() {
        let rule = UnderwritingRule::new();
        let outcome = rule.evaluate(
            &loan(dec!(60000), Some(720), Some(dec!(120000))),
            &reference(),
        );
        assert!(!outcome.passed);
    }

    #[test]
    fn test_missing_fico_fails() {
        let rule = UnderwritingRule::new();
        let outcome = rule.evaluate(&loan(dec!(15000), None, None), &reference());
        assert!(!outcome.passed);
    }

    #[test]
    fn test_note_loan_evaluated_against_notes_grid() {
        let rule = UnderwritingRule::new();
        // The prime grid has no home-12_notes tier; a pass proves
        // the notes grid was the one consulted
        let mut l = loan(dec!(25000), Some(670), None);
        l.is_note = true;
        l.grid_program = "home-12_notes".to_string();
        let outcome = rule.evaluate(&l, &reference());
        assert!(outcome.passed);
    }

    #[test]
    fn test_note_loan_failure_carries_notes_type() {
        let rule = UnderwritingRule::new();
        // FICO below the notes tier minimum of 660
        let mut l = loan(dec!(25000), Some(650), None);
        l.is_note = true;
        l.grid_program = "home-12_notes".to_string();
        let outcome = rule.evaluate(&l, &reference());
        assert!(!outcome.passed);
        let exc = outcome.exception.unwrap();
        assert_eq!(exc.exception_type, "underwriting_notes");
        assert_eq!(exc.exception_category, "flagged");
    }

    #[test]
    fn test_unknown_program_flagged() {
        let rule = UnderwritingRule::new();
        let mut l = loan(dec!(15000), Some(700), None);
        l.grid_program = "mystery".to_string();
        let outcome = rule.evaluate(&l, &reference());
        assert!(!outcome.passed);
        assert!(outcome
            .exception
            .unwrap()
            .message
            .contains("no underwriting tier"));
    }
}
