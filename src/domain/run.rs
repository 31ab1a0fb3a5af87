// ==========================================
// Loan Engine - run domain models
// ==========================================
// PipelineRun: one execution over one purchase date
// LoanFact / LoanException: persisted per-loan run records
// RuleOutcome: transient result of one rule on one loan
// ==========================================

use crate::domain::types::{Disposition, ExceptionSeverity, RunStatus, TapeType};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// PipelineRun
// ==========================================
// Created at run start, mutated only by the executor as stages
// complete, immutable once a terminal status is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub status: RunStatus,

    /// Purchase date for the run (YYYY-MM-DD).
    pub pdate: NaiveDate,
    pub irr_target: Decimal,

    // Weekday segregation, derived from pdate once at creation.
    // 0 = Monday .. 6 = Sunday.
    pub run_weekday: u8,
    pub run_weekday_name: String,

    // Results summary
    pub total_loans: i64,
    pub total_balance: Decimal,
    pub to_purchase_count: i64,
    pub projected_count: i64,
    pub rejected_count: i64,
    pub exceptions_count: i64,

    /// Row-level normalization errors recovered during the run.
    pub normalization_errors: Vec<NormalizationError>,
    /// Portfolio eligibility report (JSON), when the stage ran.
    pub eligibility_summary: Option<serde_json::Value>,

    /// Last pipeline phase reached (diagnoses stuck/failed runs).
    pub last_phase: Option<String>,
    pub failure_reason: Option<String>,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PipelineRun {
    /// New pending run for a purchase date. Weekday attributes are
    /// computed here and never recomputed.
    pub fn new(run_id: String, pdate: NaiveDate, irr_target: Decimal) -> Self {
        let (run_weekday, run_weekday_name) = crate::engine::run_context::weekday_of(pdate);
        Self {
            run_id,
            status: RunStatus::Pending,
            pdate,
            irr_target,
            run_weekday,
            run_weekday_name: run_weekday_name.to_string(),
            total_loans: 0,
            total_balance: Decimal::ZERO,
            to_purchase_count: 0,
            projected_count: 0,
            rejected_count: 0,
            exceptions_count: 0,
            normalization_errors: Vec::new(),
            eligibility_summary: None,
            last_phase: None,
            failure_reason: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// NormalizationError
// ==========================================
// Row-level parse failure, recovered locally. Distinct from rule
// exceptions: never mapped to a rejection criteria key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationError {
    pub tape: TapeType,
    pub row_number: usize,
    pub field: Option<String>,
    pub message: String,
}

// ==========================================
// RuleOutcome
// ==========================================
// Produced and consumed within the same run; rules are total, so
// every loan gets one outcome per rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub rule: &'static str,
    pub passed: bool,
    pub exception: Option<RuleException>,
}

impl RuleOutcome {
    pub fn pass(rule: &'static str) -> Self {
        Self {
            rule,
            passed: true,
            exception: None,
        }
    }

    pub fn fail(rule: &'static str, exception: RuleException) -> Self {
        Self {
            rule,
            passed: false,
            exception: Some(exception),
        }
    }
}

/// Typed failure payload of a rule outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleException {
    pub exception_type: String,
    pub exception_category: String,
    pub severity: ExceptionSeverity,
    pub message: String,
}

// ==========================================
// LoanException - persisted rule failure
// ==========================================
// Created once per failing rule per loan; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanException {
    pub run_id: String,
    pub loan_id: String,
    pub seller_loan_number: String,
    pub exception_type: String,
    pub exception_category: String,
    pub severity: ExceptionSeverity,
    /// Canonical key resolved via the rejection criteria mapping.
    pub rejection_criteria: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// LoanFact - persisted per-loan summary
// ==========================================
// rejection_criteria is set iff disposition = rejected; when several
// rules fail it holds the first failure in rule-evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanFact {
    pub run_id: String,
    pub loan_id: String,
    pub seller_loan_number: String,

    pub platform: TapeType,
    pub loan_program: String,
    pub application_type: Option<String>,
    pub orig_balance: Decimal,
    pub purchase_price: Decimal,
    pub lender_price_pct: Option<Decimal>,
    pub fico: Option<i32>,
    pub dti: Option<Decimal>,
    pub pti: Option<Decimal>,
    pub term_months: Option<i32>,
    pub property_state: Option<String>,

    pub disposition: Disposition,
    pub rejection_criteria: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_run_weekday_stamp() {
        // 2024-06-11 is a Tuesday
        let pdate = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        let run = PipelineRun::new("run_test".to_string(), pdate, dec!(8.05));

        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.run_weekday, 1);
        assert_eq!(run.run_weekday_name, "Tuesday");
        assert_eq!(run.total_loans, 0);
    }

    #[test]
    fn test_rule_outcome_constructors() {
        let pass = RuleOutcome::pass("purchase_price");
        assert!(pass.passed);
        assert!(pass.exception.is_none());

        let fail = RuleOutcome::fail(
            "purchase_price",
            RuleException {
                exception_type: "purchase_price".to_string(),
                exception_category: "mismatch".to_string(),
                severity: ExceptionSeverity::Error,
                message: "off grid".to_string(),
            },
        );
        assert!(!fail.passed);
        assert_eq!(
            fail.exception.unwrap().exception_type,
            "purchase_price".to_string()
        );
    }
}
